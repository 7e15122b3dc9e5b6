//! # Services
//!
//! Orchestration between route handlers and the stores. A service call
//! loads the records it refers to, checks ownership and business rules,
//! builds new entities through the factories, stores them in memory and
//! writes them through to Postgres when a pool is configured.
//!
//! Records the acting user may not see are reported as not found, so ids of
//! other users' data cannot be probed.
//!
//! A failed database write undoes the in-memory change and surfaces as a
//! 500; the stores never hold state the database rejected. The undo only
//! applies while the record still holds the failed write, so a later
//! writer's change is never reverted. An update or delete that matches no
//! row counts as a failed write.

pub mod catalog;
pub mod expense;
pub mod season;
pub mod task;

use std::fmt::Display;

use crate::error::AppError;

/// Log a failed write-through and convert it into an internal error.
pub(crate) fn persist_error(entity: &'static str, id: impl Display, err: sqlx::Error) -> AppError {
    tracing::error!(entity, id = %id, error = %err, "failed to persist to database");
    AppError::Internal(format!(
        "{entity} could not be persisted; in-memory change rolled back"
    ))
}

/// Treat an update or delete that matched no row as a failed write.
pub(crate) fn row_written(result: Result<bool, sqlx::Error>) -> Result<(), sqlx::Error> {
    match result {
        Ok(true) => Ok(()),
        Ok(false) => Err(sqlx::Error::RowNotFound),
        Err(e) => Err(e),
    }
}

/// Case- and whitespace-insensitive key for uniqueness checks on names.
pub(crate) fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}
