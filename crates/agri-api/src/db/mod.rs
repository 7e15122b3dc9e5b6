//! # Database Persistence Layer
//!
//! Postgres persistence for every Agri Stack entity via SQLx.
//!
//! The database layer is **optional**. When `DATABASE_URL` is set, services
//! write each mutation through to PostgreSQL and the in-memory stores are
//! hydrated from it on startup. When absent, the API runs in-memory only
//! (suitable for development and testing).
//!
//! Queries are built at runtime (`sqlx::query`, `sqlx::query_as`) so the
//! crate compiles without a live database. Row structs convert to domain
//! types with `into_record`.

pub mod crops;
pub mod expenses;
pub mod plots;
pub mod seasons;
pub mod tasks;
pub mod users;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if no database URL is configured (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let url = match database_url {
        Some(url) => url,
        None => {
            tracing::warn!(
                "DATABASE_URL not set, running in-memory only. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
