//! # Entity Factories
//!
//! A factory turns a request payload and the acting user into a new,
//! unpersisted entity with creation defaults applied. Factories do no I/O,
//! do not mutate their inputs, and raise no errors: inputs are validated by
//! the caller beforehand.

mod season;
mod task;

pub use season::{default_season_name, SeasonFactory};
pub use task::TaskFactory;

use agri_core::User;

/// Generic creation contract: `R` is the request payload, `E` the entity.
pub trait EntityFactory<E, R> {
    /// Build a new entity from `request` on behalf of `creator`.
    fn create(&self, request: &R, creator: &User) -> E;
}
