//! # agri-core: Foundational Types for the Agri Stack
//!
//! Leaf crate of the workspace. Defines the primitives every other crate
//! builds on:
//!
//! - **Typed identifiers** (`UserId`, `PlotId`, `SeasonId`, ...). No bare
//!   UUIDs cross crate boundaries, so a plot id cannot be passed where a crop
//!   id is expected.
//! - **Catalog entities** (`User`, `Plot`, `Crop`, `Variety`). Seasons refer
//!   to them by id only.
//! - **Calendar helpers** (`quarter_of`, `DateRange`) used for season naming
//!   and overlap detection.
//! - **`DecimalBound`**, the precision and scale limits of stored amounts.
//! - **`FieldErrors`**, the per-field validation result shared by request
//!   DTOs and services.
//! - **`MessageCode`**, the catalog of user-facing texts.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `agri-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod calendar;
pub mod catalog;
pub mod error;
pub mod identity;
pub mod message;

pub use amount::DecimalBound;
pub use calendar::{quarter_of, DateRange};
pub use catalog::{Crop, Plot, User, UserRole, UserStatus, Variety};
pub use error::{AgriError, FieldErrors};
pub use identity::{CropId, ExpenseId, PlotId, SeasonId, TaskId, UserId, VarietyId};
pub use message::MessageCode;
