//! # agri-state: Lifecycle Logic for Seasons, Tasks and Expenses
//!
//! Everything that decides what a freshly created or mutated record looks
//! like lives here. Nothing in this crate performs I/O.
//!
//! - **Status** ([`status`]): `SeasonStatus` and `TaskStatus` with their
//!   transition tables, and the [`StatusTransitionStrategy`] policy trait
//!   that supplies the initial status and answers "may `a` become `b`?".
//!
//! - **Entities** ([`season`], [`task`], [`expense`]): the records and the
//!   request payloads they are built from.
//!
//! - **Factories** ([`factory`]): [`SeasonFactory`] and [`TaskFactory`]
//!   apply creation defaults (season naming, initial status, plant counts,
//!   owner assignment) and return an unpersisted entity.
//!
//! - **Rules** ([`rules`]): per-plot checks that need sibling seasons,
//!   namely the duplicate-name and date-overlap rules.
//!
//! ## Status flow
//!
//! ```text
//! Season:  PLANNED ──▶ ACTIVE ──▶ COMPLETED ──▶ ARCHIVED
//!             │           │                       ▲
//!             └───────────┴──▶ CANCELLED ─────────┘
//!
//! Task:    PENDING ◀──▶ IN_PROGRESS ──▶ DONE
//!             │              │
//!             └──────────────┴──▶ CANCELLED
//! ```

pub mod expense;
pub mod factory;
pub mod rules;
pub mod season;
pub mod status;
pub mod task;

pub use expense::{Expense, ExpenseRequest, ExpenseSummary};
pub use factory::{EntityFactory, SeasonFactory, TaskFactory};
pub use rules::{check_season_dates, check_season_rules, RuleViolation};
pub use season::{Season, SeasonRequest, SeasonUpdate};
pub use status::{
    SeasonStatus, SeasonStatusPolicy, StatusTransitionStrategy, TaskStatus, TaskStatusPolicy,
    TransitionError,
};
pub use task::{Task, TaskRequest};
