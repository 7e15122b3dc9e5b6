//! # Status Enums and Transition Strategies
//!
//! Seasons and tasks each carry a status enum with a fixed transition table.
//! The table lives on the enum (`valid_transitions`); a
//! [`StatusTransitionStrategy`] wraps it as a swappable policy that also
//! decides the status a newly created record starts in.
//!
//! Factories only ask the strategy for `initial_status()`. Services call
//! `check_transition()` before applying a status change.

use std::fmt;

use agri_core::AgriError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Policy for a status enum `S`: where records start and which moves are legal.
///
/// Implementations are stateless and pure.
pub trait StatusTransitionStrategy<S>
where
    S: Copy + PartialEq + fmt::Debug + fmt::Display,
{
    /// The status every new record starts in.
    fn initial_status(&self) -> S;

    /// Whether a record in `current` may move to `target`.
    fn is_transition_allowed(&self, current: S, target: S) -> bool;

    /// [`is_transition_allowed`](Self::is_transition_allowed) as a `Result`.
    fn check_transition(&self, current: S, target: S) -> Result<(), TransitionError<S>> {
        if self.is_transition_allowed(current, target) {
            Ok(())
        } else {
            Err(TransitionError {
                from: current,
                to: target,
            })
        }
    }
}

/// A status change the strategy refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid status transition from {from} to {to}")]
pub struct TransitionError<S: fmt::Debug + fmt::Display> {
    pub from: S,
    pub to: S,
}

// ── Season ───────────────────────────────────────────────────────────

/// Lifecycle status of a cultivation season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeasonStatus {
    /// Created, not yet planted.
    #[serde(rename = "PLANNED")]
    Planned,
    /// In the ground.
    #[serde(rename = "ACTIVE")]
    Active,
    /// Harvested.
    #[serde(rename = "COMPLETED")]
    Completed,
    /// Abandoned before completion.
    #[serde(rename = "CANCELLED")]
    Cancelled,
    /// Closed for good. Terminal state.
    #[serde(rename = "ARCHIVED")]
    Archived,
}

impl SeasonStatus {
    pub const ALL: [SeasonStatus; 5] = [
        Self::Planned,
        Self::Active,
        Self::Completed,
        Self::Cancelled,
        Self::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "PLANNED",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Archived => "ARCHIVED",
        }
    }

    /// Parse a status name, case-insensitively.
    pub fn from_name(name: &str) -> Result<Self, AgriError> {
        let upper = name.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == upper)
            .ok_or_else(|| AgriError::UnknownVariant {
                kind: "season status",
                value: name.to_string(),
            })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Archived)
    }

    /// Whether details, tasks and expenses of a season in this status may change.
    pub fn is_editable(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::Archived)
    }

    /// Valid target states from this state.
    pub fn valid_transitions(&self) -> &'static [SeasonStatus] {
        match self {
            Self::Planned => &[Self::Active, Self::Cancelled],
            Self::Active => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[Self::Archived],
            Self::Archived => &[],
        }
    }
}

impl fmt::Display for SeasonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Default season policy: seasons start `PLANNED` and follow
/// [`SeasonStatus::valid_transitions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonStatusPolicy;

impl StatusTransitionStrategy<SeasonStatus> for SeasonStatusPolicy {
    fn initial_status(&self) -> SeasonStatus {
        SeasonStatus::Planned
    }

    fn is_transition_allowed(&self, current: SeasonStatus, target: SeasonStatus) -> bool {
        current.valid_transitions().contains(&target)
    }
}

// ── Task ─────────────────────────────────────────────────────────────

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    /// Terminal state.
    #[serde(rename = "DONE")]
    Done,
    /// Terminal state.
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [Self::Pending, Self::InProgress, Self::Done, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, AgriError> {
        let upper = name.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == upper)
            .ok_or_else(|| AgriError::UnknownVariant {
                kind: "task status",
                value: name.to_string(),
            })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    pub fn valid_transitions(&self) -> &'static [TaskStatus] {
        match self {
            Self::Pending => &[Self::InProgress, Self::Cancelled],
            Self::InProgress => &[Self::Done, Self::Pending, Self::Cancelled],
            Self::Done | Self::Cancelled => &[],
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Default task policy: tasks start `PENDING`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskStatusPolicy;

impl StatusTransitionStrategy<TaskStatus> for TaskStatusPolicy {
    fn initial_status(&self) -> TaskStatus {
        TaskStatus::Pending
    }

    fn is_transition_allowed(&self, current: TaskStatus, target: TaskStatus) -> bool {
        current.valid_transitions().contains(&target)
    }
}
