//! # Task
//!
//! A scheduled unit of work owned by one user, optionally tied to a season.

use agri_core::{SeasonId, TaskId, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::status::TaskStatus;

/// Payload a task is created from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub planned_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

/// A task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub planned_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub owner_id: UserId,
    pub season_id: Option<SeasonId>,
}

impl Task {
    /// Replace the editable details with those of `request`.
    ///
    /// Owner, season and status are untouched.
    pub fn apply(&mut self, request: &TaskRequest) {
        self.title = request.title.clone();
        self.description = request.description.clone();
        self.planned_date = request.planned_date;
        self.due_date = request.due_date;
    }

    /// Whether the task is past due on `today` and still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_terminal() && self.due_date.is_some_and(|due| due < today)
    }
}
