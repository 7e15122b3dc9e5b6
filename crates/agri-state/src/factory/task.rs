use agri_core::{TaskId, User};

use super::EntityFactory;
use crate::season::Season;
use crate::status::{StatusTransitionStrategy, TaskStatus, TaskStatusPolicy};
use crate::task::{Task, TaskRequest};

/// Builds [`Task`]s owned by the acting user.
#[derive(Debug, Clone)]
pub struct TaskFactory<S = TaskStatusPolicy> {
    strategy: S,
}

impl TaskFactory {
    pub fn new() -> Self {
        Self {
            strategy: TaskStatusPolicy,
        }
    }
}

impl Default for TaskFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> TaskFactory<S>
where
    S: StatusTransitionStrategy<TaskStatus>,
{
    pub fn with_strategy(strategy: S) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// [`create`](EntityFactory::create), then link the task to `season`.
    /// The season's status and ownership are not checked here.
    pub fn create_with_season(&self, request: &TaskRequest, season: &Season, creator: &User) -> Task {
        let mut task = self.create(request, creator);
        task.season_id = Some(season.id);
        task
    }
}

impl<S> EntityFactory<Task, TaskRequest> for TaskFactory<S>
where
    S: StatusTransitionStrategy<TaskStatus>,
{
    fn create(&self, request: &TaskRequest, creator: &User) -> Task {
        Task {
            id: TaskId::new(),
            title: request.title.clone(),
            description: request.description.clone(),
            status: self.strategy.initial_status(),
            planned_date: request.planned_date,
            due_date: request.due_date,
            owner_id: creator.id,
            season_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::SeasonFactory;
    use crate::season::SeasonRequest;
    use agri_core::UserRole;
    use chrono::NaiveDate;

    fn request() -> TaskRequest {
        TaskRequest {
            title: "Transplant seedlings".into(),
            description: Some("rows 1-12".into()),
            planned_date: NaiveDate::from_ymd_opt(2025, 4, 14),
            due_date: NaiveDate::from_ymd_opt(2025, 4, 16),
        }
    }

    #[test]
    fn owner_is_always_the_creator() {
        let creator = User::new("binh", "Le Binh", UserRole::Farmer);
        let task = TaskFactory::new().create(&request(), &creator);
        assert_eq!(task.owner_id, creator.id);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.season_id, None);
        assert_eq!(task.title, "Transplant seedlings");
    }

    #[test]
    fn with_season_differs_only_in_season_and_id() {
        let creator = User::new("binh", "Le Binh", UserRole::Farmer);
        let season = SeasonFactory::new().create(&SeasonRequest::default(), &creator);
        let factory = TaskFactory::new();

        let plain = factory.create(&request(), &creator);
        let mut linked = factory.create_with_season(&request(), &season, &creator);
        assert_eq!(linked.season_id, Some(season.id));

        linked.season_id = None;
        linked.id = plain.id;
        assert_eq!(linked, plain);
    }
}
