//! Tasks: creation through [`TaskFactory`], edits, deletion and status
//! changes through [`TaskStatusPolicy`].

use std::cmp::Ordering;

use agri_core::{FieldErrors, MessageCode, SeasonId, TaskId, User};
use agri_state::{EntityFactory, StatusTransitionStrategy, Task, TaskFactory, TaskRequest, TaskStatus, TaskStatusPolicy};

use super::{persist_error, row_written, season};
use crate::error::AppError;
use crate::mail;
use crate::response::{Page, PageRequest};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct NewTask {
    pub request: TaskRequest,
    pub season_id: Option<SeasonId>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub season_id: Option<SeasonId>,
    pub status: Option<TaskStatus>,
}

fn check_task_dates(request: &TaskRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if let (Some(planned), Some(due)) = (request.planned_date, request.due_date) {
        if due < planned {
            errors.invalid("due_date", "must not be before planned_date");
        }
    }
    errors.into_result()
}

/// Create a task owned by `actor`, optionally linked to one of the actor's
/// open seasons. The owner is notified by mail when they have an address.
pub async fn create(state: &AppState, actor: &User, new: NewTask) -> Result<Task, AppError> {
    check_task_dates(&new.request)?;

    let factory = TaskFactory::new();
    let task = match new.season_id {
        Some(id) => {
            let season = season::get_editable(state, actor, id)?;
            factory.create_with_season(&new.request, &season, actor)
        }
        None => factory.create(&new.request, actor),
    };

    state.tasks.insert(task.id.0, task.clone());
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::tasks::insert(pool, &task).await {
            state.tasks.remove(&task.id.0);
            return Err(persist_error("task", task.id, e));
        }
    }

    tracing::info!(task_id = %task.id, owner_id = %task.owner_id, "task created");
    if let Some(message) = mail::task_assigned_message(actor, &task) {
        mail::deliver(state.mailer.as_ref(), message).await;
    }
    Ok(task)
}

pub fn get(state: &AppState, actor: &User, id: TaskId) -> Result<Task, AppError> {
    state
        .tasks
        .get(id.as_uuid())
        .filter(|t| actor.is_admin() || t.owner_id == actor.id)
        .ok_or(AppError::NotFound(MessageCode::TaskNotFound))
}

/// The actor's tasks (every task for admins), earliest due date first.
/// Tasks without a due date come last.
pub fn list(state: &AppState, actor: &User, filter: TaskFilter, page: PageRequest) -> Page<Task> {
    let mut tasks = state.tasks.filter(|t| {
        (actor.is_admin() || t.owner_id == actor.id)
            && filter.season_id.map_or(true, |s| t.season_id == Some(s))
            && filter.status.map_or(true, |st| t.status == st)
    });
    tasks.sort_by(by_due_date);
    Page::slice(tasks, page)
}

fn by_due_date(a: &Task, b: &Task) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.title.cmp(&b.title))
}

async fn persist_or_restore(state: &AppState, task: &Task, previous: Task) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = row_written(crate::db::tasks::save(pool, task).await) {
            state.tasks.restore_if_unchanged(&previous.id.0.clone(), task, previous);
            return Err(persist_error("task", task.id, e));
        }
    }
    Ok(())
}

/// Replace a task's title, description and dates.
pub async fn update(
    state: &AppState,
    actor: &User,
    id: TaskId,
    request: TaskRequest,
) -> Result<Task, AppError> {
    get(state, actor, id)?;
    check_task_dates(&request)?;

    let (previous, task) = state
        .tasks
        .update_returning(id.as_uuid(), |t| t.apply(&request))
        .ok_or(AppError::NotFound(MessageCode::TaskNotFound))?;
    persist_or_restore(state, &task, previous).await?;

    tracing::info!(task_id = %task.id, "task updated");
    Ok(task)
}

pub async fn delete(state: &AppState, actor: &User, id: TaskId) -> Result<(), AppError> {
    get(state, actor, id)?;
    let removed = state
        .tasks
        .remove(id.as_uuid())
        .ok_or(AppError::NotFound(MessageCode::TaskNotFound))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = row_written(crate::db::tasks::delete(pool, id).await) {
            state.tasks.restore_if_absent(removed.id.0, removed);
            return Err(persist_error("task", id, e));
        }
    }

    tracing::info!(task_id = %id, "task deleted");
    Ok(())
}

/// Move a task to `target` if [`TaskStatusPolicy`] allows it.
pub async fn change_status(
    state: &AppState,
    actor: &User,
    id: TaskId,
    target: TaskStatus,
) -> Result<Task, AppError> {
    get(state, actor, id)?;

    let (previous, task) = state
        .tasks
        .try_update(id.as_uuid(), |t| {
            TaskStatusPolicy.check_transition(t.status, target)?;
            let previous = t.clone();
            t.status = target;
            Ok::<_, AppError>((previous, t.clone()))
        })
        .ok_or(AppError::NotFound(MessageCode::TaskNotFound))??;
    persist_or_restore(state, &task, previous.clone()).await?;

    tracing::info!(
        task_id = %task.id,
        from = %previous.status,
        to = %target,
        "task status changed"
    );
    Ok(task)
}
