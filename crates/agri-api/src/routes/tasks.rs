//! # Task API
//!
//! Tasks are always owned by the user who creates them. Linking a task to a
//! season requires that season to be visible to the caller and still open.

use agri_core::{FieldErrors, SeasonId, TaskId};
use agri_state::{Task, TaskRequest, TaskStatus};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{parse_field, parse_filter, saved};
use crate::auth::ActingUser;
use crate::error::AppError;
use crate::extractors::{extract_path, extract_query, extract_validated_json, limit_length, require_text, Validate};
use crate::response::{ApiResponse, PageRequest, PageResponse};
use crate::services::task::{self, NewTask, TaskFilter};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// `PENDING`, `IN_PROGRESS`, `DONE` or `CANCELLED`.
    pub status: String,
    pub planned_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub owner_id: Uuid,
    pub season_id: Option<Uuid>,
}

impl From<Task> for TaskView {
    fn from(t: Task) -> Self {
        Self {
            id: t.id.0,
            title: t.title,
            description: t.description,
            status: t.status.as_str().to_string(),
            planned_date: t.planned_date,
            due_date: t.due_date,
            owner_id: t.owner_id.0,
            season_id: t.season_id.map(|id| id.0),
        }
    }
}

/// Body of `POST /v1/tasks` and `PUT /v1/tasks/:id`. `season_id` is only
/// read on create.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TaskBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub planned_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub season_id: Option<Uuid>,
}

impl Validate for TaskBody {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "title", self.title.as_deref());
        limit_length(&mut errors, "title", self.title.as_deref(), 255);
        limit_length(&mut errors, "description", self.description.as_deref(), 2000);
        errors.into_result()
    }
}

impl TaskBody {
    fn to_request(&self) -> TaskRequest {
        TaskRequest {
            title: self.title.as_deref().unwrap_or_default().trim().to_string(),
            description: self.description.clone(),
            planned_date: self.planned_date,
            due_date: self.due_date,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TaskStatusRequest {
    pub status: Option<String>,
}

impl Validate for TaskStatusRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        parse_field(&mut errors, "status", self.status.as_deref(), TaskStatus::from_name);
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TaskListQuery {
    pub season_id: Option<Uuid>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/tasks", post(create_task).get(list_tasks))
        .route(
            "/v1/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/v1/tasks/:id/status", post(change_status))
}

/// POST /v1/tasks: Create a task owned by the caller.
#[utoipa::path(
    post,
    path = "/v1/tasks",
    request_body = TaskBody,
    responses(
        (status = 200, description = "Task created", body = TaskView),
        (status = 404, description = "Season not found", body = crate::response::ErrorResponse),
        (status = 409, description = "Season is closed", body = crate::response::ErrorResponse),
        (status = 422, description = "Validation failed", body = crate::response::ErrorResponse),
    ),
    tag = "tasks"
)]
async fn create_task(
    State(state): State<AppState>,
    user: ActingUser,
    body: Result<Json<TaskBody>, JsonRejection>,
) -> Result<ApiResponse<TaskView>, AppError> {
    let req = extract_validated_json(body)?;
    let new = NewTask {
        request: req.to_request(),
        season_id: req.season_id.map(SeasonId::from_uuid),
    };
    let created = task::create(&state, &user.0, new).await?;
    Ok(saved(created.into()))
}

/// GET /v1/tasks: The caller's tasks, earliest due date first.
#[utoipa::path(
    get,
    path = "/v1/tasks",
    params(TaskListQuery),
    responses((status = 200, description = "One page of tasks", body = [TaskView])),
    tag = "tasks"
)]
async fn list_tasks(
    State(state): State<AppState>,
    user: ActingUser,
    query: Result<Query<TaskListQuery>, QueryRejection>,
) -> Result<ApiResponse<PageResponse<TaskView>>, AppError> {
    let q = extract_query(query)?;
    let filter = TaskFilter {
        season_id: q.season_id.map(SeasonId::from_uuid),
        status: parse_filter("status", q.status.as_deref(), TaskStatus::from_name)?,
    };
    let page = task::list(&state, &user.0, filter, PageRequest::new(q.page, q.size));
    let items = page.content.iter().cloned().map(TaskView::from).collect();
    Ok(ApiResponse::success(PageResponse::from_page(&page, items)))
}

/// GET /v1/tasks/:id: Read a task.
#[utoipa::path(
    get,
    path = "/v1/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task found", body = TaskView),
        (status = 404, description = "Not found", body = crate::response::ErrorResponse),
    ),
    tag = "tasks"
)]
async fn get_task(
    State(state): State<AppState>,
    user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<TaskView>, AppError> {
    let id = TaskId::from_uuid(extract_path(path)?);
    Ok(ApiResponse::success(task::get(&state, &user.0, id)?.into()))
}

/// PUT /v1/tasks/:id: Replace a task's details.
#[utoipa::path(
    put,
    path = "/v1/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = TaskBody,
    responses(
        (status = 200, description = "Task updated", body = TaskView),
        (status = 404, description = "Not found", body = crate::response::ErrorResponse),
    ),
    tag = "tasks"
)]
async fn update_task(
    State(state): State<AppState>,
    user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<TaskBody>, JsonRejection>,
) -> Result<ApiResponse<TaskView>, AppError> {
    let id = TaskId::from_uuid(extract_path(path)?);
    let req = extract_validated_json(body)?;
    let updated = task::update(&state, &user.0, id, req.to_request()).await?;
    Ok(saved(updated.into()))
}

/// DELETE /v1/tasks/:id: Delete a task.
#[utoipa::path(
    delete,
    path = "/v1/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted"),
        (status = 404, description = "Not found", body = crate::response::ErrorResponse),
    ),
    tag = "tasks"
)]
async fn delete_task(
    State(state): State<AppState>,
    user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<()>, AppError> {
    let id = TaskId::from_uuid(extract_path(path)?);
    task::delete(&state, &user.0, id).await?;
    Ok(ApiResponse::success(()))
}

/// POST /v1/tasks/:id/status: Move a task to another status.
#[utoipa::path(
    post,
    path = "/v1/tasks/{id}/status",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = TaskStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = TaskView),
        (status = 404, description = "Not found", body = crate::response::ErrorResponse),
        (status = 409, description = "Transition not allowed", body = crate::response::ErrorResponse),
    ),
    tag = "tasks"
)]
async fn change_status(
    State(state): State<AppState>,
    user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<TaskStatusRequest>, JsonRejection>,
) -> Result<ApiResponse<TaskView>, AppError> {
    let id = TaskId::from_uuid(extract_path(path)?);
    let req = extract_validated_json(body)?;
    let target = TaskStatus::from_name(req.status.as_deref().unwrap_or_default())?;
    let updated = task::change_status(&state, &user.0, id, target).await?;
    Ok(saved(updated.into()))
}
