//! # User API
//!
//! Account management. Creating accounts and changing their status is
//! reserved to administrators; everyone may read their own account.

use agri_core::{FieldErrors, User, UserId, UserRole, UserStatus};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{parse_field, saved};
use crate::auth::{require_role, ActingUser};
use crate::error::AppError;
use crate::extractors::{extract_path, extract_validated_json, limit_length, require_text, Validate};
use crate::response::ApiResponse;
use crate::services::catalog::{self, NewUser};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    /// `FARMER` or `ADMIN`.
    pub role: String,
    /// `ACTIVE` or `INACTIVE`.
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id.0,
            username: u.username,
            full_name: u.full_name,
            email: u.email,
            role: u.role.as_str().to_string(),
            status: u.status.as_str().to_string(),
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    /// `FARMER` (default) or `ADMIN`.
    pub role: Option<String>,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "username", self.username.as_deref());
        limit_length(&mut errors, "username", self.username.as_deref(), 64);
        if self
            .username
            .as_deref()
            .is_some_and(|u| u.trim().contains(char::is_whitespace))
        {
            errors.invalid("username", "must not contain spaces");
        }
        require_text(&mut errors, "full_name", self.full_name.as_deref());
        limit_length(&mut errors, "full_name", self.full_name.as_deref(), 255);
        if let Some(email) = self.email.as_deref() {
            let email = email.trim();
            if !email.is_empty() && !looks_like_email(email) {
                errors.invalid("email", "must be a valid email address");
            }
        }
        if self.role.is_some() {
            parse_field(&mut errors, "role", self.role.as_deref(), UserRole::from_name);
        }
        errors.into_result()
    }
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserStatusRequest {
    /// `ACTIVE` or `INACTIVE`.
    pub status: Option<String>,
}

impl Validate for UserStatusRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        parse_field(&mut errors, "status", self.status.as_deref(), UserStatus::from_name);
        errors.into_result()
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/users", post(create_user))
        .route("/v1/users/me", get(me))
        .route("/v1/users/:id", get(get_user))
        .route("/v1/users/:id/status", put(set_status))
}

/// GET /v1/users/me: The acting account.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    responses((status = 200, description = "Acting user", body = UserView)),
    tag = "users"
)]
async fn me(user: ActingUser) -> ApiResponse<UserView> {
    ApiResponse::success(user.0.into())
}

/// POST /v1/users: Create an account (admin).
#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = UserView),
        (status = 403, description = "Caller is not an administrator", body = crate::response::ErrorResponse),
        (status = 409, description = "Username taken", body = crate::response::ErrorResponse),
        (status = 422, description = "Validation failed", body = crate::response::ErrorResponse),
    ),
    tag = "users"
)]
async fn create_user(
    State(state): State<AppState>,
    user: ActingUser,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<ApiResponse<UserView>, AppError> {
    require_role(&user, UserRole::Admin)?;
    let req = extract_validated_json(body)?;

    let role = match req.role.as_deref() {
        Some(r) => UserRole::from_name(r)?,
        None => UserRole::Farmer,
    };
    let created = catalog::create_user(
        &state,
        NewUser {
            username: req.username.unwrap_or_default(),
            full_name: req.full_name.unwrap_or_default(),
            email: req.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
            role,
        },
    )
    .await?;
    Ok(saved(created.into()))
}

/// GET /v1/users/:id: Read an account (admin or self).
#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserView),
        (status = 404, description = "Not found", body = crate::response::ErrorResponse),
    ),
    tag = "users"
)]
async fn get_user(
    State(state): State<AppState>,
    user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<UserView>, AppError> {
    let id = UserId::from_uuid(extract_path(path)?);
    let found = catalog::get_user(&state, &user.0, id)?;
    Ok(ApiResponse::success(found.into()))
}

/// PUT /v1/users/:id/status: Activate or deactivate an account (admin).
#[utoipa::path(
    put,
    path = "/v1/users/{id}/status",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UserStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = UserView),
        (status = 403, description = "Caller is not an administrator", body = crate::response::ErrorResponse),
        (status = 404, description = "Not found", body = crate::response::ErrorResponse),
    ),
    tag = "users"
)]
async fn set_status(
    State(state): State<AppState>,
    user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UserStatusRequest>, JsonRejection>,
) -> Result<ApiResponse<UserView>, AppError> {
    require_role(&user, UserRole::Admin)?;
    let id = UserId::from_uuid(extract_path(path)?);
    let req = extract_validated_json(body)?;
    let status = UserStatus::from_name(req.status.as_deref().unwrap_or_default())?;

    let updated = catalog::set_user_status(&state, id, status).await?;
    Ok(saved(updated.into()))
}
