//! # Season API
//!
//! Season creation runs field validation here, then the season service
//! checks the plot's other seasons and builds the record through
//! `SeasonFactory`. Status changes go through the season status policy.

use agri_core::{CropId, FieldErrors, PlotId, SeasonId, VarietyId};
use agri_state::{ExpenseSummary, Season, SeasonRequest, SeasonStatus, SeasonUpdate};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{parse_field, parse_filter, saved};
use crate::auth::ActingUser;
use crate::error::AppError;
use crate::extractors::{
    extract_json, extract_path, extract_query, extract_validated_json, limit_amount, limit_length,
    require_text, Validate,
};
use crate::response::{ApiResponse, PageRequest, PageResponse};
use crate::services::season::{self, NewSeason, SeasonFilter};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SeasonView {
    pub id: Uuid,
    pub season_name: String,
    /// `PLANNED`, `ACTIVE`, `COMPLETED`, `CANCELLED` or `ARCHIVED`.
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub planned_harvest_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub expected_yield_kg: Option<Decimal>,
    pub actual_yield_kg: Option<Decimal>,
    pub initial_plant_count: Option<i32>,
    pub current_plant_count: Option<i32>,
    pub notes: Option<String>,
    pub plot_id: Option<Uuid>,
    pub crop_id: Option<Uuid>,
    pub variety_id: Option<Uuid>,
}

impl From<Season> for SeasonView {
    fn from(s: Season) -> Self {
        Self {
            id: s.id.0,
            season_name: s.season_name,
            status: s.status.as_str().to_string(),
            start_date: s.start_date,
            planned_harvest_date: s.planned_harvest_date,
            end_date: s.end_date,
            expected_yield_kg: s.expected_yield_kg,
            actual_yield_kg: s.actual_yield_kg,
            initial_plant_count: s.initial_plant_count,
            current_plant_count: s.current_plant_count,
            notes: s.notes,
            plot_id: s.plot_id.map(|id| id.0),
            crop_id: s.crop_id.map(|id| id.0),
            variety_id: s.variety_id.map(|id| id.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpenseSummaryView {
    pub season_id: Uuid,
    pub expense_count: usize,
    pub total_cost: Decimal,
}

/// Body of `POST /v1/seasons`. Without a name, the season is named after
/// the quarter of its start date.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateSeasonRequest {
    pub plot_id: Option<Uuid>,
    pub crop_id: Option<Uuid>,
    pub variety_id: Option<Uuid>,
    pub season_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub planned_harvest_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub expected_yield_kg: Option<Decimal>,
    pub initial_plant_count: Option<i32>,
    pub notes: Option<String>,
}

impl CreateSeasonRequest {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.plot_id.is_none() {
            errors.missing("plot_id");
        }
        if self.crop_id.is_none() {
            errors.missing("crop_id");
        }
        check_season_fields(
            &mut errors,
            self.season_name.as_deref(),
            self.expected_yield_kg,
            self.notes.as_deref(),
        );
        if self.initial_plant_count.is_some_and(|c| c < 0) {
            errors.invalid("initial_plant_count", "must not be negative");
        }
        errors
    }
}

impl Validate for CreateSeasonRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        self.field_errors().into_result()
    }
}

impl TryFrom<CreateSeasonRequest> for NewSeason {
    type Error = FieldErrors;

    fn try_from(req: CreateSeasonRequest) -> Result<Self, Self::Error> {
        let errors = req.field_errors();
        match (req.plot_id, req.crop_id) {
            (Some(plot_id), Some(crop_id)) if errors.is_empty() => Ok(NewSeason {
                plot_id: PlotId::from_uuid(plot_id),
                crop_id: CropId::from_uuid(crop_id),
                variety_id: req.variety_id.map(VarietyId::from_uuid),
                request: SeasonRequest {
                    season_name: req.season_name,
                    start_date: req.start_date,
                    planned_harvest_date: req.planned_harvest_date,
                    end_date: req.end_date,
                    expected_yield_kg: req.expected_yield_kg,
                    initial_plant_count: req.initial_plant_count,
                    notes: req.notes,
                },
            }),
            _ => Err(errors),
        }
    }
}

fn check_season_fields(
    errors: &mut FieldErrors,
    name: Option<&str>,
    expected_yield_kg: Option<Decimal>,
    notes: Option<&str>,
) {
    limit_length(errors, "season_name", name, 255);
    limit_length(errors, "notes", notes, 2000);
    if expected_yield_kg.is_some_and(|y| y.is_sign_negative()) {
        errors.invalid("expected_yield_kg", "must not be negative");
    }
    limit_amount(errors, "expected_yield_kg", expected_yield_kg);
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSeasonRequest {
    pub season_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub planned_harvest_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub expected_yield_kg: Option<Decimal>,
    pub actual_yield_kg: Option<Decimal>,
    pub current_plant_count: Option<i32>,
    pub notes: Option<String>,
}

impl Validate for UpdateSeasonRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.season_name.is_some() {
            require_text(&mut errors, "season_name", self.season_name.as_deref());
        }
        check_season_fields(
            &mut errors,
            self.season_name.as_deref(),
            self.expected_yield_kg,
            self.notes.as_deref(),
        );
        if self.actual_yield_kg.is_some_and(|y| y.is_sign_negative()) {
            errors.invalid("actual_yield_kg", "must not be negative");
        }
        limit_amount(&mut errors, "actual_yield_kg", self.actual_yield_kg);
        if self.current_plant_count.is_some_and(|c| c < 0) {
            errors.invalid("current_plant_count", "must not be negative");
        }
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SeasonStatusRequest {
    /// Target status.
    pub status: Option<String>,
    /// Harvested quantity, only accepted with `COMPLETED`.
    pub actual_yield_kg: Option<Decimal>,
}

impl Validate for SeasonStatusRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        parse_field(&mut errors, "status", self.status.as_deref(), SeasonStatus::from_name);
        if self.actual_yield_kg.is_some_and(|y| y.is_sign_negative()) {
            errors.invalid("actual_yield_kg", "must not be negative");
        }
        limit_amount(&mut errors, "actual_yield_kg", self.actual_yield_kg);
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SeasonListQuery {
    pub plot_id: Option<Uuid>,
    pub status: Option<String>,
    /// Zero-based page number.
    pub page: Option<u32>,
    /// Page size, 1 to 100 (default 20).
    pub size: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/seasons", post(create_season).get(list_seasons))
        .route("/v1/seasons/:id", get(get_season).put(update_season))
        .route("/v1/seasons/:id/status", post(change_status))
        .route("/v1/seasons/:id/expense-summary", get(expense_summary))
}

/// POST /v1/seasons: Start a season on one of the caller's plots.
#[utoipa::path(
    post,
    path = "/v1/seasons",
    request_body = CreateSeasonRequest,
    responses(
        (status = 200, description = "Season created", body = SeasonView),
        (status = 404, description = "Plot, crop or variety not found", body = crate::response::ErrorResponse),
        (status = 409, description = "Duplicate name or overlapping dates", body = crate::response::ErrorResponse),
        (status = 422, description = "Validation failed", body = crate::response::ErrorResponse),
    ),
    tag = "seasons"
)]
async fn create_season(
    State(state): State<AppState>,
    user: ActingUser,
    body: Result<Json<CreateSeasonRequest>, JsonRejection>,
) -> Result<ApiResponse<SeasonView>, AppError> {
    let new = NewSeason::try_from(extract_json(body)?)?;
    let created = season::create(&state, &user.0, new).await?;
    Ok(saved(created.into()))
}

/// GET /v1/seasons: Seasons on the caller's plots, newest first.
#[utoipa::path(
    get,
    path = "/v1/seasons",
    params(SeasonListQuery),
    responses((status = 200, description = "One page of seasons", body = [SeasonView])),
    tag = "seasons"
)]
async fn list_seasons(
    State(state): State<AppState>,
    user: ActingUser,
    query: Result<Query<SeasonListQuery>, QueryRejection>,
) -> Result<ApiResponse<PageResponse<SeasonView>>, AppError> {
    let q = extract_query(query)?;
    let filter = SeasonFilter {
        plot_id: q.plot_id.map(PlotId::from_uuid),
        status: parse_filter("status", q.status.as_deref(), SeasonStatus::from_name)?,
    };
    let page = season::list(&state, &user.0, filter, PageRequest::new(q.page, q.size));
    let items = page.content.iter().cloned().map(SeasonView::from).collect();
    Ok(ApiResponse::success(PageResponse::from_page(&page, items)))
}

/// GET /v1/seasons/:id: Read a season.
#[utoipa::path(
    get,
    path = "/v1/seasons/{id}",
    params(("id" = Uuid, Path, description = "Season ID")),
    responses(
        (status = 200, description = "Season found", body = SeasonView),
        (status = 404, description = "Not found", body = crate::response::ErrorResponse),
    ),
    tag = "seasons"
)]
async fn get_season(
    State(state): State<AppState>,
    user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<SeasonView>, AppError> {
    let id = SeasonId::from_uuid(extract_path(path)?);
    Ok(ApiResponse::success(season::get(&state, &user.0, id)?.into()))
}

/// PUT /v1/seasons/:id: Edit a season's details.
#[utoipa::path(
    put,
    path = "/v1/seasons/{id}",
    params(("id" = Uuid, Path, description = "Season ID")),
    request_body = UpdateSeasonRequest,
    responses(
        (status = 200, description = "Season updated", body = SeasonView),
        (status = 404, description = "Not found", body = crate::response::ErrorResponse),
        (status = 409, description = "Season closed, duplicate name or overlapping dates", body = crate::response::ErrorResponse),
    ),
    tag = "seasons"
)]
async fn update_season(
    State(state): State<AppState>,
    user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateSeasonRequest>, JsonRejection>,
) -> Result<ApiResponse<SeasonView>, AppError> {
    let id = SeasonId::from_uuid(extract_path(path)?);
    let req = extract_validated_json(body)?;
    let update = SeasonUpdate {
        season_name: req.season_name,
        start_date: req.start_date,
        planned_harvest_date: req.planned_harvest_date,
        end_date: req.end_date,
        expected_yield_kg: req.expected_yield_kg,
        actual_yield_kg: req.actual_yield_kg,
        current_plant_count: req.current_plant_count,
        notes: req.notes,
    };
    let updated = season::update(&state, &user.0, id, update).await?;
    Ok(saved(updated.into()))
}

/// POST /v1/seasons/:id/status: Move a season to another status.
#[utoipa::path(
    post,
    path = "/v1/seasons/{id}/status",
    params(("id" = Uuid, Path, description = "Season ID")),
    request_body = SeasonStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = SeasonView),
        (status = 404, description = "Not found", body = crate::response::ErrorResponse),
        (status = 409, description = "Transition not allowed", body = crate::response::ErrorResponse),
    ),
    tag = "seasons"
)]
async fn change_status(
    State(state): State<AppState>,
    user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<SeasonStatusRequest>, JsonRejection>,
) -> Result<ApiResponse<SeasonView>, AppError> {
    let id = SeasonId::from_uuid(extract_path(path)?);
    let req = extract_validated_json(body)?;
    let target = SeasonStatus::from_name(req.status.as_deref().unwrap_or_default())?;
    let updated = season::change_status(&state, &user.0, id, target, req.actual_yield_kg).await?;
    Ok(saved(updated.into()))
}

/// GET /v1/seasons/:id/expense-summary: Count and total of a season's expenses.
#[utoipa::path(
    get,
    path = "/v1/seasons/{id}/expense-summary",
    params(("id" = Uuid, Path, description = "Season ID")),
    responses(
        (status = 200, description = "Expense totals", body = ExpenseSummaryView),
        (status = 404, description = "Not found", body = crate::response::ErrorResponse),
    ),
    tag = "seasons"
)]
async fn expense_summary(
    State(state): State<AppState>,
    user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<ExpenseSummaryView>, AppError> {
    let id = SeasonId::from_uuid(extract_path(path)?);
    let ExpenseSummary {
        expense_count,
        total_cost,
    } = season::expense_summary(&state, &user.0, id)?;
    Ok(ApiResponse::success(ExpenseSummaryView {
        season_id: id.0,
        expense_count,
        total_cost,
    }))
}
