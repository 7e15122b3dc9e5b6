//! # Plot API
//!
//! Plots belong to the user who created them. Administrators see all plots.

use agri_core::{FieldErrors, Plot, PlotId};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::saved;
use crate::auth::ActingUser;
use crate::error::AppError;
use crate::extractors::{
    extract_path, extract_validated_json, limit_amount, limit_length, require_text, Validate,
};
use crate::response::ApiResponse;
use crate::services::catalog::{self, NewPlot};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlotView {
    pub id: Uuid,
    pub plot_name: String,
    pub area_m2: Option<Decimal>,
    pub soil_type: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Plot> for PlotView {
    fn from(p: Plot) -> Self {
        Self {
            id: p.id.0,
            plot_name: p.plot_name,
            area_m2: p.area_m2,
            soil_type: p.soil_type,
            owner_id: p.owner_id.0,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePlotRequest {
    pub plot_name: Option<String>,
    pub area_m2: Option<Decimal>,
    pub soil_type: Option<String>,
}

impl Validate for CreatePlotRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "plot_name", self.plot_name.as_deref());
        limit_length(&mut errors, "plot_name", self.plot_name.as_deref(), 255);
        limit_length(&mut errors, "soil_type", self.soil_type.as_deref(), 100);
        if self.area_m2.is_some_and(|a| a <= Decimal::ZERO) {
            errors.invalid("area_m2", "must be greater than zero");
        }
        limit_amount(&mut errors, "area_m2", self.area_m2);
        errors.into_result()
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/plots", post(create_plot).get(list_plots))
        .route("/v1/plots/:id", get(get_plot))
}

/// POST /v1/plots: Register a plot owned by the caller.
#[utoipa::path(
    post,
    path = "/v1/plots",
    request_body = CreatePlotRequest,
    responses(
        (status = 200, description = "Plot created", body = PlotView),
        (status = 422, description = "Validation failed", body = crate::response::ErrorResponse),
    ),
    tag = "plots"
)]
async fn create_plot(
    State(state): State<AppState>,
    user: ActingUser,
    body: Result<Json<CreatePlotRequest>, JsonRejection>,
) -> Result<ApiResponse<PlotView>, AppError> {
    let req = extract_validated_json(body)?;
    let plot = catalog::create_plot(
        &state,
        &user.0,
        NewPlot {
            plot_name: req.plot_name.unwrap_or_default(),
            area_m2: req.area_m2,
            soil_type: req.soil_type,
        },
    )
    .await?;
    Ok(saved(plot.into()))
}

/// GET /v1/plots: Plots visible to the caller.
#[utoipa::path(
    get,
    path = "/v1/plots",
    responses((status = 200, description = "Plot list", body = [PlotView])),
    tag = "plots"
)]
async fn list_plots(State(state): State<AppState>, user: ActingUser) -> ApiResponse<Vec<PlotView>> {
    let plots = catalog::list_plots(&state, &user.0);
    ApiResponse::success(plots.into_iter().map(PlotView::from).collect())
}

/// GET /v1/plots/:id: Read a plot.
#[utoipa::path(
    get,
    path = "/v1/plots/{id}",
    params(("id" = Uuid, Path, description = "Plot ID")),
    responses(
        (status = 200, description = "Plot found", body = PlotView),
        (status = 404, description = "Not found", body = crate::response::ErrorResponse),
    ),
    tag = "plots"
)]
async fn get_plot(
    State(state): State<AppState>,
    user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<PlotView>, AppError> {
    let id = PlotId::from_uuid(extract_path(path)?);
    Ok(ApiResponse::success(catalog::get_plot(&state, &user.0, id)?.into()))
}
