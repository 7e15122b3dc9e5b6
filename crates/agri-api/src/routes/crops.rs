//! # Crop Catalog API
//!
//! Crops and their varieties are shared reference data: anyone may read
//! them, only administrators may add to them.

use agri_core::{Crop, CropId, FieldErrors, UserRole, Variety};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::saved;
use crate::auth::{require_role, ActingUser};
use crate::error::AppError;
use crate::extractors::{extract_path, extract_validated_json, limit_length, require_text, Validate};
use crate::response::ApiResponse;
use crate::services::catalog;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CropView {
    pub id: Uuid,
    pub crop_name: String,
    pub description: Option<String>,
}

impl From<Crop> for CropView {
    fn from(c: Crop) -> Self {
        Self {
            id: c.id.0,
            crop_name: c.crop_name,
            description: c.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VarietyView {
    pub id: Uuid,
    pub crop_id: Uuid,
    pub variety_name: String,
    pub description: Option<String>,
}

impl From<Variety> for VarietyView {
    fn from(v: Variety) -> Self {
        Self {
            id: v.id.0,
            crop_id: v.crop_id.0,
            variety_name: v.variety_name,
            description: v.description,
        }
    }
}

/// Body of both `POST /v1/crops` and `POST /v1/crops/:id/varieties`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CatalogEntryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Validate for CatalogEntryRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "name", self.name.as_deref());
        limit_length(&mut errors, "name", self.name.as_deref(), 255);
        limit_length(&mut errors, "description", self.description.as_deref(), 2000);
        errors.into_result()
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/crops", post(create_crop).get(list_crops))
        .route("/v1/crops/:id", get(get_crop))
        .route(
            "/v1/crops/:id/varieties",
            post(create_variety).get(list_varieties),
        )
}

/// POST /v1/crops: Add a crop (admin).
#[utoipa::path(
    post,
    path = "/v1/crops",
    request_body = CatalogEntryRequest,
    responses(
        (status = 200, description = "Crop created", body = CropView),
        (status = 403, description = "Caller is not an administrator", body = crate::response::ErrorResponse),
        (status = 409, description = "Name already used", body = crate::response::ErrorResponse),
    ),
    tag = "crops"
)]
async fn create_crop(
    State(state): State<AppState>,
    user: ActingUser,
    body: Result<Json<CatalogEntryRequest>, JsonRejection>,
) -> Result<ApiResponse<CropView>, AppError> {
    require_role(&user, UserRole::Admin)?;
    let req = extract_validated_json(body)?;
    let crop = catalog::create_crop(&state, req.name.as_deref().unwrap_or_default(), req.description).await?;
    Ok(saved(crop.into()))
}

/// GET /v1/crops: The crop catalog, by name.
#[utoipa::path(
    get,
    path = "/v1/crops",
    responses((status = 200, description = "Crop list", body = [CropView])),
    tag = "crops"
)]
async fn list_crops(State(state): State<AppState>, _user: ActingUser) -> ApiResponse<Vec<CropView>> {
    ApiResponse::success(catalog::list_crops(&state).into_iter().map(CropView::from).collect())
}

/// GET /v1/crops/:id: Read a crop.
#[utoipa::path(
    get,
    path = "/v1/crops/{id}",
    params(("id" = Uuid, Path, description = "Crop ID")),
    responses(
        (status = 200, description = "Crop found", body = CropView),
        (status = 404, description = "Not found", body = crate::response::ErrorResponse),
    ),
    tag = "crops"
)]
async fn get_crop(
    State(state): State<AppState>,
    _user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<CropView>, AppError> {
    let id = CropId::from_uuid(extract_path(path)?);
    Ok(ApiResponse::success(catalog::get_crop(&state, id)?.into()))
}

/// POST /v1/crops/:id/varieties: Add a variety to a crop (admin).
#[utoipa::path(
    post,
    path = "/v1/crops/{id}/varieties",
    params(("id" = Uuid, Path, description = "Crop ID")),
    request_body = CatalogEntryRequest,
    responses(
        (status = 200, description = "Variety created", body = VarietyView),
        (status = 404, description = "Crop not found", body = crate::response::ErrorResponse),
        (status = 409, description = "Name already used for this crop", body = crate::response::ErrorResponse),
    ),
    tag = "crops"
)]
async fn create_variety(
    State(state): State<AppState>,
    user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<CatalogEntryRequest>, JsonRejection>,
) -> Result<ApiResponse<VarietyView>, AppError> {
    require_role(&user, UserRole::Admin)?;
    let crop_id = CropId::from_uuid(extract_path(path)?);
    let req = extract_validated_json(body)?;
    let variety = catalog::create_variety(
        &state,
        crop_id,
        req.name.as_deref().unwrap_or_default(),
        req.description,
    )
    .await?;
    Ok(saved(variety.into()))
}

/// GET /v1/crops/:id/varieties: Varieties of a crop, by name.
#[utoipa::path(
    get,
    path = "/v1/crops/{id}/varieties",
    params(("id" = Uuid, Path, description = "Crop ID")),
    responses(
        (status = 200, description = "Variety list", body = [VarietyView]),
        (status = 404, description = "Crop not found", body = crate::response::ErrorResponse),
    ),
    tag = "crops"
)]
async fn list_varieties(
    State(state): State<AppState>,
    _user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<Vec<VarietyView>>, AppError> {
    let crop_id = CropId::from_uuid(extract_path(path)?);
    let varieties = catalog::list_varieties(&state, crop_id)?;
    Ok(ApiResponse::success(
        varieties.into_iter().map(VarietyView::from).collect(),
    ))
}
