//! # Expense API

use agri_core::{ExpenseId, FieldErrors, SeasonId};
use agri_state::{Expense, ExpenseRequest};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::saved;
use crate::auth::ActingUser;
use crate::error::AppError;
use crate::extractors::{extract_path, extract_query, extract_validated_json, limit_length, require_text, Validate};
use crate::response::{ApiResponse, PageRequest, PageResponse};
use crate::services::expense;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpenseView {
    pub id: Uuid,
    pub season_id: Uuid,
    pub owner_id: Uuid,
    pub item_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    /// `unit_price × quantity`.
    pub total_cost: Decimal,
    pub expense_date: NaiveDate,
    pub notes: Option<String>,
}

impl From<Expense> for ExpenseView {
    fn from(e: Expense) -> Self {
        Self {
            id: e.id.0,
            season_id: e.season_id.0,
            owner_id: e.owner_id.0,
            item_name: e.item_name,
            unit_price: e.unit_price,
            quantity: e.quantity,
            total_cost: e.total_cost,
            expense_date: e.expense_date,
            notes: e.notes,
        }
    }
}

/// Body of `POST /v1/expenses` and `PUT /v1/expenses/:id`. `season_id` is
/// required on create and ignored on update.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ExpenseBody {
    pub season_id: Option<Uuid>,
    pub item_name: Option<String>,
    pub unit_price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub expense_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl Validate for ExpenseBody {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "item_name", self.item_name.as_deref());
        limit_length(&mut errors, "item_name", self.item_name.as_deref(), 255);
        limit_length(&mut errors, "notes", self.notes.as_deref(), 2000);
        if self.unit_price.is_none() {
            errors.missing("unit_price");
        }
        if self.quantity.is_none() {
            errors.missing("quantity");
        }
        if self.expense_date.is_none() {
            errors.missing("expense_date");
        }
        errors.into_result()
    }
}

impl ExpenseBody {
    /// The line item, once [`Validate::validate`] has passed.
    fn to_request(&self) -> Result<ExpenseRequest, FieldErrors> {
        self.validate()?;
        match (self.unit_price, self.quantity, self.expense_date) {
            (Some(unit_price), Some(quantity), Some(expense_date)) => Ok(ExpenseRequest {
                item_name: self.item_name.as_deref().unwrap_or_default().trim().to_string(),
                unit_price,
                quantity,
                expense_date,
                notes: self.notes.clone(),
            }),
            _ => Err(FieldErrors::new()),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ExpenseListQuery {
    pub season_id: Option<Uuid>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/expenses", post(create_expense).get(list_expenses))
        .route(
            "/v1/expenses/:id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
}

/// POST /v1/expenses: Record an expense on an open season.
#[utoipa::path(
    post,
    path = "/v1/expenses",
    request_body = ExpenseBody,
    responses(
        (status = 200, description = "Expense recorded", body = ExpenseView),
        (status = 404, description = "Season not found", body = crate::response::ErrorResponse),
        (status = 409, description = "Season is closed", body = crate::response::ErrorResponse),
        (status = 422, description = "Validation failed", body = crate::response::ErrorResponse),
    ),
    tag = "expenses"
)]
async fn create_expense(
    State(state): State<AppState>,
    user: ActingUser,
    body: Result<Json<ExpenseBody>, JsonRejection>,
) -> Result<ApiResponse<ExpenseView>, AppError> {
    let body = extract_validated_json(body)?;
    let Some(season_id) = body.season_id else {
        let mut errors = FieldErrors::new();
        errors.missing("season_id");
        return Err(errors.into());
    };
    let request = body.to_request()?;
    let created = expense::create(&state, &user.0, SeasonId::from_uuid(season_id), request).await?;
    Ok(saved(created.into()))
}

/// GET /v1/expenses: The caller's expenses, most recent first.
#[utoipa::path(
    get,
    path = "/v1/expenses",
    params(ExpenseListQuery),
    responses(
        (status = 200, description = "One page of expenses", body = [ExpenseView]),
        (status = 404, description = "Season not found", body = crate::response::ErrorResponse),
    ),
    tag = "expenses"
)]
async fn list_expenses(
    State(state): State<AppState>,
    user: ActingUser,
    query: Result<Query<ExpenseListQuery>, QueryRejection>,
) -> Result<ApiResponse<PageResponse<ExpenseView>>, AppError> {
    let q = extract_query(query)?;
    let page = expense::list(
        &state,
        &user.0,
        q.season_id.map(SeasonId::from_uuid),
        PageRequest::new(q.page, q.size),
    )?;
    let items = page.content.iter().cloned().map(ExpenseView::from).collect();
    Ok(ApiResponse::success(PageResponse::from_page(&page, items)))
}

/// GET /v1/expenses/:id: Read an expense.
#[utoipa::path(
    get,
    path = "/v1/expenses/{id}",
    params(("id" = Uuid, Path, description = "Expense ID")),
    responses(
        (status = 200, description = "Expense found", body = ExpenseView),
        (status = 404, description = "Not found", body = crate::response::ErrorResponse),
    ),
    tag = "expenses"
)]
async fn get_expense(
    State(state): State<AppState>,
    user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<ExpenseView>, AppError> {
    let id = ExpenseId::from_uuid(extract_path(path)?);
    Ok(ApiResponse::success(expense::get(&state, &user.0, id)?.into()))
}

/// PUT /v1/expenses/:id: Replace an expense's line item.
#[utoipa::path(
    put,
    path = "/v1/expenses/{id}",
    params(("id" = Uuid, Path, description = "Expense ID")),
    request_body = ExpenseBody,
    responses(
        (status = 200, description = "Expense updated", body = ExpenseView),
        (status = 404, description = "Not found", body = crate::response::ErrorResponse),
        (status = 409, description = "Season is closed", body = crate::response::ErrorResponse),
    ),
    tag = "expenses"
)]
async fn update_expense(
    State(state): State<AppState>,
    user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ExpenseBody>, JsonRejection>,
) -> Result<ApiResponse<ExpenseView>, AppError> {
    let id = ExpenseId::from_uuid(extract_path(path)?);
    let request = extract_validated_json(body)?.to_request()?;
    let updated = expense::update(&state, &user.0, id, request).await?;
    Ok(saved(updated.into()))
}

/// DELETE /v1/expenses/:id: Delete an expense.
#[utoipa::path(
    delete,
    path = "/v1/expenses/{id}",
    params(("id" = Uuid, Path, description = "Expense ID")),
    responses(
        (status = 200, description = "Expense deleted"),
        (status = 404, description = "Not found", body = crate::response::ErrorResponse),
        (status = 409, description = "Season is closed", body = crate::response::ErrorResponse),
    ),
    tag = "expenses"
)]
async fn delete_expense(
    State(state): State<AppState>,
    user: ActingUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<()>, AppError> {
    let id = ExpenseId::from_uuid(extract_path(path)?);
    expense::delete(&state, &user.0, id).await?;
    Ok(ApiResponse::success(()))
}
