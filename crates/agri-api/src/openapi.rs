//! # OpenAPI Document
//!
//! Collects every utoipa-documented route and DTO into one document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "`{role}:{user_id}:{secret}` or `{secret}`. Set the secret via AGRI_AUTH_TOKEN.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agri Stack API",
        version = "0.1.0",
        description = "Farm management backend: users, plots, the crop catalog, cultivation seasons, tasks and expenses.\n\nEvery `/v1/*` response is an envelope `{status, code, message, result}`; listings put a page `{items, page, size, total_elements, total_pages}` in `result`. Failures answer with `{status, code, message, field_errors, path, timestamp}`.\n\nAuthentication: `Authorization: Bearer <token>`. Health probes and `/metrics` are unauthenticated.",
        license(name = "AGPL-3.0-or-later"),
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        crate::routes::users::me,
        crate::routes::users::create_user,
        crate::routes::users::get_user,
        crate::routes::users::set_status,
        crate::routes::plots::create_plot,
        crate::routes::plots::list_plots,
        crate::routes::plots::get_plot,
        crate::routes::crops::create_crop,
        crate::routes::crops::list_crops,
        crate::routes::crops::get_crop,
        crate::routes::crops::create_variety,
        crate::routes::crops::list_varieties,
        crate::routes::seasons::create_season,
        crate::routes::seasons::list_seasons,
        crate::routes::seasons::get_season,
        crate::routes::seasons::update_season,
        crate::routes::seasons::change_status,
        crate::routes::seasons::expense_summary,
        crate::routes::tasks::create_task,
        crate::routes::tasks::list_tasks,
        crate::routes::tasks::get_task,
        crate::routes::tasks::update_task,
        crate::routes::tasks::delete_task,
        crate::routes::tasks::change_status,
        crate::routes::expenses::create_expense,
        crate::routes::expenses::list_expenses,
        crate::routes::expenses::get_expense,
        crate::routes::expenses::update_expense,
        crate::routes::expenses::delete_expense,
    ),
    components(
        schemas(
            crate::response::ErrorResponse,
            crate::routes::users::UserView,
            crate::routes::users::CreateUserRequest,
            crate::routes::users::UserStatusRequest,
            crate::routes::plots::PlotView,
            crate::routes::plots::CreatePlotRequest,
            crate::routes::crops::CropView,
            crate::routes::crops::VarietyView,
            crate::routes::crops::CatalogEntryRequest,
            crate::routes::seasons::SeasonView,
            crate::routes::seasons::ExpenseSummaryView,
            crate::routes::seasons::CreateSeasonRequest,
            crate::routes::seasons::UpdateSeasonRequest,
            crate::routes::seasons::SeasonStatusRequest,
            crate::routes::tasks::TaskView,
            crate::routes::tasks::TaskBody,
            crate::routes::tasks::TaskStatusRequest,
            crate::routes::expenses::ExpenseView,
            crate::routes::expenses::ExpenseBody,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "users", description = "Accounts and roles"),
        (name = "plots", description = "Land parcels owned by farmers"),
        (name = "crops", description = "Crop and variety catalog"),
        (name = "seasons", description = "Cultivation seasons: creation, edits, status transitions, expense totals"),
        (name = "tasks", description = "Scheduled farm work"),
        (name = "expenses", description = "Costs booked against a season"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_generates() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "Agri Stack API");
    }

    #[test]
    fn spec_has_resource_paths() {
        let spec = ApiDoc::openapi();
        for path in [
            "/v1/users/me",
            "/v1/plots",
            "/v1/crops/{id}/varieties",
            "/v1/seasons",
            "/v1/seasons/{id}/status",
            "/v1/seasons/{id}/expense-summary",
            "/v1/tasks/{id}",
            "/v1/expenses/{id}",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn spec_has_security_scheme() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("SeasonView"));
        assert!(components.schemas.contains_key("ErrorResponse"));
    }
}
