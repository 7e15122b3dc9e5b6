//! # agri-api: Axum API Service for the Agri Stack
//!
//! HTTP surface over the season, task and expense lifecycle in
//! `agri-state`, plus the user, plot and crop catalog it depends on.
//!
//! ## API Surface
//!
//! | Prefix              | Module                | Domain                     |
//! |---------------------|-----------------------|----------------------------|
//! | `/v1/users/*`       | [`routes::users`]     | Accounts and roles         |
//! | `/v1/plots/*`       | [`routes::plots`]     | Land parcels               |
//! | `/v1/crops/*`       | [`routes::crops`]     | Crop and variety catalog   |
//! | `/v1/seasons/*`     | [`routes::seasons`]   | Cultivation seasons        |
//! | `/v1/tasks/*`       | [`routes::tasks`]     | Scheduled work             |
//! | `/v1/expenses/*`    | [`routes::expenses`]  | Season costs               |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → Metrics → ErrorPath → Auth → RateLimit → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Generated from utoipa derive macros, served at `/openapi.json`.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod mail;
pub mod middleware;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use agri_core::MessageCode;
use agri_state::{SeasonStatus, TaskStatus};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::error::AppError;
use crate::middleware::metrics::ApiMetrics;
use crate::middleware::rate_limit::RateLimiter;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) and `/metrics` are mounted outside the auth
/// middleware so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let metrics = ApiMetrics::new();
    let limiter = RateLimiter::new(state.config.rate_limit);
    let metrics_on = state.config.metrics_enabled;

    // Auth runs before rate limiting; the limiter keys on the caller.
    let mut api = Router::new()
        .merge(routes::users::router())
        .merge(routes::plots::router())
        .merge(routes::crops::router())
        .merge(routes::seasons::router())
        .merge(routes::tasks::router())
        .merge(routes::expenses::router())
        .merge(openapi::router())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::error_path::error_path_middleware));

    if metrics_on {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(metrics.clone()));
    }

    let api = api
        .layer(TraceLayer::new_for_http())
        .layer(Extension(auth_config))
        .layer(Extension(limiter))
        .with_state(state.clone());

    let mut unauthenticated = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    if metrics_on {
        unauthenticated = unauthenticated
            .route("/metrics", axum::routing::get(prometheus_metrics))
            .layer(Extension(metrics));
    }

    let unauthenticated = unauthenticated.with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

async fn not_found() -> AppError {
    AppError::NotFound(MessageCode::NotFound)
}

/// GET /metrics: Prometheus scrape endpoint.
///
/// Refreshes the domain gauges from the stores, then encodes the registry.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    let seasons = state.seasons.list();
    metrics.seasons_total().reset();
    for status in SeasonStatus::ALL {
        let count = seasons.iter().filter(|s| s.status == status).count();
        metrics
            .seasons_total()
            .with_label_values(&[status.as_str()])
            .set(count as f64);
    }

    let tasks = state.tasks.list();
    metrics.tasks_total().reset();
    for status in TaskStatus::ALL {
        let count = tasks.iter().filter(|t| t.status == status).count();
        metrics
            .tasks_total()
            .with_label_values(&[status.as_str()])
            .set(count as f64);
    }

    metrics.users_total().set(state.users.len() as f64);

    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. Returns 503 when the configured database is unreachable.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    (StatusCode::OK, "ready").into_response()
}
