//! End-to-end tests over the assembled router.
//!
//! Each test builds a fresh in-memory [`AppState`] and drives [`app`] with
//! `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use agri_api::config::AppConfig;
use agri_api::mail::LogMailer;
use agri_api::state::AppState;
use agri_api::app;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "test-secret";

fn open_app() -> (Router, AppState) {
    let state = AppState::new();
    (app(state.clone()), state)
}

fn secured_app() -> (Router, AppState) {
    let config = AppConfig {
        auth_token: Some(SECRET.to_string()),
        ..AppConfig::default()
    };
    let state = AppState::with_config(config, None, Arc::new(LogMailer::new()));
    (app(state.clone()), state)
}

fn farmer_token(user_id: &str) -> String {
    format!("Bearer farmer:{user_id}:{SECRET}")
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = auth {
        builder = builder.header("Authorization", value);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, json)
}

async fn raw(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Create a plot and a crop, returning their ids.
async fn plot_and_crop(app: &Router, auth: Option<&str>, admin: Option<&str>) -> (String, String) {
    let (status, plot) = send(
        app,
        "POST",
        "/v1/plots",
        auth,
        Some(json!({ "plot_name": "River field", "area_m2": 2500 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{plot}");
    let (status, crop) = send(app, "POST", "/v1/crops", admin, Some(json!({ "name": "Rice" }))).await;
    assert_eq!(status, StatusCode::OK, "{crop}");
    (
        plot["result"]["id"].as_str().unwrap().to_string(),
        crop["result"]["id"].as_str().unwrap().to_string(),
    )
}

async fn create_season(app: &Router, auth: Option<&str>, body: Value) -> (StatusCode, Value) {
    send(app, "POST", "/v1/seasons", auth, Some(body)).await
}

// ── Health and infrastructure ────────────────────────────────────────

#[tokio::test]
async fn health_probes_need_no_credentials() {
    let (app, _) = secured_app();
    assert_eq!(raw(&app, "/health/liveness").await, (StatusCode::OK, "ok".to_string()));
    assert_eq!(raw(&app, "/health/readiness").await, (StatusCode::OK, "ready".to_string()));
}

#[tokio::test]
async fn metrics_expose_domain_gauges() {
    let (app, _) = open_app();
    let (plot_id, crop_id) = plot_and_crop(&app, None, None).await;
    create_season(&app, None, json!({ "plot_id": plot_id, "crop_id": crop_id })).await;

    let (status, body) = raw(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("agri_seasons_total{status=\"PLANNED\"} 1"), "{body}");
    assert!(body.contains("agri_seasons_total{status=\"ARCHIVED\"} 0"));
    assert!(body.contains("agri_tasks_total"));
    assert!(body.contains("agri_http_requests_total"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (app, _) = open_app();
    let (status, doc) = send(&app, "GET", "/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "Agri Stack API");
    assert!(doc["paths"]["/v1/seasons"].is_object());
}

#[tokio::test]
async fn unknown_route_is_not_found_envelope() {
    let (app, _) = open_app();
    let (status, body) = send(&app, "GET", "/v1/nothing-here", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "MSG10");
    assert_eq!(body["path"], "/v1/nothing-here");
}

// ── Seasons ──────────────────────────────────────────────────────────

#[tokio::test]
async fn season_create_applies_defaults() {
    let (app, _) = open_app();
    let (plot_id, crop_id) = plot_and_crop(&app, None, None).await;

    let (status, body) = create_season(
        &app,
        None,
        json!({
            "plot_id": plot_id,
            "crop_id": crop_id,
            "season_name": null,
            "start_date": "2025-04-10",
            "expected_yield_kg": null,
            "initial_plant_count": 50
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["code"], "SUCCESS");
    assert_eq!(body["message"], "Saved successfully.");

    let season = &body["result"];
    assert_eq!(season["season_name"], "Season Q2 2025");
    assert_eq!(season["status"], "PLANNED");
    assert_eq!(season["initial_plant_count"], 50);
    assert_eq!(season["current_plant_count"], 50);
    assert!(season["expected_yield_kg"].is_null());

    let id = season["id"].as_str().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/v1/seasons/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["result"]["plot_id"], plot_id.as_str());
}

#[tokio::test]
async fn overlapping_season_is_rejected() {
    let (app, _) = open_app();
    let (plot_id, crop_id) = plot_and_crop(&app, None, None).await;

    let (status, _) = create_season(
        &app,
        None,
        json!({
            "plot_id": plot_id, "crop_id": crop_id,
            "start_date": "2025-04-01", "planned_harvest_date": "2025-06-30"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = create_season(
        &app,
        None,
        json!({
            "plot_id": plot_id, "crop_id": crop_id, "season_name": "Second crop",
            "start_date": "2025-06-01", "planned_harvest_date": "2025-08-30"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SEASON_DATE_OVERLAP");
    assert_eq!(body["path"], "/v1/seasons");
}

#[tokio::test]
async fn missing_fields_report_each_field() {
    let (app, _) = open_app();
    let (status, body) = create_season(&app, None, json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "MSG1");
    assert!(body["field_errors"]["plot_id"].is_string());
    assert!(body["field_errors"]["crop_id"].is_string());
}

#[tokio::test]
async fn malformed_json_is_invalid_format() {
    let (app, _) = open_app();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/seasons")
                .header("Content-Type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "MSG4");
    assert_eq!(body["path"], "/v1/seasons");
}

#[tokio::test]
async fn season_lifecycle_and_invalid_transition() {
    let (app, _) = open_app();
    let (plot_id, crop_id) = plot_and_crop(&app, None, None).await;
    let (_, body) = create_season(
        &app,
        None,
        json!({ "plot_id": plot_id, "crop_id": crop_id, "start_date": "2025-01-05" }),
    )
    .await;
    let id = body["result"]["id"].as_str().unwrap().to_string();
    let status_uri = format!("/v1/seasons/{id}/status");

    let (status, body) = send(&app, "POST", &status_uri, None, Some(json!({ "status": "COMPLETED" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATUS_TRANSITION");

    let (status, _) = send(&app, "POST", &status_uri, None, Some(json!({ "status": "ACTIVE" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(
        &app,
        "POST",
        &status_uri,
        None,
        Some(json!({ "status": "COMPLETED", "actual_yield_kg": "1250.5" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["result"]["status"], "COMPLETED");
    assert_eq!(body["result"]["actual_yield_kg"], "1250.5");
    assert!(body["result"]["end_date"].is_string());

    let (status, list) = send(&app, "GET", "/v1/seasons?status=completed", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["result"]["total_elements"], 1);
    assert_eq!(list["result"]["items"][0]["id"], id.as_str());
}

// ── Tasks and expenses ───────────────────────────────────────────────

#[tokio::test]
async fn tasks_follow_their_status_policy() {
    let (app, _) = open_app();
    let (status, body) = send(
        &app,
        "POST",
        "/v1/tasks",
        None,
        Some(json!({ "title": "  Irrigate  ", "due_date": "2025-05-02" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["result"]["title"], "Irrigate");
    assert_eq!(body["result"]["status"], "PENDING");
    let id = body["result"]["id"].as_str().unwrap().to_string();

    let status_uri = format!("/v1/tasks/{id}/status");
    let (status, _) = send(&app, "POST", &status_uri, None, Some(json!({ "status": "DONE" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, "POST", &status_uri, None, Some(json!({ "status": "PENDING" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATUS_TRANSITION");

    let (status, _) = send(&app, "DELETE", &format!("/v1/tasks/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, "GET", &format!("/v1/tasks/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TASK_NOT_FOUND");
}

#[tokio::test]
async fn expenses_roll_up_into_summary() {
    let (app, _) = open_app();
    let (plot_id, crop_id) = plot_and_crop(&app, None, None).await;
    let (_, body) = create_season(
        &app,
        None,
        json!({ "plot_id": plot_id, "crop_id": crop_id, "start_date": "2025-03-01" }),
    )
    .await;
    let season_id = body["result"]["id"].as_str().unwrap().to_string();

    for (item, price, qty) in [("Seedlings", 3, 200), ("Fertiliser", 150, 2)] {
        let (status, body) = send(
            &app,
            "POST",
            "/v1/expenses",
            None,
            Some(json!({
                "season_id": season_id, "item_name": item,
                "unit_price": price, "quantity": qty, "expense_date": "2025-03-10"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (status, body) = send(
        &app,
        "GET",
        &format!("/v1/seasons/{season_id}/expense-summary"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["expense_count"], 2);
    assert_eq!(body["result"]["total_cost"], "900");

    let (status, body) = send(
        &app,
        "POST",
        "/v1/expenses",
        None,
        Some(json!({
            "season_id": season_id, "item_name": "Early",
            "unit_price": 1, "quantity": 1, "expense_date": "2025-02-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["field_errors"]["expense_date"].is_string());
}

#[tokio::test]
async fn amounts_outside_column_precision_are_rejected() {
    let (app, _) = open_app();
    for area in ["12.345", "1000000000000"] {
        let (status, body) = send(
            &app,
            "POST",
            "/v1/plots",
            None,
            Some(json!({ "plot_name": "Terrace", "area_m2": area })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
        assert_eq!(body["code"], "MSG4");
        assert!(body["field_errors"]["area_m2"].is_string());
    }

    let (plot_id, crop_id) = plot_and_crop(&app, None, None).await;
    for yield_kg in ["0.125", "1000000000000"] {
        let (status, body) = create_season(
            &app,
            None,
            json!({
                "plot_id": plot_id, "crop_id": crop_id,
                "start_date": "2025-03-01", "expected_yield_kg": yield_kg
            }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
        assert_eq!(body["code"], "MSG4");
        assert!(body["field_errors"]["expected_yield_kg"].is_string());
    }

    let (_, body) = create_season(
        &app,
        None,
        json!({ "plot_id": plot_id, "crop_id": crop_id, "start_date": "2025-03-01" }),
    )
    .await;
    let season_id = body["result"]["id"].as_str().unwrap().to_string();

    for (price, qty) in [("1.005", 1), ("50000000000000000000000000000", 1), ("999999999999.99", 1000)] {
        let (status, body) = send(
            &app,
            "POST",
            "/v1/expenses",
            None,
            Some(json!({
                "season_id": season_id, "item_name": "Diesel",
                "unit_price": price, "quantity": qty, "expense_date": "2025-03-10"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
        assert_eq!(body["code"], "MSG4");
        assert!(body["field_errors"]["unit_price"].is_string());
    }

    // Two expenses at the largest storable total still sum.
    for _ in 0..2 {
        let (status, body) = send(
            &app,
            "POST",
            "/v1/expenses",
            None,
            Some(json!({
                "season_id": season_id, "item_name": "Harvester",
                "unit_price": "999999999999.99", "quantity": 99, "expense_date": "2025-03-10"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }
    let (status, body) = send(
        &app,
        "GET",
        &format!("/v1/seasons/{season_id}/expense-summary"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["result"]["expense_count"], 2);
}

// ── Authentication and roles ─────────────────────────────────────────

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let (app, _) = secured_app();
    let (status, body) = send(&app, "GET", "/v1/seasons", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["path"], "/v1/seasons");
}

#[tokio::test]
async fn farmers_are_scoped_and_cannot_manage_catalog() {
    let (app, _) = secured_app();
    let admin = format!("Bearer {SECRET}");

    let (status, body) = send(
        &app,
        "POST",
        "/v1/users",
        Some(&admin),
        Some(json!({ "username": "lan", "full_name": "Nguyen Lan" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["result"]["role"], "FARMER");
    let farmer_id = body["result"]["id"].as_str().unwrap().to_string();
    let farmer = farmer_token(&farmer_id);

    let (status, me) = send(&app, "GET", "/v1/users/me", Some(&farmer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["result"]["username"], "lan");

    let (status, _) = send(&app, "POST", "/v1/crops", Some(&farmer), Some(json!({ "name": "Corn" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The farmer cannot see a season on the administrator's plot.
    let (plot_id, crop_id) = plot_and_crop(&app, Some(&admin), Some(&admin)).await;
    let (_, body) = create_season(&app, Some(&admin), json!({ "plot_id": plot_id, "crop_id": crop_id })).await;
    let season_id = body["result"]["id"].as_str().unwrap();
    let (status, body) = send(&app, "GET", &format!("/v1/seasons/{season_id}"), Some(&farmer), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "SEASON_NOT_FOUND");

    // Wrong role in the token for the stored account.
    let (status, _) = send(
        &app,
        "GET",
        "/v1/users/me",
        Some(&format!("Bearer admin:{farmer_id}:{SECRET}")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inactive_account_is_refused() {
    let (app, _) = secured_app();
    let admin = format!("Bearer {SECRET}");
    let (_, body) = send(
        &app,
        "POST",
        "/v1/users",
        Some(&admin),
        Some(json!({ "username": "binh", "full_name": "Tran Binh" })),
    )
    .await;
    let id = body["result"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/v1/users/{id}/status"),
        Some(&admin),
        Some(json!({ "status": "INACTIVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = send(&app, "GET", "/v1/users/me", Some(&farmer_token(&id)), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ACCOUNT_INACTIVE");
    assert_eq!(body["message"], "Your account is inactive. Access denied.");
}
