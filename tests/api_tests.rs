//! API integration tests
//!
//! Requests go through the real router in-process via `tower::ServiceExt`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use csvgrid::api::handlers::ApiResponse;
use csvgrid::api::server::{build_router, ApiConfig, AppState};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new());
    (build_router(&ApiConfig::default(), state.clone()), state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Body, json_body: bool) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if json_body {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, Body::from(body.to_string()), true).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn send_empty(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, Body::empty(), false).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Upload CSV text and return the new session id
async fn upload(app: &Router, csv: &str) -> String {
    let (status, bytes) = send(
        app,
        Method::POST,
        "/api/v1/sessions",
        Body::from(csv.to_string()),
        false,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    body["data"]["session_id"].as_str().unwrap().to_string()
}

// ═══════════════════════════════════════════════════════════════════════════
// INFO ENDPOINTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_health() {
    let (app, _) = app();
    let (status, body) = send_empty(&app, Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["sessions"], 0);
}

#[tokio::test]
async fn test_version() {
    let (app, _) = app();
    let (status, body) = send_empty(&app, Method::GET, "/version").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let (app, _) = app();
    let (_, body) = send_empty(&app, Method::GET, "/").await;
    let endpoints = body["data"]["endpoints"].as_array().unwrap();
    assert!(endpoints
        .iter()
        .any(|e| e["path"] == "/api/v1/sessions/:id/export"));
}

// ═══════════════════════════════════════════════════════════════════════════
// SESSION LIFECYCLE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_upload_creates_session() {
    let (app, state) = app();
    let id = upload(&app, "name,age\nAlice,30\nBob,25\n").await;
    assert_eq!(state.sessions.len(), 1);

    let (status, body) = send_empty(&app, Method::GET, &format!("/api/v1/sessions/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["header"], json!(["name", "age"]));
    assert_eq!(body["data"]["rows"], json!([["Alice", "30"], ["Bob", "25"]]));
    assert_eq!(body["data"]["row_count"], 2);
    assert_eq!(body["data"]["column_count"], 2);
}

#[tokio::test]
async fn test_upload_normalizes_ragged_rows() {
    let (app, _) = app();
    let (_, bytes) = send(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Body::from("a,b,c\n1\n1,2,3,4\n"),
        false,
    )
    .await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"]["rows"], json!([["1", "", ""], ["1", "2", "3"]]));
}

#[tokio::test]
async fn test_upload_malformed_is_bad_request() {
    let (app, state) = app();
    let (status, bytes) = send(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Body::from("a\n\"open\n"),
        false,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("line 2"));
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let (app, _) = app();
    let uri = format!("/api/v1/sessions/{}", uuid::Uuid::new_v4());
    let (status, body) = send_empty(&app, Method::GET, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_delete_session() {
    let (app, state) = app();
    let id = upload(&app, "a\n1\n").await;
    let uri = format!("/api/v1/sessions/{id}");

    let (status, body) = send_empty(&app, Method::DELETE, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], true);
    assert!(state.sessions.is_empty());

    let (status, _) = send_empty(&app, Method::DELETE, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_over_limit_is_payload_too_large() {
    let config = ApiConfig {
        max_upload_bytes: 64,
        ..ApiConfig::default()
    };
    let state = Arc::new(AppState::from_config(&config));
    let app = build_router(&config, state.clone());

    let body = format!("name\n{}\n", "x".repeat(200));
    let (status, _) = send(&app, Method::POST, "/api/v1/sessions", Body::from(body), false).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(state.sessions.is_empty());

    // A small upload still goes through
    upload(&app, "name\nAlice\n").await;
    assert_eq!(state.sessions.len(), 1);
}

#[tokio::test]
async fn test_abandoned_sessions_are_bounded() {
    let config = ApiConfig {
        max_sessions: 5,
        session_ttl: Duration::from_secs(3600),
        ..ApiConfig::default()
    };
    let state = Arc::new(AppState::from_config(&config));
    let app = build_router(&config, state.clone());

    let mut ids = Vec::new();
    for _ in 0..50 {
        ids.push(upload(&app, "a\n1\n").await);
    }
    assert_eq!(state.sessions.len(), 5);

    // The oldest upload was evicted, the newest is still served
    let (status, _) = send_empty(&app, Method::GET, &format!("/api/v1/sessions/{}", ids[0])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send_empty(&app, Method::GET, &format!("/api/v1/sessions/{}", ids[49])).await;
    assert_eq!(status, StatusCode::OK);
}

// ═══════════════════════════════════════════════════════════════════════════
// EDITS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_edit_walkthrough_and_export() {
    let (app, _) = app();
    let id = upload(&app, "name,age\nAlice,30\nBob,25\n").await;
    let base = format!("/api/v1/sessions/{id}");

    let (status, body) = send_json(
        &app,
        Method::PUT,
        &format!("{base}/cells"),
        json!({"row": 1, "col": 1, "value": "26"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rows"][1], json!(["Bob", "26"]));

    let (status, body) = send_empty(&app, Method::POST, &format!("{base}/rows")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rows"][2], json!(["", ""]));

    let (status, body) = send_empty(&app, Method::DELETE, &format!("{base}/rows/0")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["row_count"], 2);

    let request = Request::builder()
        .uri(format!("{base}/export"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"edited.csv\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"name,age\nBob,26\n,\n");
}

#[tokio::test]
async fn test_export_custom_name() {
    let (app, _) = app();
    let id = upload(&app, "a\n1\n").await;
    let request = Request::builder()
        .uri(format!("/api/v1/sessions/{id}/export?name=report"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"report.csv\""
    );
}

#[tokio::test]
async fn test_set_cell_out_of_range_is_unprocessable() {
    let (app, _) = app();
    let id = upload(&app, "name,age\nAlice,30\n").await;

    let (status, body) = send_json(
        &app,
        Method::PUT,
        &format!("/api/v1/sessions/{id}/cells"),
        json!({"row": 1, "col": 0, "value": "x"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("out of range"));

    let (_, body) = send_empty(&app, Method::GET, &format!("/api/v1/sessions/{id}")).await;
    assert_eq!(body["data"]["rows"], json!([["Alice", "30"]]));
}

#[tokio::test]
async fn test_negative_index_is_unprocessable() {
    let (app, _) = app();
    let id = upload(&app, "name\nAlice\n").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/sessions/{id}/cells"),
        Body::from(r#"{"row": -1, "col": 0, "value": "x"}"#),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_remove_row_out_of_range() {
    let (app, _) = app();
    let id = upload(&app, "name\nAlice\n").await;
    let (status, _) =
        send_empty(&app, Method::DELETE, &format!("/api/v1/sessions/{id}/rows/1")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_batch_edits_are_atomic() {
    let (app, _) = app();
    let id = upload(&app, "name,age\nAlice,30\n").await;
    let uri = format!("/api/v1/sessions/{id}/edits");

    let (status, _) = send_json(
        &app,
        Method::POST,
        &uri,
        json!({"edits": [
            {"op": "add_row"},
            {"op": "set_cell", "row": 1, "col": 0, "value": "Bob"},
            {"op": "remove_row", "row": 7}
        ]}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = send_empty(&app, Method::GET, &format!("/api/v1/sessions/{id}")).await;
    assert_eq!(body["data"]["row_count"], 1);

    let (status, body) = send_json(
        &app,
        Method::POST,
        &uri,
        json!({"edits": [
            {"op": "add_row"},
            {"op": "set_cell", "row": 1, "col": 0, "value": "Bob"}
        ]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rows"], json!([["Alice", "30"], ["Bob", ""]]));
}

#[tokio::test]
async fn test_reload_failure_keeps_session() {
    let (app, _) = app();
    let id = upload(&app, "name\nAlice\n").await;
    let uri = format!("/api/v1/sessions/{id}/csv");

    let (status, _) = send(&app, Method::PUT, &uri, Body::from("x\n\"bad\"!\n"), false).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send_empty(&app, Method::GET, &format!("/api/v1/sessions/{id}")).await;
    assert_eq!(body["data"]["header"], json!(["name"]));

    let (status, body) = send(&app, Method::PUT, &uri, Body::from("x,y\n1,2\n"), false).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["data"]["header"], json!(["x", "y"]));
}

// ═══════════════════════════════════════════════════════════════════════════
// RESPONSE ENVELOPE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_api_response_unique_ids() {
    let r1: ApiResponse<i32> = ApiResponse::ok(1);
    let r2: ApiResponse<i32> = ApiResponse::ok(2);
    assert_ne!(r1.request_id, r2.request_id);
}
