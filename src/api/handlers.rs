//! API request handlers
//!
//! Handlers for all REST API endpoints.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::core::{EditOp, GridStore};
use crate::error::{GridError, GridResult};
use crate::parser;
use crate::types::Row;
use crate::writer;

use super::server::AppState;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

//==============================================================================
// Errors
//==============================================================================

/// Everything a session handler can fail with
#[derive(Debug)]
pub enum ApiError {
    SessionNotFound(Uuid),
    Grid(GridError),
    Internal(String),
}

impl From<GridError> for ApiError {
    fn from(err: GridError) -> Self {
        ApiError::Grid(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Grid(GridError::Index { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Grid(
                GridError::Parse { .. } | GridError::Encoding { .. } | GridError::Command(_),
            ) => StatusCode::BAD_REQUEST,
            ApiError::Grid(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::SessionNotFound(id) => format!("Session {} not found", id),
            ApiError::Grid(err) => err.to_string(),
            ApiError::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        warn!(status = status.as_u16(), error = %message, "request rejected");
        (status, Json(ApiResponse::<()>::err(message))).into_response()
    }
}

/// Run `f` against a session's store while holding its lock
fn with_store<T>(
    state: &AppState,
    id: Uuid,
    f: impl FnOnce(&mut GridStore) -> GridResult<T>,
) -> Result<T, ApiError> {
    let store = state
        .sessions
        .get(&id)
        .ok_or(ApiError::SessionNotFound(id))?;
    let mut guard = store
        .lock()
        .map_err(|_| ApiError::Internal(format!("Session {} is unavailable", id)))?;
    Ok(f(&mut *guard)?)
}

//==============================================================================
// Info endpoints
//==============================================================================

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(method: &str, path: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "csvgrid session server".to_string(),
        version: state.version.clone(),
        description: "Upload a CSV, edit it as a grid, download the result".to_string(),
        endpoints: vec![
            endpoint("GET", "/health", "Health check endpoint"),
            endpoint("GET", "/version", "Get server version"),
            endpoint("POST", "/api/v1/sessions", "Upload CSV text, start a session"),
            endpoint("GET", "/api/v1/sessions/:id", "Current header and rows"),
            endpoint("PUT", "/api/v1/sessions/:id/csv", "Replace the session with new CSV"),
            endpoint("PUT", "/api/v1/sessions/:id/cells", "Set one cell"),
            endpoint("POST", "/api/v1/sessions/:id/rows", "Append an empty row"),
            endpoint("DELETE", "/api/v1/sessions/:id/rows/:row", "Remove a row"),
            endpoint("POST", "/api/v1/sessions/:id/edits", "Apply a batch of edits atomically"),
            endpoint("GET", "/api/v1/sessions/:id/export", "Download the session as CSV"),
            endpoint("DELETE", "/api/v1/sessions/:id", "Discard the session"),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
}

/// GET /health - Health check
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        sessions: state.sessions.len(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: vec![
            "set_cell".to_string(),
            "add_row".to_string(),
            "remove_row".to_string(),
            "edits".to_string(),
            "export".to_string(),
        ],
    }))
}

//==============================================================================
// Session endpoints
//==============================================================================

/// Session snapshot returned by every session endpoint
#[derive(Serialize, Deserialize, Debug)]
pub struct SessionView {
    pub session_id: String,
    pub header: Vec<String>,
    pub rows: Vec<Row>,
    pub row_count: usize,
    pub column_count: usize,
}

impl SessionView {
    fn of(id: Uuid, store: &GridStore) -> Self {
        Self {
            session_id: id.to_string(),
            header: store.header().to_vec(),
            rows: store.rows().to_vec(),
            row_count: store.row_count(),
            column_count: store.column_count(),
        }
    }
}

type SessionResult = Result<Json<ApiResponse<SessionView>>, ApiError>;

/// POST /api/v1/sessions - Upload CSV text and start a session
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<SessionView>>), ApiError> {
    let table = parser::parse_bytes(&body)?;
    let store = GridStore::from_table(table);
    let id = state.sessions.create(store.clone());
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(SessionView::of(id, &store))),
    ))
}

/// GET /api/v1/sessions/:id - Current header and rows
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> SessionResult {
    let view = with_store(&state, id, |store| Ok(SessionView::of(id, store)))?;
    Ok(Json(ApiResponse::ok(view)))
}

/// PUT /api/v1/sessions/:id/csv - Replace the session contents with new CSV
pub async fn reload_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> SessionResult {
    let view = with_store(&state, id, |store| {
        store.load_bytes(&body)?;
        Ok(SessionView::of(id, store))
    })?;
    Ok(Json(ApiResponse::ok(view)))
}

/// Set-cell request
#[derive(Deserialize)]
pub struct SetCellRequest {
    pub row: usize,
    pub col: usize,
    pub value: String,
}

/// PUT /api/v1/sessions/:id/cells - Set one cell
pub async fn set_cell(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetCellRequest>,
) -> SessionResult {
    let view = with_store(&state, id, |store| {
        store.set_cell(req.row, req.col, req.value)?;
        Ok(SessionView::of(id, store))
    })?;
    Ok(Json(ApiResponse::ok(view)))
}

/// POST /api/v1/sessions/:id/rows - Append an empty row
pub async fn add_row(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> SessionResult {
    let view = with_store(&state, id, |store| {
        store.add_row();
        Ok(SessionView::of(id, store))
    })?;
    Ok(Json(ApiResponse::ok(view)))
}

/// DELETE /api/v1/sessions/:id/rows/:row - Remove a row
pub async fn remove_row(
    State(state): State<Arc<AppState>>,
    Path((id, row)): Path<(Uuid, usize)>,
) -> SessionResult {
    let view = with_store(&state, id, |store| {
        store.remove_row(row)?;
        Ok(SessionView::of(id, store))
    })?;
    Ok(Json(ApiResponse::ok(view)))
}

/// Batch edit request
#[derive(Deserialize)]
pub struct EditBatchRequest {
    pub edits: Vec<EditOp>,
}

/// POST /api/v1/sessions/:id/edits - Apply a batch of edits, all or nothing
pub async fn apply_edits(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<EditBatchRequest>,
) -> SessionResult {
    let view = with_store(&state, id, |store| {
        store.apply_all(&req.edits)?;
        Ok(SessionView::of(id, store))
    })?;
    Ok(Json(ApiResponse::ok(view)))
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub name: Option<String>,
}

/// Download file name from a user-supplied name, restricted to safe characters
pub fn download_name(requested: Option<&str>) -> String {
    let cleaned: String = requested
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    writer::export_file_name(&cleaned)
}

/// GET /api/v1/sessions/:id/export - Download the session as a CSV file
pub async fn export(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let csv_text = with_store(&state, id, |store| store.export_csv())?;
    let file_name = download_name(query.name.as_deref());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        csv_text,
    )
        .into_response())
}

/// Delete response
#[derive(Serialize)]
pub struct DeleteResponse {
    pub session_id: String,
    pub deleted: bool,
}

/// DELETE /api/v1/sessions/:id - Discard the session
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    if !state.sessions.remove(&id) {
        return Err(ApiError::SessionNotFound(id));
    }
    Ok(Json(ApiResponse::ok(DeleteResponse {
        session_id: id.to_string(),
        deleted: true,
    })))
}
