use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::AppState;

pub async fn health(State(state): State<AppState>) -> Response {
    let body = json!({
        "status": "ok",
        "synced": state.reconciler.gate().is_open(),
        "worker_ready": state.bridge.is_ready(),
        "push_enabled": state.push.enabled(),
    });
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}
