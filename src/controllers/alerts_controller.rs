use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::AppState;

fn bad_price() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Please enter a valid price." })),
    )
        .into_response()
}

fn market_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[derive(Deserialize)]
pub struct CreateAlertBody {
    pub price: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveAlertBody {
    pub price: f64,
    pub new_price: f64,
}

#[derive(Deserialize)]
pub struct RemoveAlertBody {
    pub price: f64,
}

// GET /alerts/:market
pub async fn get_alerts(State(state): State<AppState>, Path(market): Path<String>) -> Response {
    let market = market_id(&market);

    match state.reconciler.get_alerts(&market).await {
        Ok(alerts) => (StatusCode::OK, Json(alerts)).into_response(),
        Err(e) => e.into_response(),
    }
}

// POST /alerts/:market
pub async fn post_create_alert(
    State(state): State<AppState>,
    Path(market): Path<String>,
    Json(body): Json<CreateAlertBody>,
) -> Response {
    if !body.price.is_finite() {
        return bad_price();
    }

    match state.lifecycle.create(&market_id(&market), body.price).await {
        Ok(update) => (StatusCode::OK, Json(update)).into_response(),
        Err(e) => e.into_response(),
    }
}

// POST /alerts/:market/move
pub async fn post_move_alert(
    State(state): State<AppState>,
    Path(market): Path<String>,
    Json(body): Json<MoveAlertBody>,
) -> Response {
    if !body.price.is_finite() || !body.new_price.is_finite() {
        return bad_price();
    }

    match state
        .lifecycle
        .move_alert(&market_id(&market), body.price, body.new_price)
        .await
    {
        Ok(update) => (StatusCode::OK, Json(update)).into_response(),
        Err(e) => e.into_response(),
    }
}

// POST /alerts/:market/remove
pub async fn post_remove_alert(
    State(state): State<AppState>,
    Path(market): Path<String>,
    Json(body): Json<RemoveAlertBody>,
) -> Response {
    match state.lifecycle.remove(&market_id(&market), body.price).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => e.into_response(),
    }
}
