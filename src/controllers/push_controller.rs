use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    models::{DeliveredNotification, PushSubscription},
    services::price_feed::PriceSnapshot,
    AppState,
};

#[derive(Deserialize)]
pub struct RegisterBody {
    #[serde(default)]
    pub subscription: Option<PushSubscription>,
}

// GET /push/config
pub async fn get_push_config(State(state): State<AppState>) -> Response {
    let body = json!({
        "enabled": state.settings.push_enabled(),
        "applicationServerKey": state.settings.push_public_key,
        "userVisibleOnly": true,
    });
    (StatusCode::OK, Json(body)).into_response()
}

// POST /push/register
pub async fn post_register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Response {
    state.bridge.register(body.subscription).await;
    (StatusCode::NO_CONTENT, ()).into_response()
}

// POST /push/notifications
// Notifications still on screen, reported by the worker when the page wakes up.
pub async fn post_notifications(
    State(state): State<AppState>,
    Json(items): Json<Vec<Value>>,
) -> Response {
    let notifications: Vec<DeliveredNotification> = items
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();

    let count = state.bridge.report_delivered(notifications).await;

    (StatusCode::OK, Json(json!({ "accepted": count }))).into_response()
}

// POST /push/messages
pub async fn post_message(State(state): State<AppState>, Json(message): Json<Value>) -> Response {
    if !state.bridge.deliver(message) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "push listener is gone" })),
        )
            .into_response();
    }

    (StatusCode::ACCEPTED, ()).into_response()
}

// POST /prices
pub async fn post_prices(
    State(state): State<AppState>,
    Json(snapshot): Json<PriceSnapshot>,
) -> Response {
    let delivered = state.prices.publish(snapshot);
    (StatusCode::OK, Json(json!({ "delivered": delivered }))).into_response()
}
