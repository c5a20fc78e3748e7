use axum::{Router, routing::{get, post}};
use crate::{AppState, controllers::alerts_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/alerts/:market",
            get(alerts_controller::get_alerts).post(alerts_controller::post_create_alert),
        )
        .route("/alerts/:market/move", post(alerts_controller::post_move_alert))
        .route("/alerts/:market/remove", post(alerts_controller::post_remove_alert))
}
