use axum::{Router, routing::{get, post}};
use crate::{AppState, controllers::push_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/push/config", get(push_controller::get_push_config))
        .route("/push/register", post(push_controller::post_register))
        .route("/push/notifications", post(push_controller::post_notifications))
        .route("/push/messages", post(push_controller::post_message))
        .route("/prices", post(push_controller::post_prices))
}
