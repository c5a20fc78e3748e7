use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert store error: {0}")]
    Store(String),

    #[error("price {price} for {market} is too far from the market price")]
    Rejected { market: String, price: f64 },

    #[error("no alert at {price} for {market}")]
    NotFound { market: String, price: f64 },

    #[error("alert at {price} for {market} has already triggered")]
    AlreadyTriggered { market: String, price: f64 },

    #[error("push channel error: {0}")]
    Push(String),
}

impl AlertError {
    pub fn status(&self) -> StatusCode {
        match self {
            AlertError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AlertError::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AlertError::NotFound { .. } => StatusCode::NOT_FOUND,
            AlertError::AlreadyTriggered { .. } => StatusCode::CONFLICT,
            AlertError::Push(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AlertError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
