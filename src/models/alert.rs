use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub market: String,
    pub price: f64,

    // epoch millis
    pub timestamp: i64,

    // registered with the remote backend
    #[serde(default)]
    pub active: bool,

    // fired and acknowledged; only reconciliation sets this
    #[serde(default)]
    pub triggered: bool,
}

impl Alert {
    pub fn new(market: &str, price: f64) -> Self {
        Self {
            market: market.to_string(),
            price,
            timestamp: Utc::now().timestamp_millis(),
            active: false,
            triggered: false,
        }
    }
}

/// Both phases of an optimistic mutation: the record as it looked before the
/// remote call resolved, and the record that was persisted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertUpdate {
    pub tentative: Alert,
    pub settled: Alert,
    pub remote_error: Option<String>,
}
