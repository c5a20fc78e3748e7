use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Evidence that an alert threshold was reached. Fields are kept loose because
/// payloads come straight from the push channel; see [`TriggerEvent::price_value`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    #[serde(default)]
    pub price: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

impl TriggerEvent {
    pub fn new(market: &str, price: f64) -> Self {
        Self {
            price: Value::from(price),
            market: Some(market.to_string()),
            direction: None,
        }
    }

    /// Numbers and numeric strings count; anything else is malformed.
    pub fn price_value(&self) -> Option<f64> {
        let p = match &self.price {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;

        p.is_finite().then_some(p)
    }

    /// Trimmed and uppercased, the same way HTTP paths name markets.
    pub fn market_id(&self) -> Option<String> {
        self.market
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_uppercase)
    }

    /// Lenient parse of a raw push payload.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        serde_json::from_value(payload.clone()).ok()
    }
}

/// A notification the worker displayed but the user has not opened or
/// dismissed yet. The trigger fields live under `data`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveredNotification {
    #[serde(default)]
    pub data: Value,
}

impl DeliveredNotification {
    pub fn trigger_event(&self) -> Option<TriggerEvent> {
        TriggerEvent::from_payload(&self.data)
    }
}
