//! In-process publish/subscribe for alert lifecycle and trigger events.
//!
//! The bus is owned by [`crate::AppState`] and handed to whoever needs it;
//! there is no global instance. Subscribing registers a receiver and dropping
//! the returned [`Subscription`] deregisters it.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};

pub const ALERT_TOPIC: &str = "alert";
pub const NOTICE_TOPIC: &str = "notice";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Value,
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BusMessage>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns how many subscribers saw the message. Zero is not an error.
    pub fn emit(&self, topic: &str, payload: Value) -> usize {
        let msg = BusMessage {
            topic: topic.to_string(),
            payload,
        };
        self.tx.send(msg).unwrap_or(0)
    }

    pub fn subscribe(&self, topic: &str) -> Subscription {
        Subscription {
            topic: Some(topic.to_string()),
            rx: self.tx.subscribe(),
        }
    }

    /// Every topic; used by the SSE stream.
    pub fn subscribe_all(&self) -> Subscription {
        Subscription {
            topic: None,
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

pub struct Subscription {
    topic: Option<String>,
    rx: broadcast::Receiver<BusMessage>,
}

impl Subscription {
    /// Next message on the subscribed topic, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        loop {
            match self.rx.recv().await {
                Ok(msg) => {
                    if self.topic.as_deref().is_none_or(|t| t == msg.topic) {
                        return Some(msg);
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "event bus subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant for draining in tests and handlers.
    pub fn try_recv(&mut self) -> Option<BusMessage> {
        loop {
            match self.rx.try_recv() {
                Ok(msg) => {
                    if self.topic.as_deref().is_none_or(|t| t == msg.topic) {
                        return Some(msg);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
