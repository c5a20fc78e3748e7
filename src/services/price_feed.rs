use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, broadcast::error::RecvError, mpsc};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
}

/// `{ "<market>": { "price": .. } }`
pub type PriceSnapshot = HashMap<String, PriceLevel>;

#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Resolves with the market's price from the next snapshot that carries
    /// it. Never resolves for a market nobody publishes.
    async fn next_price(&self, market: &str) -> Option<f64>;
}

/// Fan-out of price snapshots to one-shot waiters. Publishers push snapshots
/// in; `interest` tells an upstream source which markets someone is waiting
/// on so it can subscribe to them.
#[derive(Clone)]
pub struct PriceFeedHub {
    tx: broadcast::Sender<Arc<PriceSnapshot>>,
    interest: Option<mpsc::UnboundedSender<String>>,
}

impl PriceFeedHub {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(64);
        Self { tx, interest: None }
    }

    /// Hub plus the receiving end of the interest channel for an upstream source.
    pub fn with_interest() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (itx, irx) = mpsc::unbounded_channel();
        let mut hub = Self::new();
        hub.interest = Some(itx);
        (hub, irx)
    }

    pub fn publish(&self, snapshot: PriceSnapshot) -> usize {
        let snapshot: PriceSnapshot = snapshot
            .into_iter()
            .filter(|(_, level)| level.price.is_finite())
            .collect();

        if snapshot.is_empty() {
            return 0;
        }

        self.tx.send(Arc::new(snapshot)).unwrap_or(0)
    }

    pub fn waiting(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for PriceFeedHub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceFeed for PriceFeedHub {
    async fn next_price(&self, market: &str) -> Option<f64> {
        let mut rx = self.tx.subscribe();

        if let Some(interest) = &self.interest {
            let _ = interest.send(market.to_string());
        }

        loop {
            match rx.recv().await {
                Ok(snapshot) => {
                    if let Some(level) = snapshot.get(market) {
                        return Some(level.price);
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
