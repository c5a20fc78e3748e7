use std::{sync::Arc, time::Duration};

use super::price_feed::PriceFeed;

const MAX_ABOVE_PCT: f64 = 100.0;
const MAX_BELOW_PCT: f64 = -50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Validation {
    pub accepted: bool,
    pub current_price: Option<f64>,
}

/// Fat-finger guard for alert prices.
#[derive(Clone)]
pub struct AlertValidator {
    feed: Arc<dyn PriceFeed>,
    wait: Option<Duration>,
}

impl AlertValidator {
    pub fn new(feed: Arc<dyn PriceFeed>, wait: Option<Duration>) -> Self {
        Self { feed, wait }
    }

    pub async fn validate(&self, market: &str, price: f64) -> bool {
        self.check(market, price).await.accepted
    }

    /// Same as [`validate`](Self::validate) but also hands back the market
    /// price it compared against, which the backend wants as `currentPrice`.
    pub async fn check(&self, market: &str, price: f64) -> Validation {
        let current_price = self.current_price(market).await;
        let accepted = price_within_bounds(price, current_price);

        if !accepted {
            tracing::warn!(market, price, ?current_price, "alert price rejected");
        }

        Validation {
            accepted,
            current_price,
        }
    }

    async fn current_price(&self, market: &str) -> Option<f64> {
        let next = self.feed.next_price(market);

        match self.wait {
            Some(limit) => match tokio::time::timeout(limit, next).await {
                Ok(p) => p,
                Err(_) => {
                    tracing::debug!(market, "no price snapshot in time, skipping validation");
                    None
                }
            },
            None => next.await,
        }
    }
}

/// Unknown current price accepts; we cannot validate, so we do not block.
pub fn price_within_bounds(price: f64, current_price: Option<f64>) -> bool {
    if !price.is_finite() || price < 0.0 {
        return false;
    }

    let Some(current) = current_price.filter(|c| *c > 0.0) else {
        return true;
    };

    let deviation = (price / current - 1.0) * 100.0;
    (MAX_BELOW_PCT..=MAX_ABOVE_PCT).contains(&deviation)
}
