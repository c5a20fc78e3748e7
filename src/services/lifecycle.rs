use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::{
    error::AlertError,
    events::{EventBus, ALERT_TOPIC},
    models::{Alert, AlertUpdate, PushSubscription},
};

use super::{
    notices::{Notice, Notices},
    push::PushChannel,
    registration::{AlertBackend, RegisterOptions},
    store::{AlertStore, MarketLocks},
    validator::AlertValidator,
};

const PUSH_HELP: &str = "Allow notifications for this site to receive price alerts.";

// alert status sent to the backend on create and remove
const STATUS_ACTIVE: &str = "active";
const STATUS_REMOVED: &str = "removed";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoveOutcome {
    pub removed: Option<Alert>,
    pub remote_error: Option<String>,
}

/// Create, move and remove alerts.
///
/// Each operation does its remote phase (subscription, validation, backend
/// call) without holding the market lock, then applies the result to the
/// stored list under the lock in one load/mutate/save pass.
pub struct AlertLifecycle {
    store: Arc<dyn AlertStore>,
    push: Arc<PushChannel>,
    validator: AlertValidator,
    backend: Arc<dyn AlertBackend>,
    bus: EventBus,
    notices: Notices,
    locks: MarketLocks,
}

impl AlertLifecycle {
    pub fn new(
        store: Arc<dyn AlertStore>,
        push: Arc<PushChannel>,
        validator: AlertValidator,
        backend: Arc<dyn AlertBackend>,
        bus: EventBus,
        notices: Notices,
        locks: MarketLocks,
    ) -> Self {
        Self {
            store,
            push,
            validator,
            backend,
            bus,
            notices,
            locks,
        }
    }

    async fn subscription(&self) -> (Option<PushSubscription>, Option<String>) {
        match self.push.get_subscription().await {
            Ok(sub) => (sub, None),
            Err(e) => {
                tracing::warn!(error = %e, "push subscription unavailable");
                self.notices
                    .show_notice(Notice::error(PUSH_HELP).with_id("push-permission"));
                (None, Some(e.to_string()))
            }
        }
    }

    pub async fn create(&self, market: &str, price: f64) -> Result<AlertUpdate, AlertError> {
        let tentative = Alert::new(market, price);

        let (subscription, mut remote_error) = self.subscription().await;

        let check = self.validator.check(market, price).await;
        if !check.accepted {
            return Err(AlertError::Rejected {
                market: market.to_string(),
                price,
            });
        }

        let mut settled = tentative.clone();

        if let Some(sub) = subscription {
            let options = RegisterOptions {
                current_price: check.current_price,
                status: Some(STATUS_ACTIVE.to_string()),
                ..Default::default()
            };
            let res = self.backend.register(&sub, market, price, options).await;

            settled.active = res.is_ok();
            if let Some(err) = res.error {
                self.notices
                    .show_notice(Notice::error(format!("Could not register alert: {err}")));
                remote_error = Some(err);
            }
        }

        {
            let _guard = self.locks.lock(market).await;
            let mut alerts = self.store.get_alerts(market).await?;
            alerts.push(settled.clone());
            self.store.save_alerts(market, &alerts).await?;
        }

        self.bus.emit(
            ALERT_TOPIC,
            json!({ "price": price, "market": market, "timestamp": settled.timestamp, "add": true }),
        );

        tracing::info!(market, price, active = settled.active, "alert created");

        Ok(AlertUpdate {
            tentative,
            settled,
            remote_error,
        })
    }

    pub async fn move_alert(
        &self,
        market: &str,
        price: f64,
        new_price: f64,
    ) -> Result<AlertUpdate, AlertError> {
        let existing = self
            .store
            .get_alerts(market)
            .await?
            .into_iter()
            .find(|a| a.price == price)
            .ok_or_else(|| AlertError::NotFound {
                market: market.to_string(),
                price,
            })?;

        if existing.triggered {
            return Err(AlertError::AlreadyTriggered {
                market: market.to_string(),
                price,
            });
        }

        let tentative = Alert {
            price: new_price,
            active: false,
            triggered: false,
            ..existing
        };

        let (subscription, mut remote_error) = self.subscription().await;

        let check = self.validator.check(market, new_price).await;
        if !check.accepted {
            return Err(AlertError::Rejected {
                market: market.to_string(),
                price: new_price,
            });
        }

        let mut active = false;

        if let Some(sub) = subscription {
            let options = RegisterOptions {
                current_price: check.current_price,
                new_price: Some(new_price),
                ..Default::default()
            };
            let res = self.backend.register(&sub, market, price, options).await;

            active = res.is_ok();
            if let Some(err) = res.error {
                remote_error = Some(err);
            }
        }

        let settled = {
            let _guard = self.locks.lock(market).await;
            let mut alerts = self.store.get_alerts(market).await?;

            let Some(alert) = alerts.iter_mut().find(|a| a.price == price) else {
                return Err(AlertError::NotFound {
                    market: market.to_string(),
                    price,
                });
            };

            // listeners get the old price alongside the target
            self.bus.emit(
                ALERT_TOPIC,
                json!({ "price": price, "market": market, "newPrice": new_price }),
            );

            alert.active = active;
            alert.triggered = false;
            alert.price = new_price;
            let settled = alert.clone();

            self.store.save_alerts(market, &alerts).await?;
            settled
        };

        tracing::info!(market, price, new_price, active, "alert moved");

        Ok(AlertUpdate {
            tentative,
            settled,
            remote_error,
        })
    }

    pub async fn remove(&self, market: &str, price: f64) -> Result<RemoveOutcome, AlertError> {
        let existing = self
            .store
            .get_alerts(market)
            .await?
            .into_iter()
            .find(|a| a.price == price);

        let mut remote_error = None;

        if let Some(alert) = existing.as_ref().filter(|a| !a.triggered) {
            let subscription = self.push.get_subscription().await.ok().flatten();

            if let Some(sub) = subscription {
                let options = RegisterOptions {
                    unsubscribe: Some(true),
                    status: Some(STATUS_REMOVED.to_string()),
                    ..Default::default()
                };
                let res = self.backend.register(&sub, market, price, options).await;

                if let Some(err) = res.error {
                    if alert.active {
                        self.notices
                            .show_notice(Notice::error(format!("Could not cancel alert: {err}")));
                    }
                    remote_error = Some(err);
                }
            }
        }

        self.bus.emit(
            ALERT_TOPIC,
            json!({ "price": price, "market": market, "remove": true }),
        );

        {
            let _guard = self.locks.lock(market).await;
            let mut alerts = self.store.get_alerts(market).await?;
            alerts.retain(|a| a.price != price);
            self.store.save_alerts(market, &alerts).await?;
        }
        self.locks.prune_idle();

        tracing::info!(market, price, "alert removed");

        Ok(RemoveOutcome {
            removed: existing,
            remote_error,
        })
    }
}
