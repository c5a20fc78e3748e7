//! Keeps stored `triggered` flags in line with what the push channel actually
//! delivered.
//!
//! At startup the engine waits for the worker registration, sweeps the
//! notifications that were delivered while nobody was listening, applies them
//! and only then opens the sync gate. Reads go through [`Reconciler::get_alerts`],
//! which waits on the gate. After the gate opens a background task applies live
//! push messages the same way and republishes them on the `alert` topic.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use serde_json::{json, Value};
use tokio::sync::watch;

use crate::{
    error::AlertError,
    events::{EventBus, ALERT_TOPIC},
    models::{Alert, TriggerEvent},
};

use super::{
    push::PushPlatform,
    store::{AlertStore, MarketLocks},
};

/// One-time marker for "initial reconciliation has run".
#[derive(Clone)]
pub struct SyncGate {
    rx: watch::Receiver<bool>,
}

impl SyncGate {
    pub fn is_open(&self) -> bool {
        *self.rx.borrow()
    }

    pub async fn wait(&mut self) {
        // sender is owned by the reconciler, which outlives every gate handle
        let _ = self.rx.wait_for(|open| *open).await;
    }
}

pub struct Reconciler {
    store: Arc<dyn AlertStore>,
    platform: Arc<dyn PushPlatform>,
    bus: EventBus,
    locks: MarketLocks,
    started: AtomicBool,
    gate: watch::Sender<bool>,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn AlertStore>,
        platform: Arc<dyn PushPlatform>,
        bus: EventBus,
        locks: MarketLocks,
    ) -> Self {
        let (gate, _) = watch::channel(false);

        Self {
            store,
            platform,
            bus,
            locks,
            started: AtomicBool::new(false),
            gate,
        }
    }

    pub fn gate(&self) -> SyncGate {
        SyncGate {
            rx: self.gate.subscribe(),
        }
    }

    /// Kicks off the initial sync the first time it is called; later calls
    /// just hand back the same gate.
    pub fn start_initial_sync(self: &Arc<Self>) -> SyncGate {
        let gate = self.gate();

        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return gate;
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.platform.ready().await;

            let recovered: Vec<TriggerEvent> = this
                .platform
                .delivered_notifications()
                .await
                .iter()
                .filter_map(|n| n.trigger_event())
                .collect();

            tracing::info!(count = recovered.len(), "recovered delivered notifications");

            if let Err(e) = this.mark_triggered(&recovered).await {
                tracing::error!(error = %e, "initial reconciliation failed");
            }

            this.gate.send_replace(true);
            tracing::info!("initial alert sync complete");

            this.listen_live().await;
        });

        gate
    }

    async fn listen_live(&self) {
        let Some(mut messages) = self.platform.take_messages().await else {
            tracing::warn!("live push messages already claimed, not listening");
            return;
        };

        while let Some(payload) = messages.recv().await {
            self.apply_live(payload).await;
        }

        tracing::info!("live push channel closed");
    }

    async fn apply_live(&self, payload: Value) {
        let Some(event) = TriggerEvent::from_payload(&payload) else {
            tracing::debug!(%payload, "dropping malformed push message");
            return;
        };

        if let Err(e) = self.mark_triggered(std::slice::from_ref(&event)).await {
            tracing::error!(error = %e, "failed to apply live trigger");
        }

        self.bus.emit(ALERT_TOPIC, json!(event));
    }

    /// Flags the first stored alert whose price equals each event's price.
    /// Returns how many events matched a stored alert.
    pub async fn mark_triggered(&self, events: &[TriggerEvent]) -> Result<usize, AlertError> {
        let mut by_market: BTreeMap<String, Vec<f64>> = BTreeMap::new();

        for event in events {
            match (event.market_id(), event.price_value()) {
                (Some(market), Some(price)) => by_market.entry(market).or_default().push(price),
                _ => tracing::debug!(?event, "dropping malformed trigger event"),
            }
        }

        let mut matched = 0;

        for (market, prices) in by_market {
            let _guard = self.locks.lock(&market).await;

            let mut alerts = self.store.get_alerts(&market).await?;
            matched += apply_triggers(&mut alerts, &prices);
            self.store.save_alerts(&market, &alerts).await?;
        }

        self.locks.prune_idle();

        Ok(matched)
    }

    /// Gated read: starts the initial sync if nobody has yet.
    pub async fn get_alerts(self: &Arc<Self>, market: &str) -> Result<Vec<Alert>, AlertError> {
        let mut gate = self.start_initial_sync();
        gate.wait().await;

        self.store.get_alerts(market).await
    }
}

fn apply_triggers(alerts: &mut [Alert], prices: &[f64]) -> usize {
    let mut matched = 0;

    for price in prices {
        match alerts.iter_mut().find(|a| a.price == *price) {
            Some(alert) => {
                alert.triggered = true;
                matched += 1;
            }
            // the alert may have been removed since the notification went out
            None => tracing::debug!(price, "trigger matched no stored alert"),
        }
    }

    matched
}
