//! Library entrypoint for alertsync.
//!
//! Price alerts kept in sync with a push-notification channel: the lifecycle
//! facade creates, moves and removes alerts against the alerting backend, and
//! the reconciler flips `triggered` flags from whatever the push channel
//! delivered. Integration tests under `tests/` build the state from here.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod events;
pub mod models;

pub mod services;

pub mod controllers;
pub mod routes;

use services::{
    lifecycle::AlertLifecycle,
    notices::Notices,
    price_feed::{PriceFeed, PriceFeedHub},
    push::{PushChannel, WorkerBridge},
    reconciliation::Reconciler,
    registration::{AlertBackend, RegistrationClient},
    store::{AlertStore, MarketLocks},
    validator::AlertValidator,
};

#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub bus: events::EventBus,
    pub store: Arc<dyn AlertStore>,
    pub bridge: Arc<WorkerBridge>,
    pub prices: PriceFeedHub,
    pub push: Arc<PushChannel>,
    pub reconciler: Arc<Reconciler>,
    pub lifecycle: Arc<AlertLifecycle>,
}

impl AppState {
    /// Wires everything up with the HTTP registration client.
    pub fn new(settings: config::Settings, store: Arc<dyn AlertStore>, prices: PriceFeedHub) -> Self {
        let backend = Arc::new(RegistrationClient::new(
            settings.alerts_endpoint.clone(),
            settings.origin.clone(),
        ));
        Self::with_backend(settings, store, prices, backend)
    }

    pub fn with_backend(
        settings: config::Settings,
        store: Arc<dyn AlertStore>,
        prices: PriceFeedHub,
        backend: Arc<dyn AlertBackend>,
    ) -> Self {
        let bus = events::EventBus::new(settings.event_bus_capacity);
        let locks = MarketLocks::new();
        let bridge = Arc::new(WorkerBridge::new());

        let push = Arc::new(PushChannel::new(
            bridge.clone(),
            settings.push_public_key.clone(),
        ));

        let feed: Arc<dyn PriceFeed> = Arc::new(prices.clone());
        let validator = AlertValidator::new(feed, settings.price_wait);

        let reconciler = Arc::new(Reconciler::new(
            store.clone(),
            bridge.clone(),
            bus.clone(),
            locks.clone(),
        ));

        let lifecycle = Arc::new(AlertLifecycle::new(
            store.clone(),
            push.clone(),
            validator,
            backend,
            bus.clone(),
            Notices::new(bus.clone()),
            locks,
        ));

        Self {
            settings,
            bus,
            store,
            bridge,
            prices,
            push,
            reconciler,
            lifecycle,
        }
    }
}
