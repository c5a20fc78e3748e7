#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use async_trait::async_trait;
use alertsync::{
    error::AlertError,
    events::EventBus,
    models::{Alert, PushSubscription, SubscriptionKeys},
    services::{
        lifecycle::AlertLifecycle,
        reconciliation::Reconciler,
        notices::Notices,
        price_feed::PriceFeed,
        push::{PushChannel, WorkerBridge},
        registration::{AlertBackend, RegisterOptions, RegisterResponse},
        store::{AlertStore, MarketLocks, MemoryAlertStore},
        validator::AlertValidator,
    },
};

pub fn sample_subscription() -> PushSubscription {
    PushSubscription {
        endpoint: "https://push.example.test/send/abc123".to_string(),
        expiration_time: None,
        keys: SubscriptionKeys {
            p256dh: "BNcRdreALRFXTkOOUHK1EtK2wtaz5Ry4YfYCA".to_string(),
            auth: "tBHItJI5svbpez7KI4CCXg".to_string(),
        },
    }
}

pub fn alert(market: &str, price: f64, active: bool, triggered: bool) -> Alert {
    Alert {
        market: market.to_string(),
        price,
        timestamp: 1_700_000_000_000,
        active,
        triggered,
    }
}

/// Price feed that always knows the price, or never answers.
pub struct FixedFeed(pub Option<f64>);

#[async_trait]
impl PriceFeed for FixedFeed {
    async fn next_price(&self, _market: &str) -> Option<f64> {
        match self.0 {
            Some(p) => Some(p),
            None => std::future::pending().await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub market: String,
    pub price: f64,
    pub options: RegisterOptions,
}

pub struct RecordingBackend {
    calls: Mutex<Vec<RecordedCall>>,
    response: RegisterResponse,
}

impl RecordingBackend {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            response: RegisterResponse::default(),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            response: RegisterResponse::failed(message),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertBackend for RecordingBackend {
    async fn register(
        &self,
        _subscription: &PushSubscription,
        market: &str,
        price: f64,
        options: RegisterOptions,
    ) -> RegisterResponse {
        self.calls.lock().unwrap().push(RecordedCall {
            market: market.to_string(),
            price,
            options,
        });
        self.response.clone()
    }
}

/// Memory store that counts writes and can stall between a load and the
/// caller's save, which widens any unserialized read-modify-write window.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryAlertStore,
    saves: AtomicUsize,
    load_delay: Mutex<Option<Duration>>,
}

impl CountingStore {
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn set_load_delay(&self, delay: Duration) {
        *self.load_delay.lock().unwrap() = Some(delay);
    }

    pub async fn seed(&self, market: &str, alerts: Vec<Alert>) {
        self.inner.save_alerts(market, &alerts).await.unwrap();
    }
}

#[async_trait]
impl AlertStore for CountingStore {
    async fn get_alerts(&self, market: &str) -> Result<Vec<Alert>, AlertError> {
        let alerts = self.inner.get_alerts(market).await?;

        let delay = *self.load_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(alerts)
    }

    async fn save_alerts(&self, market: &str, alerts: &[Alert]) -> Result<(), AlertError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save_alerts(market, alerts).await
    }
}

pub struct Harness {
    pub lifecycle: AlertLifecycle,
    pub reconciler: Arc<Reconciler>,
    pub locks: MarketLocks,
    pub store: Arc<CountingStore>,
    pub backend: Arc<RecordingBackend>,
    pub bridge: Arc<WorkerBridge>,
    pub bus: EventBus,
}

/// Facade over in-memory collaborators. With a push key the worker is
/// registered up front so subscription requests resolve immediately.
pub async fn harness(
    push_key: Option<&str>,
    current_price: Option<f64>,
    backend: Arc<RecordingBackend>,
) -> Harness {
    let store = Arc::new(CountingStore::default());
    harness_with(push_key, current_price, backend.clone(), backend, store).await
}

/// Same wiring, but the facade talks to `remote` while `backend` stays the
/// recorder exposed on the harness.
pub async fn harness_with(
    push_key: Option<&str>,
    current_price: Option<f64>,
    backend: Arc<RecordingBackend>,
    remote: Arc<dyn AlertBackend>,
    store: Arc<CountingStore>,
) -> Harness {
    let bridge = Arc::new(WorkerBridge::new());
    let bus = EventBus::new(64);

    if push_key.is_some() {
        bridge.register(Some(sample_subscription())).await;
    }

    let push = Arc::new(PushChannel::new(
        bridge.clone(),
        push_key.map(str::to_string),
    ));
    let validator = AlertValidator::new(
        Arc::new(FixedFeed(current_price)),
        Some(Duration::from_millis(20)),
    );

    let locks = MarketLocks::new();

    let lifecycle = AlertLifecycle::new(
        store.clone(),
        push,
        validator,
        remote,
        bus.clone(),
        Notices::new(bus.clone()),
        locks.clone(),
    );

    let reconciler = Arc::new(Reconciler::new(
        store.clone(),
        bridge.clone(),
        bus.clone(),
        locks.clone(),
    ));

    Harness {
        lifecycle,
        reconciler,
        locks,
        store,
        backend,
        bridge,
        bus,
    }
}
