use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, watch, Mutex, OnceCell};

use crate::{
    error::AlertError,
    models::{DeliveredNotification, PushSubscription},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeOptions {
    pub user_visible_only: bool,
    pub application_server_key: String,
}

/// The client platform's push machinery: worker registration, the push
/// subscription, and the notifications it delivered.
#[async_trait]
pub trait PushPlatform: Send + Sync {
    /// Suspends until the worker registration is ready. No timeout.
    async fn ready(&self);

    async fn subscribe(&self, options: &SubscribeOptions) -> Result<PushSubscription, AlertError>;

    /// Notifications shown while nobody was listening and not yet dismissed.
    /// The startup sweep takes them once.
    async fn delivered_notifications(&self) -> Vec<DeliveredNotification>;

    /// Live push messages. Only the first caller gets the stream.
    async fn take_messages(&self) -> Option<mpsc::UnboundedReceiver<Value>>;
}

/// Platform side fed over HTTP by the page and its service worker: they report
/// the registration (with the subscription they obtained), the notifications
/// still on screen, and every push message as it arrives.
pub struct WorkerBridge {
    ready: watch::Sender<bool>,
    subscription: Mutex<Option<PushSubscription>>,
    // None once the startup sweep has taken the backlog
    delivered: Mutex<Option<Vec<DeliveredNotification>>>,
    live_tx: mpsc::UnboundedSender<Value>,
    live_rx: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
}

impl WorkerBridge {
    pub fn new() -> Self {
        let (ready, _) = watch::channel(false);
        let (live_tx, live_rx) = mpsc::unbounded_channel();

        Self {
            ready,
            subscription: Mutex::new(None),
            delivered: Mutex::new(Some(Vec::new())),
            live_tx,
            live_rx: Mutex::new(Some(live_rx)),
        }
    }

    pub async fn register(&self, subscription: Option<PushSubscription>) {
        if let Some(sub) = subscription {
            *self.subscription.lock().await = Some(sub);
        }
        self.ready.send_replace(true);
        tracing::info!("push worker registration ready");
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Before the sweep the notifications are queued for it; after, they go
    /// down the live channel. Returns how many were taken.
    pub async fn report_delivered(&self, notifications: Vec<DeliveredNotification>) -> usize {
        let mut delivered = self.delivered.lock().await;

        let Some(backlog) = delivered.as_mut() else {
            let forwarded = notifications
                .into_iter()
                .filter(|n| self.deliver(n.data.clone()))
                .count();
            tracing::debug!(forwarded, "late delivered notifications forwarded as live");
            return forwarded;
        };

        let count = notifications.len();
        backlog.extend(notifications);
        count
    }

    /// Returns false once the live listener has gone away.
    pub fn deliver(&self, message: Value) -> bool {
        self.live_tx.send(message).is_ok()
    }
}

impl Default for WorkerBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushPlatform for WorkerBridge {
    async fn ready(&self) {
        let mut rx = self.ready.subscribe();
        // the sender lives as long as self, so this only returns once ready
        let _ = rx.wait_for(|ready| *ready).await;
    }

    async fn subscribe(&self, options: &SubscribeOptions) -> Result<PushSubscription, AlertError> {
        self.ready().await;

        tracing::debug!(
            user_visible_only = options.user_visible_only,
            "push subscription requested"
        );

        self.subscription
            .lock()
            .await
            .clone()
            .ok_or_else(|| AlertError::Push("worker registered without a push subscription".to_string()))
    }

    async fn delivered_notifications(&self) -> Vec<DeliveredNotification> {
        self.delivered.lock().await.take().unwrap_or_default()
    }

    async fn take_messages(&self) -> Option<mpsc::UnboundedReceiver<Value>> {
        self.live_rx.lock().await.take()
    }
}

/// Owns the process-wide push subscription.
pub struct PushChannel {
    platform: Arc<dyn PushPlatform>,
    application_key: Option<String>,
    cached: OnceCell<PushSubscription>,
}

impl PushChannel {
    pub fn new(platform: Arc<dyn PushPlatform>, application_key: Option<String>) -> Self {
        Self {
            platform,
            application_key,
            cached: OnceCell::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.application_key.is_some()
    }

    /// `Ok(None)` when no application key is configured: push is simply off.
    pub async fn get_subscription(&self) -> Result<Option<PushSubscription>, AlertError> {
        if let Some(sub) = self.cached.get() {
            return Ok(Some(sub.clone()));
        }

        let Some(key) = self.application_key.as_ref() else {
            return Ok(None);
        };

        let options = SubscribeOptions {
            user_visible_only: true,
            application_server_key: key.clone(),
        };

        let sub = self
            .cached
            .get_or_try_init(|| async { self.platform.subscribe(&options).await })
            .await?;

        Ok(Some(sub.clone()))
    }
}
