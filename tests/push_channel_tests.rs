mod common;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use async_trait::async_trait;
use alertsync::{
    error::AlertError,
    models::{DeliveredNotification, PushSubscription},
    services::push::{PushChannel, PushPlatform, SubscribeOptions, WorkerBridge},
};
use common::sample_subscription;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::timeout;

#[derive(Default)]
struct CountingPlatform {
    subscribes: AtomicUsize,
}

#[async_trait]
impl PushPlatform for CountingPlatform {
    async fn ready(&self) {}

    async fn subscribe(&self, options: &SubscribeOptions) -> Result<PushSubscription, AlertError> {
        assert!(options.user_visible_only);
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        Ok(sample_subscription())
    }

    async fn delivered_notifications(&self) -> Vec<DeliveredNotification> {
        Vec::new()
    }

    async fn take_messages(&self) -> Option<mpsc::UnboundedReceiver<Value>> {
        None
    }
}

#[tokio::test]
async fn no_application_key_means_no_subscription() {
    let platform = Arc::new(CountingPlatform::default());
    let push = PushChannel::new(platform.clone(), None);

    assert_eq!(push.get_subscription().await.unwrap(), None);
    assert_eq!(platform.subscribes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn subscription_is_cached_after_first_success() {
    let platform = Arc::new(CountingPlatform::default());
    let push = PushChannel::new(platform.clone(), Some("app-key".to_string()));

    let first = push.get_subscription().await.unwrap();
    let second = push.get_subscription().await.unwrap();

    assert_eq!(first, Some(sample_subscription()));
    assert_eq!(first, second);
    assert_eq!(platform.subscribes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn bridge_subscription_waits_for_worker_registration() {
    let bridge = Arc::new(WorkerBridge::new());
    let push = Arc::new(PushChannel::new(bridge.clone(), Some("app-key".to_string())));

    let pending = {
        let push = push.clone();
        tokio::spawn(async move { push.get_subscription().await })
    };

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!pending.is_finished());

    bridge.register(Some(sample_subscription())).await;

    let sub = timeout(Duration::from_secs(2), pending)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(sub, Some(sample_subscription()));
}

#[tokio::test]
async fn bridge_without_subscription_is_an_error_and_not_cached() {
    let bridge = Arc::new(WorkerBridge::new());
    bridge.register(None).await;
    let push = PushChannel::new(bridge.clone(), Some("app-key".to_string()));

    assert!(matches!(push.get_subscription().await, Err(AlertError::Push(_))));

    bridge.register(Some(sample_subscription())).await;
    assert_eq!(push.get_subscription().await.unwrap(), Some(sample_subscription()));
}

#[tokio::test]
async fn delivered_notifications_are_drained() {
    let bridge = WorkerBridge::new();
    let n: DeliveredNotification =
        serde_json::from_value(serde_json::json!({ "data": { "price": 1, "market": "X" } })).unwrap();

    bridge.report_delivered(vec![n]).await;

    assert_eq!(bridge.delivered_notifications().await.len(), 1);
    assert!(bridge.delivered_notifications().await.is_empty());
}

#[tokio::test]
async fn notifications_reported_after_the_sweep_go_live() {
    let bridge = WorkerBridge::new();
    let mut live = bridge.take_messages().await.unwrap();
    bridge.delivered_notifications().await;

    let n: DeliveredNotification =
        serde_json::from_value(serde_json::json!({ "data": { "price": 1, "market": "X" } })).unwrap();

    assert_eq!(bridge.report_delivered(vec![n]).await, 1);
    assert_eq!(live.try_recv().unwrap()["market"], "X");
    assert!(bridge.delivered_notifications().await.is_empty());
}

#[test]
fn subscription_serializes_to_plain_camel_case() {
    let v = serde_json::to_value(sample_subscription()).unwrap();

    assert!(v.get("endpoint").is_some());
    assert!(v.get("expirationTime").is_some());
    assert!(v["keys"].get("p256dh").is_some());
    assert!(v["keys"].get("auth").is_some());
}
