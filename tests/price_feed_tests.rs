use std::time::Duration;

use alertsync::{
    events::{EventBus, ALERT_TOPIC, NOTICE_TOPIC},
    services::{
        finnhub::snapshot_from_frame,
        price_feed::{PriceFeed, PriceFeedHub, PriceLevel},
    },
};
use serde_json::json;
use tokio::time::timeout;

#[test]
fn trade_frame_keeps_last_price_per_symbol() {
    let frame = r#"{"type":"trade","data":[
        {"s":"BINANCE:BTCUSDT","p":50000.5,"t":1,"v":0.1},
        {"s":"BINANCE:BTCUSDT","p":50001.0,"t":2,"v":0.2},
        {"s":"AAPL","p":190.1,"t":2,"v":5}
    ]}"#;

    let snapshot = snapshot_from_frame(frame).unwrap();

    assert_eq!(snapshot["BINANCE:BTCUSDT"].price, 50001.0);
    assert_eq!(snapshot["AAPL"].price, 190.1);
}

#[test]
fn non_trade_frames_are_ignored() {
    assert!(snapshot_from_frame(r#"{"type":"ping"}"#).is_none());
    assert!(snapshot_from_frame(r#"{"type":"trade","data":[]}"#).is_none());
    assert!(snapshot_from_frame("not json").is_none());
}

#[tokio::test]
async fn hub_reports_interest_and_resolves_waiters() {
    let (hub, mut interest) = PriceFeedHub::with_interest();

    let waiter = {
        let hub = hub.clone();
        tokio::spawn(async move { hub.next_price("AAPL").await })
    };

    let wanted = timeout(Duration::from_secs(2), interest.recv()).await.unwrap();
    assert_eq!(wanted.as_deref(), Some("AAPL"));

    hub.publish([("AAPL".to_string(), PriceLevel { price: 190.0 })].into());

    let price = timeout(Duration::from_secs(2), waiter).await.unwrap().unwrap();
    assert_eq!(price, Some(190.0));
}

#[tokio::test]
async fn bus_subscriptions_filter_by_topic() {
    let bus = EventBus::new(16);
    assert_eq!(bus.emit(ALERT_TOPIC, json!({})), 0);

    let mut alerts = bus.subscribe(ALERT_TOPIC);
    let mut everything = bus.subscribe_all();

    bus.emit(NOTICE_TOPIC, json!({ "title": "hi" }));
    bus.emit(ALERT_TOPIC, json!({ "price": 1 }));

    let msg = alerts.recv().await.unwrap();
    assert_eq!(msg.topic, ALERT_TOPIC);
    assert!(alerts.try_recv().is_none());

    assert_eq!(everything.try_recv().unwrap().topic, NOTICE_TOPIC);
    assert_eq!(everything.try_recv().unwrap().topic, ALERT_TOPIC);

    drop(alerts);
    assert_eq!(bus.subscriber_count(), 1);
}
