use std::collections::HashSet;

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as TMessage};

use super::price_feed::{PriceFeedHub, PriceLevel, PriceSnapshot};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct TradeMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Vec<Trade>,
}

#[derive(Debug, Deserialize)]
struct Trade {
    // symbol
    s: String,
    // last price
    p: f64,
}

/// Last trade price per symbol in one Finnhub `trade` frame.
pub fn snapshot_from_frame(txt: &str) -> Option<PriceSnapshot> {
    let msg: TradeMessage = serde_json::from_str(txt).ok()?;
    if msg.kind != "trade" {
        return None;
    }

    let mut snapshot = PriceSnapshot::new();
    for t in msg.data {
        snapshot.insert(t.s, PriceLevel { price: t.p });
    }

    (!snapshot.is_empty()).then_some(snapshot)
}

/// Streams Finnhub trades into the hub. Markets are subscribed the first time
/// somebody waits on them and are re-subscribed after a reconnect.
pub fn spawn_trade_stream(token: String, hub: PriceFeedHub, mut interest: mpsc::UnboundedReceiver<String>) {
    tokio::spawn(async move {
        let mut markets: HashSet<String> = HashSet::new();

        loop {
            let url = format!("wss://ws.finnhub.io/?token={}", token);

            let (ws, _) = match connect_async(url.as_str()).await {
                Ok(x) => x,
                Err(err) => {
                    tracing::error!("Finnhub WS connect failed: {}", err);
                    sleep(RECONNECT_DELAY).await;
                    continue;
                }
            };

            tracing::info!("Finnhub WS connected OK");

            let (mut write, mut read) = ws.split();

            for m in &markets {
                let sub = serde_json::json!({ "type": "subscribe", "symbol": m });
                let _ = write.send(TMessage::Text(sub.to_string())).await;
            }

            loop {
                tokio::select! {
                    wanted = interest.recv() => {
                        let Some(market) = wanted else {
                            tracing::info!("price interest channel closed, stopping Finnhub stream");
                            return;
                        };

                        if markets.insert(market.clone()) {
                            let sub = serde_json::json!({ "type": "subscribe", "symbol": market });
                            if write.send(TMessage::Text(sub.to_string())).await.is_err() {
                                break;
                            }
                        }
                    }

                    msg = read.next() => {
                        match msg {
                            Some(Ok(TMessage::Text(txt))) => {
                                if let Some(snapshot) = snapshot_from_frame(&txt) {
                                    hub.publish(snapshot);
                                }
                            }
                            Some(Ok(TMessage::Ping(payload))) => {
                                let _ = write.send(TMessage::Pong(payload)).await;
                            }
                            Some(Ok(TMessage::Close(_))) | None => break,
                            Some(Ok(_)) => {}
                            Some(Err(err)) => {
                                tracing::warn!("Finnhub WS read failed: {}", err);
                                break;
                            }
                        }
                    }
                }
            }

            tracing::warn!("Finnhub WS disconnected, reconnecting");
            sleep(RECONNECT_DELAY).await;
        }
    });
}
