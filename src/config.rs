use std::{env, time::Duration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    pub store: StoreKind,
    pub mongodb_uri: String,
    pub mongodb_db: String,

    // application server key; None disables push entirely
    pub push_public_key: Option<String>,
    pub alerts_endpoint: String,
    pub origin: String,

    // None waits for the price feed indefinitely
    pub price_wait: Option<Duration>,
    pub finnhub_api_key: String,

    pub event_bus_capacity: usize,
}

impl Settings {
    pub fn push_enabled(&self) -> bool {
        self.push_public_key.is_some()
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

    let port = env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let store = match env::var("ALERT_STORE").ok().as_deref() {
        Some("memory") => StoreKind::Memory,
        _ => StoreKind::Mongo,
    };

    let mongodb_uri = env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

    let mongodb_db = env::var("MONGODB_DB").unwrap_or_else(|_| "alertsync".to_string());

    let push_public_key = non_empty("PUSH_PUBLIC_KEY");

    let alerts_endpoint = env::var("ALERTS_ENDPOINT")
        .unwrap_or_else(|_| "http://127.0.0.1:8787/alerts".to_string());

    let origin = env::var("APP_ORIGIN").unwrap_or_else(|_| format!("http://{host}:{port}"));

    let price_wait = match env::var("PRICE_WAIT_MS").ok().and_then(|s| s.parse::<u64>().ok()) {
        Some(0) => None,
        Some(ms) => Some(Duration::from_millis(ms)),
        None => Some(Duration::from_millis(5000)),
    };

    let finnhub_api_key = env::var("FINNHUB_API_KEY").unwrap_or_default();

    let event_bus_capacity = env::var("EVENT_BUS_CAPACITY")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(256);

    Settings {
        host,
        port,
        store,
        mongodb_uri,
        mongodb_db,
        push_public_key,
        alerts_endpoint,
        origin,
        price_wait,
        finnhub_api_key,
        event_bus_capacity,
    }
}
