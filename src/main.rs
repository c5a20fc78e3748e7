use std::net::SocketAddr;
use std::sync::Arc;

use mongodb::Client;

use alertsync::{
    config::{self, StoreKind},
    routes,
    services::{
        finnhub,
        price_feed::PriceFeedHub,
        store::{AlertStore, MemoryAlertStore, MongoAlertStore},
    },
    AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let settings = config::load();

    let store: Arc<dyn AlertStore> = match settings.store {
        StoreKind::Mongo => {
            let client = Client::with_uri_str(&settings.mongodb_uri)
                .await
                .expect("Failed to connect to MongoDB");
            Arc::new(MongoAlertStore::new(client.database(&settings.mongodb_db)))
        }
        StoreKind::Memory => Arc::new(MemoryAlertStore::new()),
    };

    let prices = if settings.finnhub_api_key.trim().is_empty() {
        PriceFeedHub::new()
    } else {
        let (hub, interest) = PriceFeedHub::with_interest();
        finnhub::spawn_trade_stream(settings.finnhub_api_key.clone(), hub.clone(), interest);
        hub
    };

    if !settings.push_enabled() {
        tracing::info!("PUSH_PUBLIC_KEY not set, push alerts disabled");
    }

    let state = AppState::new(settings.clone(), store, prices);

    // reads wait on this; it completes once the worker reports in
    state.reconciler.start_initial_sync();

    let app = routes::app(state);

    let addr = SocketAddr::from((
        settings
            .host
            .parse::<std::net::IpAddr>()
            .expect("HOST must be an IP address"),
        settings.port,
    ));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
