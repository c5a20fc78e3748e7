use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use mongodb::bson::doc;
use mongodb::options::ReplaceOptions;
use mongodb::Database;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{error::AlertError, models::Alert};

/// Durable per-market alert lists.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn get_alerts(&self, market: &str) -> Result<Vec<Alert>, AlertError>;

    async fn save_alerts(&self, market: &str, alerts: &[Alert]) -> Result<(), AlertError>;
}

#[derive(Default)]
pub struct MemoryAlertStore {
    lists: DashMap<String, Vec<Alert>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn get_alerts(&self, market: &str) -> Result<Vec<Alert>, AlertError> {
        Ok(self
            .lists
            .get(market)
            .map(|l| l.value().clone())
            .unwrap_or_default())
    }

    async fn save_alerts(&self, market: &str, alerts: &[Alert]) -> Result<(), AlertError> {
        self.lists.insert(market.to_string(), alerts.to_vec());
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MarketAlerts {
    #[serde(rename = "_id")]
    market: String,
    alerts: Vec<Alert>,
}

/// One document per market in `alert_lists`, replaced wholesale on save.
#[derive(Clone)]
pub struct MongoAlertStore {
    db: Database,
}

impl MongoAlertStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AlertStore for MongoAlertStore {
    async fn get_alerts(&self, market: &str) -> Result<Vec<Alert>, AlertError> {
        let lists = self.db.collection::<MarketAlerts>("alert_lists");

        let found = lists
            .find_one(doc! { "_id": market }, None)
            .await
            .map_err(|e| AlertError::Store(e.to_string()))?;

        Ok(found.map(|m| m.alerts).unwrap_or_default())
    }

    async fn save_alerts(&self, market: &str, alerts: &[Alert]) -> Result<(), AlertError> {
        let lists = self.db.collection::<MarketAlerts>("alert_lists");
        let replacement = MarketAlerts {
            market: market.to_string(),
            alerts: alerts.to_vec(),
        };

        lists
            .replace_one(
                doc! { "_id": market },
                &replacement,
                ReplaceOptions::builder().upsert(true).build(),
            )
            .await
            .map_err(|e| AlertError::Store(e.to_string()))?;

        Ok(())
    }
}

/// Serializes read-modify-write sequences on the same market list.
///
/// One entry per market seen; [`MarketLocks::prune_idle`] drops the ones
/// nobody holds or waits on.
#[derive(Clone, Default)]
pub struct MarketLocks {
    inner: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl MarketLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, market: &str) -> OwnedMutexGuard<()> {
        let m = self.inner.entry(market.to_string()).or_default().clone();
        m.lock_owned().await
    }

    /// Entries whose mutex is referenced only by the map are idle. `lock`
    /// clones under the shard lock, so a caller about to lock keeps its entry.
    pub fn prune_idle(&self) {
        self.inner.retain(|_, m| Arc::strong_count(m) > 1);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
