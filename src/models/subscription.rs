use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Plain form of a platform push subscription, as the alerting backend
/// expects it spread into its request bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub endpoint: String,

    #[serde(default)]
    pub expiration_time: Option<i64>,

    pub keys: SubscriptionKeys,
}
