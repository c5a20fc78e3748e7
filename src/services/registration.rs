use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::PushSubscription;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsubscribe: Option<bool>,

    // set only on the move path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_price: Option<f64>,

    // create and remove paths only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    #[serde(flatten)]
    subscription: &'a PushSubscription,
    origin: &'a str,
    market: &'a str,
    price: f64,
    #[serde(flatten)]
    options: &'a RegisterOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<Value>,
}

impl RegisterResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            alert: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Remote alerting backend. Implementations report every failure inside the
/// response and never error out.
#[async_trait]
pub trait AlertBackend: Send + Sync {
    async fn register(
        &self,
        subscription: &PushSubscription,
        market: &str,
        price: f64,
        options: RegisterOptions,
    ) -> RegisterResponse;
}

#[derive(Clone)]
pub struct RegistrationClient {
    http: Client,
    endpoint: String,
    origin: String,
}

impl RegistrationClient {
    pub fn new(endpoint: String, origin: String) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            origin,
        }
    }

    fn url_for(&self, options: &RegisterOptions) -> String {
        if options.new_price.is_some() {
            format!("{}/move", self.endpoint)
        } else {
            self.endpoint.clone()
        }
    }

    async fn send(&self, url: &str, body: &RegisterRequest<'_>) -> Result<RegisterResponse, String> {
        let res = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = res.status();
        let text = res.text().await.map_err(|e| e.to_string())?;
        let parsed = serde_json::from_str::<RegisterResponse>(&text).ok();

        if !status.is_success() {
            let message = parsed
                .and_then(|r| r.error)
                .unwrap_or_else(|| format!("alert backend returned {status} {text}"));
            return Err(message);
        }

        Ok(parsed.unwrap_or_default())
    }
}

#[async_trait]
impl AlertBackend for RegistrationClient {
    async fn register(
        &self,
        subscription: &PushSubscription,
        market: &str,
        price: f64,
        options: RegisterOptions,
    ) -> RegisterResponse {
        let body = RegisterRequest {
            subscription,
            origin: &self.origin,
            market,
            price,
            options: &options,
        };

        let url = self.url_for(&options);

        match self.send(&url, &body).await {
            Ok(res) => {
                if let Some(err) = &res.error {
                    tracing::warn!(market, price, error = %err, "alert backend refused request");
                }
                res
            }
            Err(e) => {
                tracing::warn!(market, price, error = %e, "alert backend request failed");
                RegisterResponse::failed(e)
            }
        }
    }
}
