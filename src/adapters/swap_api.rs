//! RSK Swap API client
//!
//! Single source of truth for swap route availability: which providers are
//! enabled, which tokens are supported, and per-pair limits.

use crate::error::Result;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// BTC -> RBTC on RSK mainnet, the reference pair for limits checks
pub const LIMITS_PAIR: [(&str, &str); 4] = [
    ("from_token", "BTC"),
    ("to_token", "RBTC"),
    ("from_network", "BTC"),
    ("to_network", "30"),
];

#[derive(Clone)]
pub struct SwapApiClient {
    client: Client,
    base_url: String,
}

impl SwapApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path);
        let body = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body)
    }

    /// GET /providers: enabled providers with their supported pairs
    pub async fn providers(&self) -> Result<Value> {
        self.get("providers", &[]).await
    }

    /// GET /tokens: supported tokens
    pub async fn tokens(&self) -> Result<Value> {
        self.get("tokens", &[]).await
    }

    /// GET /swaps/limits: min/max for the reference pair
    pub async fn limits(&self) -> Result<Value> {
        self.get("swaps/limits", &LIMITS_PAIR).await
    }
}
