//! Blockscout API client for the Rootstock explorer
//!
//! Paginated endpoints return `{"items": [...], "next_page_params": {...}}`;
//! `page` follows that contract generically. Event topic filters return 422
//! for the contracts we care about, so callers fetch all logs and classify
//! by topic0 client-side.

use crate::error::{AtlasError, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_RETRIES: u32 = 3;
const RATE_LIMIT_DELAY_MS: u64 = 300;

pub type PageParams = Vec<(String, String)>;

#[derive(Clone)]
pub struct BlockscoutClient {
    client: Client,
    base_url: String,
}

impl BlockscoutClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET a path with query params, retrying with backoff on failure
    pub async fn get_json(&self, path: &str, params: &PageParams) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match self.client.get(&url).query(params).send().await {
                Ok(resp) => match resp.error_for_status() {
                    Ok(resp) => return Ok(resp.json().await?),
                    Err(e) => e,
                },
                Err(e) => e,
            };
            if attempt >= MAX_RETRIES {
                return Err(err.into());
            }
            let wait = Duration::from_secs(2 * attempt as u64);
            warn!(
                "Blockscout request to {} failed (attempt {}/{}), retrying in {:?}: {}",
                url, attempt, MAX_RETRIES, wait, err
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// `/stats` endpoint (chain-wide statistics)
    pub async fn stats(&self) -> Result<Value> {
        self.get_json("stats", &Vec::new()).await
    }

    /// One page of a paginated endpoint: items plus the next page's params
    pub async fn page(
        &self,
        path: &str,
        params: &PageParams,
    ) -> Result<(Vec<Value>, Option<PageParams>)> {
        let body = self.get_json(path, params).await?;
        let items = body
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| {
                AtlasError::MalformedResponse(format!("{path}: response missing items array"))
            })?;
        let next = body
            .get("next_page_params")
            .filter(|v| !v.is_null())
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (k.clone(), query_param(v)))
                    .collect()
            });
        Ok((items, next))
    }

    /// All event logs for an address at or above `min_block`, newest first
    pub async fn address_logs(
        &self,
        address: &str,
        min_block: u64,
        max_pages: u32,
    ) -> Result<Vec<Value>> {
        self.collect_pages(&format!("addresses/{address}/logs"), min_block, max_pages)
            .await
    }

    /// Internal transactions for an address at or above `min_block`
    pub async fn internal_transactions(
        &self,
        address: &str,
        min_block: u64,
        max_pages: u32,
    ) -> Result<Vec<Value>> {
        self.collect_pages(
            &format!("addresses/{address}/internal-transactions"),
            min_block,
            max_pages,
        )
        .await
    }

    async fn collect_pages(
        &self,
        path: &str,
        min_block: u64,
        max_pages: u32,
    ) -> Result<Vec<Value>> {
        let mut collected = Vec::new();
        let mut params: PageParams = Vec::new();

        for page in 1..=max_pages {
            debug!("Fetching {} page {}", path, page);
            let (items, next) = self.page(path, &params).await?;
            let total = items.len();
            let mut kept = 0;
            for item in items {
                let block = item.get("block_number").and_then(Value::as_u64).unwrap_or(0);
                if block >= min_block {
                    collected.push(item);
                    kept += 1;
                }
            }
            // Items below the cutoff mean the rest of the history is older
            if kept < total {
                debug!("Reached block cutoff ({}) on {}", min_block, path);
                break;
            }
            match next {
                Some(next) if total > 0 => params = next,
                _ => break,
            }
            tokio::time::sleep(Duration::from_millis(RATE_LIMIT_DELAY_MS)).await;
        }

        Ok(collected)
    }
}

fn query_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Log field decoding helpers
// ---------------------------------------------------------------------------

/// Extract an address from a 32-byte topic (last 20 bytes)
pub fn address_from_topic(topic: &str) -> String {
    let hex = topic.trim_start_matches("0x");
    if hex.len() < 40 {
        return String::new();
    }
    format!("0x{}", &hex[hex.len() - 40..].to_lowercase())
}

/// Parse one 32-byte hex word as an unsigned value.
///
/// Amounts can exceed u64, so accumulate in f64; monitoring does not need
/// wei-exact precision.
pub fn hex_word_to_f64(word: &str) -> Option<f64> {
    let hex = word.trim_start_matches("0x");
    if hex.is_empty() {
        return None;
    }
    let mut acc = 0f64;
    for c in hex.chars() {
        acc = acc * 16.0 + c.to_digit(16)? as f64;
    }
    Some(acc)
}

/// The `i`-th 32-byte word of a log's data field, as f64
pub fn data_word(data: &str, index: usize) -> Option<f64> {
    let hex = data.trim_start_matches("0x");
    let start = index * 64;
    hex.get(start..start + 64).and_then(hex_word_to_f64)
}

/// Decimal wei string to RBTC
pub fn wei_to_rbtc(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().map(|wei| wei / 1e18)
}
