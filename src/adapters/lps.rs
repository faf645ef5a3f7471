//! Liquidity provider server client
//!
//! The LPS exposes real-time liquidity for the sole active Flyover LP.
//! Amounts come back as wei strings or numbers depending on server version.

use crate::domain::LpInfo;
use crate::error::{AtlasError, Result};
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const LP_NAME: &str = "TeksCapital";

#[derive(Clone)]
pub struct LpsClient {
    client: Client,
    url: String,
}

impl LpsClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Current peg-in / peg-out liquidity
    pub async fn liquidity(&self) -> Result<LpInfo> {
        let body: Value = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let pegin_wei = wei_field(&body, "peginLiquidityAmount").ok_or_else(|| {
            AtlasError::MalformedResponse("LPS response missing peginLiquidityAmount".into())
        })?;
        let pegout_wei = wei_field(&body, "pegoutLiquidityAmount").ok_or_else(|| {
            AtlasError::MalformedResponse("LPS response missing pegoutLiquidityAmount".into())
        })?;

        Ok(LpInfo {
            lp_name: LP_NAME.to_string(),
            pegin_rbtc: pegin_wei / 1e18,
            pegout_btc: pegout_wei / 1e18,
            btc_utxo_count: body.get("btcUtxoCount").and_then(Value::as_u64),
            is_operational_pegin: body.get("isOperationalPegin").and_then(Value::as_bool),
            is_operational_pegout: body.get("isOperationalPegout").and_then(Value::as_bool),
            fetched_at: Utc::now(),
        })
    }
}

fn wei_field(body: &Value, key: &str) -> Option<f64> {
    match body.get(key)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wei_field_accepts_string_and_number() {
        let body = json!({"a": "1000000000000000000", "b": 5.0, "c": true});
        assert_eq!(wei_field(&body, "a"), Some(1e18));
        assert_eq!(wei_field(&body, "b"), Some(5.0));
        assert_eq!(wei_field(&body, "c"), None);
        assert_eq!(wei_field(&body, "missing"), None);
    }
}
