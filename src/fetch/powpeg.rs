//! PowPeg (Bridge precompile) fetcher
//!
//! The Bridge is a precompiled contract whose events Blockscout cannot
//! decode, so peg-ins come from internal transactions (RBTC credited FROM
//! the Bridge) and peg-outs from release_request_received logs classified
//! by topic0.

use super::SourceFetcher;
use crate::adapters::blockscout::{address_from_topic, data_word, wei_to_rbtc, BlockscoutClient};
use crate::config::PowpegSourceConfig;
use crate::domain::{PowpegPayload, PowpegPegin, PowpegPegout, SourceId};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const TOPIC_RELEASE_REQUEST_RECEIVED: &str =
    "0x1a4457a4460d48b40c5280955faf8e4685fa73f0866f7d8f573bdd8e64aca5b1";

pub struct PowpegFetcher {
    blockscout: BlockscoutClient,
    config: PowpegSourceConfig,
}

impl PowpegFetcher {
    pub fn new(config: &PowpegSourceConfig, http_timeout: Duration) -> Result<Self> {
        Ok(Self {
            blockscout: BlockscoutClient::new(&config.blockscout_url, http_timeout)?,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl SourceFetcher for PowpegFetcher {
    fn source(&self) -> SourceId {
        SourceId::Powpeg
    }

    async fn fetch(&self) -> Result<Value> {
        let internal_txs = self
            .blockscout
            .internal_transactions(
                &self.config.bridge_address,
                self.config.min_block,
                self.config.max_pages,
            )
            .await?;
        debug!("Fetched {} Bridge internal transactions", internal_txs.len());

        let bridge = self.config.bridge_address.to_lowercase();
        let mut payload = PowpegPayload::default();
        for tx in &internal_txs {
            if let Some(pegin) = classify_internal_tx(tx, &bridge) {
                payload.pegins.push(pegin);
            }
        }

        let logs = self
            .blockscout
            .address_logs(
                &self.config.bridge_address,
                self.config.min_block,
                self.config.max_pages,
            )
            .await?;
        for log in &logs {
            let is_release = log
                .get("topics")
                .and_then(|t| t.get(0))
                .and_then(Value::as_str)
                == Some(TOPIC_RELEASE_REQUEST_RECEIVED);
            if is_release {
                payload.pegouts.push(parse_release_request(log));
            }
        }

        Ok(serde_json::to_value(payload)?)
    }
}

/// Internal transaction FROM the Bridge with value > 0 is a peg-in credit
fn classify_internal_tx(tx: &Value, bridge: &str) -> Option<PowpegPegin> {
    let from = tx.get("from")?.get("hash")?.as_str()?.to_lowercase();
    let to = tx.get("to")?.get("hash")?.as_str()?.to_lowercase();
    let value_rbtc = wei_to_rbtc(tx.get("value")?.as_str()?)?;

    if from != bridge || to == bridge || value_rbtc == 0.0 {
        return None;
    }

    Some(PowpegPegin {
        tx_hash: tx
            .get("transaction_hash")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        block_number: tx.get("block_number").and_then(Value::as_u64).unwrap_or(0),
        block_timestamp: tx
            .get("timestamp")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        value_rbtc,
        to_address: to,
    })
}

/// release_request_received: topic1 = sender, data = (bytes btcAddress, int256 amount)
fn parse_release_request(log: &Value) -> PowpegPegout {
    let data = log.get("data").and_then(Value::as_str).unwrap_or("0x");
    // ABI layout: word 0 = offset to bytes, word 1 = amount
    let value_rbtc = data_word(data, 1).map(|v| v / 1e18).unwrap_or(0.0);
    let btc_destination = decode_btc_address(data).unwrap_or_default();

    PowpegPegout {
        tx_hash: log
            .get("transaction_hash")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        block_number: log.get("block_number").and_then(Value::as_u64).unwrap_or(0),
        block_timestamp: log
            .get("block_timestamp")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        value_rbtc,
        from_address: log
            .get("topics")
            .and_then(|t| t.get(1))
            .and_then(Value::as_str)
            .map(address_from_topic)
            .unwrap_or_default(),
        btc_destination,
    }
}

/// Dynamic bytes parameter: word 2 holds the length, ASCII data follows
fn decode_btc_address(data: &str) -> Option<String> {
    let hex = data.trim_start_matches("0x");
    let len = data_word(data, 2)? as usize;
    let start = 3 * 64;
    let raw = hex.get(start..start + len * 2)?;
    let mut bytes = Vec::with_capacity(len);
    for i in (0..raw.len()).step_by(2) {
        bytes.push(u8::from_str_radix(&raw[i..i + 2], 16).ok()?);
    }
    String::from_utf8(bytes).ok().filter(|s| s.is_ascii())
}
