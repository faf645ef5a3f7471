//! Flyover (LiquidityBridgeContractV2) fetcher
//!
//! Classifies LBC event logs by topic0 and normalizes them into the
//! flyover payload. Blockscout decodes most LBC events server-side; the
//! topic/data fallback mirrors the contract ABI.

use super::SourceFetcher;
use crate::adapters::blockscout::{address_from_topic, data_word, BlockscoutClient};
use crate::adapters::LpsClient;
use crate::config::FlyoverSourceConfig;
use crate::domain::{
    FlyoverPayload, FlyoverPegin, FlyoverPegout, Penalty, SourceId, UserRefund,
};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

// keccak256 hashes of the LBC event signatures
const TOPIC_CALL_FOR_USER: &str =
    "0xbfc7404e6fe464f0646fe2c6ab942b92d56be722bb39f8c6bc4830d2d32fb80d";
const TOPIC_PEGOUT_DEPOSIT: &str =
    "0xb1bc7bfc0dab19777eb03aa0a5643378fc9f186c8fc5a36620d21136fbea570f";
const TOPIC_PEGOUT_REFUNDED: &str =
    "0xb781856ec73fd0dc39351043d1634ea22cd3277b0866ab93e7ec1801766bb384";
const TOPIC_PENALIZED: &str =
    "0x9685484093cc596fdaeab51abf645b1753dbb7d869bfd2eb21e2c646e47a36f4";
const TOPIC_PEGOUT_USER_REFUNDED: &str =
    "0x9ccbeffc442024e2a6ade18ff0978af9a4c4d6562ae38adb51ccf8256cf42b41";

pub struct FlyoverFetcher {
    blockscout: BlockscoutClient,
    lps: LpsClient,
    config: FlyoverSourceConfig,
}

impl FlyoverFetcher {
    pub fn new(config: &FlyoverSourceConfig, http_timeout: Duration) -> Result<Self> {
        Ok(Self {
            blockscout: BlockscoutClient::new(&config.blockscout_url, http_timeout)?,
            lps: LpsClient::new(&config.lps_url, http_timeout)?,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl SourceFetcher for FlyoverFetcher {
    fn source(&self) -> SourceId {
        SourceId::Flyover
    }

    async fn fetch(&self) -> Result<Value> {
        let logs = self
            .blockscout
            .address_logs(
                &self.config.lbc_address,
                self.config.min_block,
                self.config.max_pages,
            )
            .await?;
        debug!("Fetched {} LBC log entries", logs.len());

        let mut payload = FlyoverPayload::default();
        for log in &logs {
            match topic0(log) {
                Some(TOPIC_CALL_FOR_USER) => payload.pegins.push(parse_call_for_user(log)),
                Some(TOPIC_PEGOUT_DEPOSIT) => payload.pegouts.push(parse_pegout_deposit(log)),
                Some(TOPIC_PEGOUT_REFUNDED) => {
                    if let Some(quote) = topic(log, 1) {
                        payload.pegout_refund_hashes.push(quote);
                    }
                }
                Some(TOPIC_PENALIZED) => payload.penalties.push(parse_penalized(log)),
                Some(TOPIC_PEGOUT_USER_REFUNDED) => {
                    payload.user_refunds.push(parse_user_refunded(log))
                }
                _ => {}
            }
        }
        payload.pegout_refund_hashes.sort();
        payload.pegout_refund_hashes.dedup();

        // LP liquidity degrades independently of event history
        payload.lp_info = match self.lps.liquidity().await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("Failed to fetch LP liquidity: {e}");
                None
            }
        };

        Ok(serde_json::to_value(payload)?)
    }
}

fn topic0(log: &Value) -> Option<&str> {
    log.get("topics")?.get(0)?.as_str()
}

fn topic(log: &Value, index: usize) -> Option<String> {
    log.get("topics")?
        .get(index)?
        .as_str()
        .map(str::to_string)
}

fn str_field(log: &Value, key: &str) -> String {
    log.get(key).and_then(Value::as_str).unwrap_or("").to_string()
}

fn u64_field(log: &Value, key: &str) -> u64 {
    log.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn data_field(log: &Value) -> String {
    str_field(log, "data")
}

/// Decoded parameter map, when Blockscout decoded the event
fn decoded_params(log: &Value) -> Option<serde_json::Map<String, Value>> {
    let params = log.get("decoded")?.get("parameters")?.as_array()?;
    let mut map = serde_json::Map::new();
    for p in params {
        if let (Some(name), Some(value)) = (p.get("name").and_then(Value::as_str), p.get("value")) {
            map.insert(name.to_string(), value.clone());
        }
    }
    Some(map)
}

fn param_str(params: &serde_json::Map<String, Value>, key: &str) -> String {
    params.get(key).and_then(Value::as_str).unwrap_or("").to_string()
}

fn param_rbtc(params: &serde_json::Map<String, Value>, key: &str) -> f64 {
    match params.get(key) {
        Some(Value::String(s)) => s.parse::<f64>().unwrap_or(0.0) / 1e18,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0) / 1e18,
        _ => 0.0,
    }
}

/// CallForUser(address from, address dest, uint gasLimit, uint value, bytes data, bool success, bytes32 quoteHash)
fn parse_call_for_user(log: &Value) -> FlyoverPegin {
    if let Some(params) = decoded_params(log) {
        return FlyoverPegin {
            tx_hash: str_field(log, "transaction_hash"),
            block_number: u64_field(log, "block_number"),
            block_timestamp: str_field(log, "block_timestamp"),
            value_rbtc: param_rbtc(&params, "value"),
            dest_address: param_str(&params, "dest"),
            lp_address: param_str(&params, "from"),
        };
    }
    FlyoverPegin {
        tx_hash: str_field(log, "transaction_hash"),
        block_number: u64_field(log, "block_number"),
        block_timestamp: str_field(log, "block_timestamp"),
        value_rbtc: data_word(&data_field(log), 1).map(|v| v / 1e18).unwrap_or(0.0),
        dest_address: topic(log, 2).map(|t| address_from_topic(&t)).unwrap_or_default(),
        lp_address: topic(log, 1).map(|t| address_from_topic(&t)).unwrap_or_default(),
    }
}

/// PegOutDeposit(bytes32 quoteHash, address sender, uint256 amount, uint256 timestamp)
fn parse_pegout_deposit(log: &Value) -> FlyoverPegout {
    if let Some(params) = decoded_params(log) {
        return FlyoverPegout {
            tx_hash: str_field(log, "transaction_hash"),
            block_number: u64_field(log, "block_number"),
            block_timestamp: str_field(log, "block_timestamp"),
            amount_rbtc: param_rbtc(&params, "amount"),
            sender: param_str(&params, "sender"),
            quote_hash: param_str(&params, "quoteHash"),
        };
    }
    FlyoverPegout {
        tx_hash: str_field(log, "transaction_hash"),
        block_number: u64_field(log, "block_number"),
        block_timestamp: str_field(log, "block_timestamp"),
        amount_rbtc: data_word(&data_field(log), 0).map(|v| v / 1e18).unwrap_or(0.0),
        sender: topic(log, 2).map(|t| address_from_topic(&t)).unwrap_or_default(),
        quote_hash: topic(log, 1).unwrap_or_default(),
    }
}

/// Penalized(address liquidityProvider, uint penalty, bytes32 quoteHash)
fn parse_penalized(log: &Value) -> Penalty {
    if let Some(params) = decoded_params(log) {
        return Penalty {
            tx_hash: str_field(log, "transaction_hash"),
            block_number: u64_field(log, "block_number"),
            block_timestamp: str_field(log, "block_timestamp"),
            lp_address: param_str(&params, "liquidityProvider"),
            penalty_rbtc: param_rbtc(&params, "penalty"),
            quote_hash: param_str(&params, "quoteHash"),
        };
    }
    let data = data_field(log);
    Penalty {
        tx_hash: str_field(log, "transaction_hash"),
        block_number: u64_field(log, "block_number"),
        block_timestamp: str_field(log, "block_timestamp"),
        lp_address: String::new(),
        penalty_rbtc: data_word(&data, 1).map(|v| v / 1e18).unwrap_or(0.0),
        quote_hash: String::new(),
    }
}

/// PegOutUserRefunded(bytes32 quoteHash, uint256 value, address userAddress)
fn parse_user_refunded(log: &Value) -> UserRefund {
    if let Some(params) = decoded_params(log) {
        return UserRefund {
            tx_hash: str_field(log, "transaction_hash"),
            block_number: u64_field(log, "block_number"),
            block_timestamp: str_field(log, "block_timestamp"),
            user_address: param_str(&params, "userAddress"),
            value_rbtc: param_rbtc(&params, "value"),
        };
    }
    let data = data_field(log);
    UserRefund {
        tx_hash: str_field(log, "transaction_hash"),
        block_number: u64_field(log, "block_number"),
        block_timestamp: str_field(log, "block_timestamp"),
        user_address: String::new(),
        value_rbtc: data_word(&data, 0).map(|v| v / 1e18).unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_call_for_user_decoded() {
        let log = json!({
            "transaction_hash": "0xabc",
            "block_number": 7_500_000,
            "block_timestamp": "2025-06-01T12:00:00.000000Z",
            "topics": [TOPIC_CALL_FOR_USER],
            "decoded": {"parameters": [
                {"name": "from", "value": "0x82a06ebdb97776a2da4041df8f2b2ea8d3257852"},
                {"name": "dest", "value": "0x1111111111111111111111111111111111111111"},
                {"name": "value", "value": "500000000000000000"},
                {"name": "quoteHash", "value": "0xdead"}
            ]}
        });
        let pegin = parse_call_for_user(&log);
        assert_eq!(pegin.value_rbtc, 0.5);
        assert_eq!(pegin.lp_address, "0x82a06ebdb97776a2da4041df8f2b2ea8d3257852");
        assert_eq!(pegin.block_number, 7_500_000);
    }

    #[test]
    fn test_parse_pegout_deposit_from_topics() {
        let quote = "0x1234567890123456789012345678901234567890123456789012345678901234";
        let sender = "0x0000000000000000000000002222222222222222222222222222222222222222";
        // amount word = 1 RBTC, timestamp word after it
        let data = format!(
            "0x{}{}",
            "0000000000000000000000000000000000000000000000000de0b6b3a7640000",
            "0000000000000000000000000000000000000000000000000000000068000000"
        );
        let log = json!({
            "transaction_hash": "0xdef",
            "block_number": 7_600_000,
            "topics": [TOPIC_PEGOUT_DEPOSIT, quote, sender],
            "data": data
        });
        let pegout = parse_pegout_deposit(&log);
        assert_eq!(pegout.amount_rbtc, 1.0);
        assert_eq!(pegout.quote_hash, quote);
        assert_eq!(
            pegout.sender,
            "0x2222222222222222222222222222222222222222"
        );
    }
}
