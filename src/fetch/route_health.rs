//! Swap route health fetcher
//!
//! Queries the RSK Swap API for enabled providers, supported tokens and
//! BTC->RBTC limits, checks Flyover operability from the latest flyover
//! snapshot, and records provider additions/removals against the previous
//! route_health snapshot.

use super::SourceFetcher;
use crate::adapters::SwapApiClient;
use crate::config::RouteHealthSourceConfig;
use crate::domain::{
    ChangeKind, FlyoverPayload, PairLimits, ProviderChange, ProviderStatus, RouteHealthPayload,
    SourceId,
};
use crate::error::Result;
use crate::store::SnapshotStore;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{info, warn};

/// RSK mainnet chain id, as the API returns it
const RSK_CHAIN_ID: &str = "30";

pub struct RouteHealthFetcher {
    swap: SwapApiClient,
    store: SnapshotStore,
}

impl RouteHealthFetcher {
    pub fn new(
        config: &RouteHealthSourceConfig,
        store: SnapshotStore,
        http_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            swap: SwapApiClient::new(&config.swap_api_url, http_timeout)?,
            store,
        })
    }

    /// Flyover availability from the latest flyover snapshot, if any.
    /// Defaults to true: absence of data is not evidence of an outage.
    fn flyover_available(&self) -> bool {
        let payload = self
            .store
            .read_snapshot(SourceId::Flyover)
            .ok()
            .flatten()
            .and_then(|s| serde_json::from_value::<FlyoverPayload>(s.data).ok());
        payload
            .and_then(|p| p.lp_info)
            .and_then(|lp| lp.is_operational_pegin)
            .unwrap_or(true)
    }

    /// Providers present in the previous snapshot, for change detection
    fn previous_provider_ids(&self) -> BTreeSet<String> {
        self.store
            .read_snapshot(SourceId::RouteHealth)
            .ok()
            .flatten()
            .and_then(|s| serde_json::from_value::<RouteHealthPayload>(s.data).ok())
            .map(|p| p.providers.into_iter().map(|p| p.provider_id).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SourceFetcher for RouteHealthFetcher {
    fn source(&self) -> SourceId {
        SourceId::RouteHealth
    }

    async fn fetch(&self) -> Result<Value> {
        let providers_raw = self.swap.providers().await?;
        let providers = parse_providers(&providers_raw);

        let token_count = match self.swap.tokens().await {
            Ok(tokens) => tokens.as_array().map(|a| a.len() as u64).unwrap_or(0),
            Err(e) => {
                warn!("Failed to fetch token list: {e}");
                0
            }
        };

        let limits = match self.swap.limits().await {
            Ok(body) => parse_limits(&body),
            Err(e) => {
                warn!("Failed to fetch pair limits: {e}");
                None
            }
        };

        let previous = self.previous_provider_ids();
        let current: BTreeSet<String> =
            providers.iter().map(|p| p.provider_id.clone()).collect();
        let now = Utc::now();
        let mut provider_changes = Vec::new();
        if !previous.is_empty() {
            for added in current.difference(&previous) {
                info!("Provider ADDED: {added}");
                provider_changes.push(ProviderChange {
                    provider: added.clone(),
                    change: ChangeKind::Added,
                    at: now,
                });
            }
            for removed in previous.difference(&current) {
                warn!("Provider REMOVED: {removed}");
                provider_changes.push(ProviderChange {
                    provider: removed.clone(),
                    change: ChangeKind::Removed,
                    at: now,
                });
            }
        }

        let payload = RouteHealthPayload {
            providers,
            token_count,
            limits,
            // Native bridge: available whenever the chain itself is up
            powpeg_available: true,
            flyover_available: self.flyover_available(),
            provider_changes,
        };
        Ok(serde_json::to_value(payload)?)
    }
}

fn parse_providers(body: &Value) -> Vec<ProviderStatus> {
    let Some(items) = body.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|dto| {
            let provider_id = dto.get("providerId")?.as_str()?.to_string();
            let name = dto
                .get("shortName")
                .and_then(Value::as_str)
                .unwrap_or(&provider_id)
                .to_string();
            let pair_count = dto
                .get("supportedPairs")
                .and_then(Value::as_array)
                .map(|pairs| {
                    pairs
                        .iter()
                        .filter(|p| {
                            let from = chain_id(p, "fromNetwork");
                            let to = chain_id(p, "toNetwork");
                            from == RSK_CHAIN_ID || to == RSK_CHAIN_ID
                        })
                        .count() as u64
                })
                .unwrap_or(0);
            Some(ProviderStatus {
                provider_id,
                name,
                enabled: true,
                pair_count,
            })
        })
        .collect()
}

fn chain_id(pair: &Value, key: &str) -> String {
    match pair.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn parse_limits(body: &Value) -> Option<PairLimits> {
    let min_btc = number_field(body, &["min", "minAmount", "min_amount"])?;
    let max_btc = number_field(body, &["max", "maxAmount", "max_amount"])?;
    Some(PairLimits { min_btc, max_btc })
}

fn number_field(body: &Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        if let Some(v) = body.get(key) {
            match v {
                Value::Number(n) => return n.as_f64(),
                Value::String(s) => return s.parse().ok(),
                _ => {}
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_providers_counts_rsk_pairs() {
        let body = json!([
            {
                "providerId": "boltz",
                "shortName": "Boltz",
                "supportedPairs": [
                    {"fromNetwork": "BTC", "toNetwork": "30"},
                    {"fromNetwork": "30", "toNetwork": "BTC"},
                    {"fromNetwork": "1", "toNetwork": "137"}
                ]
            },
            {"providerId": "flyover", "supportedPairs": []}
        ]);
        let providers = parse_providers(&body);
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0].name, "Boltz");
        assert_eq!(providers[0].pair_count, 2);
        assert_eq!(providers[1].name, "flyover");
    }

    #[test]
    fn test_parse_limits_field_variants() {
        assert_eq!(
            parse_limits(&json!({"min": 0.005, "max": 10})),
            Some(PairLimits {
                min_btc: 0.005,
                max_btc: 10.0
            })
        );
        assert_eq!(
            parse_limits(&json!({"minAmount": "0.01", "maxAmount": "5"})),
            Some(PairLimits {
                min_btc: 0.01,
                max_btc: 5.0
            })
        );
        assert_eq!(parse_limits(&json!({"min": 0.005})), None);
    }
}
