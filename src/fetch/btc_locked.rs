//! Aggregate locked-BTC fetcher
//!
//! Total bridged RBTC comes from Blockscout `/stats`; the contract-held
//! share is summed by walking the richest addresses until balances drop
//! below the configured floor.

use super::SourceFetcher;
use crate::adapters::blockscout::{wei_to_rbtc, BlockscoutClient, PageParams};
use crate::config::BtcLockedSourceConfig;
use crate::domain::{BtcLockedPayload, SourceId};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub struct BtcLockedFetcher {
    blockscout: BlockscoutClient,
    config: BtcLockedSourceConfig,
}

impl BtcLockedFetcher {
    pub fn new(config: &BtcLockedSourceConfig, http_timeout: Duration) -> Result<Self> {
        Ok(Self {
            blockscout: BlockscoutClient::new(&config.blockscout_url, http_timeout)?,
            config: config.clone(),
        })
    }

    async fn total_bridged(&self) -> Result<Option<f64>> {
        let stats = self.blockscout.stats().await?;
        let total = stats
            .get("rootstock_locked_btc")
            .and_then(Value::as_str)
            .and_then(wei_to_rbtc);
        if total.is_none() {
            warn!("rootstock_locked_btc not present in /stats response");
        }
        Ok(total)
    }

    /// Sum contract balances from the richest-address listing
    async fn contract_balances(&self) -> Result<(f64, u64)> {
        let mut total = 0.0;
        let mut count = 0u64;
        let mut params: PageParams = Vec::new();

        for page in 1..=self.config.max_pages {
            debug!("Fetching addresses page {}", page);
            let (items, next) = self.blockscout.page("addresses", &params).await?;
            let mut below_floor = false;

            for item in &items {
                let balance = item
                    .get("coin_balance")
                    .and_then(Value::as_str)
                    .and_then(wei_to_rbtc)
                    .unwrap_or(0.0);
                // Listing is sorted by balance; once below the floor, the
                // remaining tail is noise
                if balance < self.config.min_balance_rbtc {
                    below_floor = true;
                    break;
                }
                if item.get("is_contract").and_then(Value::as_bool) == Some(true) {
                    total += balance;
                    count += 1;
                }
            }

            match next {
                Some(next) if !below_floor && !items.is_empty() => params = next,
                _ => break,
            }
        }

        Ok((total, count))
    }
}

#[async_trait]
impl SourceFetcher for BtcLockedFetcher {
    fn source(&self) -> SourceId {
        SourceId::BtcLocked
    }

    async fn fetch(&self) -> Result<Value> {
        let total_bridged_rbtc = self.total_bridged().await?;
        let (contract_locked_rbtc, contract_count) = self.contract_balances().await?;

        let payload = BtcLockedPayload {
            total_bridged_rbtc,
            contract_locked_rbtc,
            contract_count,
        };
        Ok(serde_json::to_value(payload)?)
    }
}
