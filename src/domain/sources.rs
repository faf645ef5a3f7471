//! Normalized payload schemas, one per source
//!
//! These are the `data` halves of the snapshot envelopes. Fetchers build
//! them from raw API responses; the report generator reads them back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Flyover (liquidity-provider bridge)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlyoverPayload {
    /// CallForUser events: LP delivered RBTC to the user
    pub pegins: Vec<FlyoverPegin>,
    /// PegOutDeposit events: user deposited RBTC for a peg-out
    pub pegouts: Vec<FlyoverPegout>,
    /// Quote hashes whose peg-out was refunded to the LP (BTC delivered)
    pub pegout_refund_hashes: Vec<String>,
    /// Penalized events: LP slashed
    pub penalties: Vec<Penalty>,
    /// PegOutUserRefunded events: LP failed, user refunded
    pub user_refunds: Vec<UserRefund>,
    /// Real-time liquidity from the LP server, when reachable
    pub lp_info: Option<LpInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlyoverPegin {
    pub tx_hash: String,
    pub block_number: u64,
    #[serde(default)]
    pub block_timestamp: String,
    pub value_rbtc: f64,
    pub dest_address: String,
    pub lp_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlyoverPegout {
    pub tx_hash: String,
    pub block_number: u64,
    #[serde(default)]
    pub block_timestamp: String,
    pub amount_rbtc: f64,
    pub sender: String,
    pub quote_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    pub tx_hash: String,
    pub block_number: u64,
    #[serde(default)]
    pub block_timestamp: String,
    pub lp_address: String,
    pub penalty_rbtc: f64,
    pub quote_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRefund {
    pub tx_hash: String,
    pub block_number: u64,
    #[serde(default)]
    pub block_timestamp: String,
    pub user_address: String,
    pub value_rbtc: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpInfo {
    pub lp_name: String,
    pub pegin_rbtc: f64,
    pub pegout_btc: f64,
    #[serde(default)]
    pub btc_utxo_count: Option<u64>,
    #[serde(default)]
    pub is_operational_pegin: Option<bool>,
    #[serde(default)]
    pub is_operational_pegout: Option<bool>,
    pub fetched_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// PowPeg (native bridge)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowpegPayload {
    /// RBTC credits from the Bridge precompile (peg-in completions)
    pub pegins: Vec<PowpegPegin>,
    /// release_request_received events (peg-out initiations)
    pub pegouts: Vec<PowpegPegout>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowpegPegin {
    pub tx_hash: String,
    pub block_number: u64,
    #[serde(default)]
    pub block_timestamp: String,
    pub value_rbtc: f64,
    pub to_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowpegPegout {
    pub tx_hash: String,
    pub block_number: u64,
    #[serde(default)]
    pub block_timestamp: String,
    pub value_rbtc: f64,
    pub from_address: String,
    #[serde(default)]
    pub btc_destination: String,
}

// ---------------------------------------------------------------------------
// Aggregate locked-BTC statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BtcLockedPayload {
    /// rootstock_locked_btc from /stats, converted from wei
    pub total_bridged_rbtc: Option<f64>,
    /// Sum of contract address balances above the configured floor
    pub contract_locked_rbtc: f64,
    pub contract_count: u64,
}

// ---------------------------------------------------------------------------
// Swap route health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteHealthPayload {
    pub providers: Vec<ProviderStatus>,
    pub token_count: u64,
    /// BTC -> RBTC reference-pair limits, when the API reports them
    pub limits: Option<PairLimits>,
    /// PowPeg is the native bridge; available whenever the chain runs
    pub powpeg_available: bool,
    pub flyover_available: bool,
    /// Providers added/removed since the previous snapshot
    pub provider_changes: Vec<ProviderChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub provider_id: String,
    pub name: String,
    pub enabled: bool,
    pub pair_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairLimits {
    pub min_btc: f64,
    pub max_btc: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderChange {
    pub provider: String,
    pub change: ChangeKind,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
}
