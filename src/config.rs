use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding snapshot, report and alert state files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between cycles (default: 300)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    300
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub flyover: FlyoverSourceConfig,
    #[serde(default)]
    pub powpeg: PowpegSourceConfig,
    #[serde(default)]
    pub btc_locked: BtcLockedSourceConfig,
    #[serde(default)]
    pub route_health: RouteHealthSourceConfig,
    /// Upper bound on a single fetch step, seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_fetch_timeout_secs() -> u64 {
    120
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            flyover: FlyoverSourceConfig::default(),
            powpeg: PowpegSourceConfig::default(),
            btc_locked: BtcLockedSourceConfig::default(),
            route_health: RouteHealthSourceConfig::default(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlyoverSourceConfig {
    #[serde(default = "default_blockscout_url")]
    pub blockscout_url: String,
    /// LiquidityBridgeContractV2 proxy address
    #[serde(default = "default_lbc_address")]
    pub lbc_address: String,
    /// Oldest block to scan for events
    #[serde(default = "default_flyover_min_block")]
    pub min_block: u64,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Liquidity provider server, queried for real-time balances
    #[serde(default = "default_lps_url")]
    pub lps_url: String,
}

fn default_blockscout_url() -> String {
    "https://rootstock.blockscout.com/api/v2".to_string()
}

fn default_lbc_address() -> String {
    "0xaa9caf1e3967600578727f975f283446a3da6612".to_string()
}

fn default_flyover_min_block() -> u64 {
    7_430_000
}

fn default_lps_url() -> String {
    "https://lps.tekscapital.com/providers/liquidity".to_string()
}

fn default_max_pages() -> u32 {
    100
}

impl Default for FlyoverSourceConfig {
    fn default() -> Self {
        Self {
            blockscout_url: default_blockscout_url(),
            lbc_address: default_lbc_address(),
            min_block: default_flyover_min_block(),
            max_pages: default_max_pages(),
            lps_url: default_lps_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PowpegSourceConfig {
    #[serde(default = "default_blockscout_url")]
    pub blockscout_url: String,
    /// Bridge precompile address
    #[serde(default = "default_bridge_address")]
    pub bridge_address: String,
    #[serde(default = "default_powpeg_min_block")]
    pub min_block: u64,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_bridge_address() -> String {
    "0x0000000000000000000000000000000001000006".to_string()
}

fn default_powpeg_min_block() -> u64 {
    7_230_000
}

impl Default for PowpegSourceConfig {
    fn default() -> Self {
        Self {
            blockscout_url: default_blockscout_url(),
            bridge_address: default_bridge_address(),
            min_block: default_powpeg_min_block(),
            max_pages: default_max_pages(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BtcLockedSourceConfig {
    #[serde(default = "default_blockscout_url")]
    pub blockscout_url: String,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Stop summing contract balances once they drop below this
    #[serde(default = "default_min_balance_rbtc")]
    pub min_balance_rbtc: f64,
}

fn default_min_balance_rbtc() -> f64 {
    0.01
}

impl Default for BtcLockedSourceConfig {
    fn default() -> Self {
        Self {
            blockscout_url: default_blockscout_url(),
            max_pages: default_max_pages(),
            min_balance_rbtc: default_min_balance_rbtc(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteHealthSourceConfig {
    #[serde(default = "default_swap_api_url")]
    pub swap_api_url: String,
}

fn default_swap_api_url() -> String {
    "https://rskswap.mainnet.flyover.rif.technology/api".to_string()
}

impl Default for RouteHealthSourceConfig {
    fn default() -> Self {
        Self {
            swap_api_url: default_swap_api_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    /// JSON array of alert rules; alerting is disabled if the file is absent
    #[serde(default = "default_rules_path")]
    pub rules_path: PathBuf,
}

fn default_rules_path() -> PathBuf {
    PathBuf::from("alert_config.json")
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            rules_path: default_rules_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("ATLAS_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (ATLAS_STORAGE__DATA_DIR, etc.)
            .add_source(
                Environment::with_prefix("ATLAS")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: AppConfig = builder.build()?.try_deserialize()?;

        // Documented single-variable override for the cycle interval
        if let Ok(raw) = std::env::var("ATLAS_INTERVAL_SECS") {
            cfg.scheduler.interval_secs = raw
                .parse()
                .map_err(|_| ConfigError::Message(format!("invalid ATLAS_INTERVAL_SECS: {raw}")))?;
        }

        Ok(cfg)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.scheduler.interval_secs == 0 {
            errors.push("scheduler.interval_secs must be positive".to_string());
        }

        if self.sources.fetch_timeout_secs == 0 {
            errors.push("sources.fetch_timeout_secs must be positive".to_string());
        }

        if self.sources.fetch_timeout_secs >= self.scheduler.interval_secs.max(1) * 6 {
            errors.push(
                "sources.fetch_timeout_secs should be well below the cycle interval".to_string(),
            );
        }

        if self.sources.btc_locked.min_balance_rbtc < 0.0 {
            errors.push("sources.btc_locked.min_balance_rbtc must not be negative".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_complete() {
        let cfg: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.scheduler.interval_secs, 300);
        assert_eq!(cfg.storage.data_dir, PathBuf::from("data"));
        assert_eq!(cfg.sources.flyover.min_block, 7_430_000);
        assert_eq!(cfg.sources.fetch_timeout_secs, 120);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_section_defaults_match_serde_defaults() {
        // Struct-level defaults must agree with the per-field serde defaults,
        // otherwise an absent config section breaks startup validation
        let sources = SourcesConfig::default();
        assert_eq!(sources.fetch_timeout_secs, 120);
        let logging = LoggingConfig::default();
        assert_eq!(logging.level, "info");
        assert!(!logging.json);
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut cfg: AppConfig = serde_json::from_str("{}").unwrap();
        cfg.scheduler.interval_secs = 0;
        let errors = cfg.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("interval_secs")));
    }
}
