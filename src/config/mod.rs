use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub explorer: ExplorerConfig,
    #[serde(default)]
    pub names: NamesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerConfig {
    /// Etherscan v2 REST API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Chain to query (8453 = Base mainnet)
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// API key - loaded from env ETHERSCAN_API_KEY
    #[serde(default)]
    pub api_key: String,
    /// Page size for the transaction list endpoint
    #[serde(default = "default_tx_page_size")]
    pub tx_page_size: u32,
    /// Page size for the token / NFT transfer endpoints
    #[serde(default = "default_transfer_page_size")]
    pub transfer_page_size: u32,
    /// Maximum attempts per request before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay for exponential backoff between attempts
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Pause between the token-transfer and NFT-transfer calls
    /// (keeps us under the explorer's requests-per-second cap)
    #[serde(default = "default_transfer_pause_ms")]
    pub transfer_pause_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamesConfig {
    /// Enable ENS / Base name enrichment.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ethereum mainnet JSON-RPC endpoint for ENS reverse lookups
    #[serde(default = "default_eth_rpc_url")]
    pub eth_rpc_url: String,
    /// NameSYS reverse-resolution REST API
    #[serde(default = "default_name_api_url")]
    pub name_api_url: String,
    /// Timeout for each name lookup
    #[serde(default = "default_name_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_api_url() -> String {
    "https://api.etherscan.io/v2/api".to_string()
}
fn default_chain_id() -> u64 {
    8453
}
fn default_tx_page_size() -> u32 {
    500
}
fn default_transfer_page_size() -> u32 {
    1000
}
fn default_max_attempts() -> u32 {
    5
}
fn default_base_backoff_ms() -> u64 {
    200
}
fn default_request_timeout_secs() -> u64 {
    15
}
fn default_transfer_pause_ms() -> u64 {
    150
}
fn default_true() -> bool {
    true
}
fn default_eth_rpc_url() -> String {
    "https://eth.llamarpc.com".to_string()
}
fn default_name_api_url() -> String {
    "https://api.namesys.xyz".to_string()
}
fn default_name_timeout_secs() -> u64 {
    5
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            chain_id: default_chain_id(),
            api_key: String::new(),
            tx_page_size: default_tx_page_size(),
            transfer_page_size: default_transfer_page_size(),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            transfer_pause_ms: default_transfer_pause_ms(),
        }
    }
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            eth_rpc_url: default_eth_rpc_url(),
            name_api_url: default_name_api_url(),
            timeout_secs: default_name_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Load config from a TOML file, then overlay environment variables for secrets.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.apply_env();
        Ok(config)
    }

    /// Load a default config with env-only overrides (no file needed).
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Ok(url) = std::env::var("BASECARD_API_URL") {
            config.explorer.api_url = url;
        }
        if let Ok(rpc) = std::env::var("BASECARD_ETH_RPC_URL") {
            config.names.eth_rpc_url = rpc;
        }
        config.apply_env();
        config
    }

    /// Override secrets from environment variables (never store in config file)
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("ETHERSCAN_API_KEY") {
            self.explorer.api_key = key;
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.explorer.api_key.is_empty()
    }
}
