//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the minter.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the minter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MinterConfig {
    /// Wallet rotation strategy.
    pub wallet_strategy: WalletStrategy,

    /// Node RPC endpoints and transport tuning.
    pub network: NetworkConfig,

    /// Addresses that may fund mints.
    pub wallets: Vec<WalletConfig>,

    /// Fee estimation settings.
    pub fee: FeeConfig,

    /// Retry and backoff configuration for mint attempts.
    pub retry: RetryConfig,

    /// Mint targets and transaction shaping.
    pub mint: MintConfig,

    /// Mempool duplicate guard.
    pub mempool: MempoolConfig,

    /// External HTTP collaborators.
    pub external_api: ExternalApiConfig,

    /// Automation drivers.
    pub automation: AutomationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Secrets, normally supplied by the local overlay file.
    pub secrets: SecretsConfig,
}

/// How the next funding wallet is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WalletStrategy {
    /// Cycle through the configured wallets in order.
    #[default]
    RoundRobin,
    /// Pick the wallet with the largest confirmed balance.
    Richest,
}

/// Node RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Ordered list of node endpoints (primary first).
    pub rpc_nodes: Vec<RpcNodeConfig>,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,

    /// Pause after every endpoint in the list has failed, in seconds.
    pub retry_wait_secs: u64,

    /// Maximum attempts for one call across all endpoints.
    pub max_attempts: u32,

    /// Optional cap on outgoing calls per second.
    pub rate_limit_per_sec: Option<f64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_nodes: Vec::new(),
            timeout_secs: 10,
            retry_wait_secs: 1,
            max_attempts: 3,
            rate_limit_per_sec: None,
        }
    }
}

/// A single node RPC endpoint.
#[derive(Clone, Deserialize, Serialize)]
pub struct RpcNodeConfig {
    /// Endpoint URL (e.g., "http://127.0.0.1:8232").
    pub url: String,

    /// RPC username.
    #[serde(default)]
    pub user: Option<String>,

    /// RPC password.
    #[serde(default, alias = "pass")]
    pub password: Option<String>,
}

impl std::fmt::Debug for RpcNodeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcNodeConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A funding wallet.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WalletConfig {
    /// Transparent address.
    pub address: String,

    /// Human-readable label for logs (defaults to the address).
    #[serde(default)]
    pub label: Option<String>,
}

/// Fee estimation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Query the node and the external API before falling back to the floor.
    pub dynamic: bool,

    /// Static floor rate in zatoshi per vbyte.
    pub floor_rate: Option<u64>,

    /// Confirmation target passed to `estimatesmartfee`.
    pub target_confirmations: u32,

    /// Upper bound accepted from any dynamic source (zatoshi per vbyte).
    pub max_rate: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            dynamic: true,
            floor_rate: Some(10),
            target_confirmations: 2,
            max_rate: 10_000,
        }
    }
}

/// Retry configuration for mint attempts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries of a single state before the attempt fails.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Whole-attempt restarts allowed after mempool conflicts.
    pub max_restarts: u32,

    /// Add up to 10% random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
            max_restarts: 2,
            jitter: true,
        }
    }
}

/// Mint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MintConfig {
    /// Targets minted each cycle, in order.
    pub targets: Vec<MintTargetConfig>,

    /// Value carried by the inscription output, in zatoshi.
    pub postage_sats: u64,

    /// Minimum confirmations for spendable outputs.
    pub min_confirmations: u32,

    /// Receiving address for inscriptions (defaults to the funding wallet).
    pub destination: Option<String>,

    /// Minimum spacing between two broadcasts, in seconds.
    pub rate_limit_secs: Option<f64>,

    /// Maximum envelope size embedded in a spending script.
    pub max_script_bytes: usize,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            postage_sats: 1000,
            min_confirmations: 1,
            destination: None,
            rate_limit_secs: None,
            max_script_bytes: crate::inscription::DEFAULT_MAX_SCRIPT_BYTES,
        }
    }
}

/// One configured mint target.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MintTargetConfig {
    /// Token tick.
    pub tick: String,

    /// Amount minted per inscription.
    pub amount: u64,

    /// Inscriptions minted per cycle.
    #[serde(default = "default_batch")]
    pub batch: u32,
}

fn default_batch() -> u32 {
    1
}

/// Mempool guard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MempoolConfig {
    /// Scan the mempool before minting each target.
    pub enabled: bool,

    /// Maximum mempool transactions inspected per scan.
    pub max_scan: usize,

    /// Treat a failed scan as "tick in flight".
    pub unknown_is_gated: bool,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_scan: 100,
            unknown_is_gated: false,
        }
    }
}

/// External HTTP APIs.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ExternalApiConfig {
    /// Fee-hint endpoint.
    pub fee: Option<FeeApiConfig>,

    /// Ticker "live" endpoint.
    pub ticker: Option<TickerApiConfig>,
}

/// Fee-hint API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeeApiConfig {
    pub url: String,

    /// JSON field carrying the rate in zatoshi per vbyte.
    #[serde(default = "default_fee_field")]
    pub field: String,

    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

/// Ticker API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TickerApiConfig {
    pub url: String,

    /// JSON field carrying the live flag.
    #[serde(default = "default_live_field")]
    pub field: String,

    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,

    /// Report a tick as live when the API cannot be reached.
    #[serde(default = "default_true")]
    pub assume_live_on_error: bool,
}

fn default_fee_field() -> String {
    "fee".to_string()
}

fn default_live_field() -> String {
    "live".to_string()
}

fn default_api_timeout() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

/// Automation driver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Run the loop driver when no CLI mode is given.
    pub auto_loop: bool,

    /// Loop driver interval in seconds.
    pub loop_interval_secs: u64,

    pub watcher: WatcherConfig,

    pub scheduler: SchedulerConfig,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            auto_loop: false,
            loop_interval_secs: 20,
            watcher: WatcherConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

/// Watcher driver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Run the watcher when no CLI mode is given.
    pub enabled: bool,

    /// Gate polling interval in seconds.
    pub interval_secs: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 10,
        }
    }
}

/// Scheduler driver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Run the scheduler when no CLI mode is given.
    pub enabled: bool,

    /// One job per entry, each firing a full cycle at that interval.
    pub intervals_secs: Vec<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            intervals_secs: vec![60],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}

/// Secrets consumed by the key import helper.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// WIF-encoded private key.
    pub wallet_wif: Option<String>,

    /// Label attached to the imported key in the node wallet.
    pub wallet_label: String,

    /// Ask the node to rescan after importing.
    pub wallet_rescan: bool,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            wallet_wif: None,
            wallet_label: "zordbot".to_string(),
            wallet_rescan: false,
        }
    }
}

impl std::fmt::Debug for SecretsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsConfig")
            .field("wallet_wif", &self.wallet_wif.as_ref().map(|_| "<redacted>"))
            .field("wallet_label", &self.wallet_label)
            .field("wallet_rescan", &self.wallet_rescan)
            .finish()
    }
}
