//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config.toml (+ optional config.local.toml overlay)
//!     → loader.rs (parse, deep-merge, deserialize)
//!     → validation.rs (semantic checks)
//!     → MinterConfig (validated, immutable)
//!     → handed to each subsystem constructor at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets live in the overlay file and are redacted from Debug output

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_with_overlay, ConfigError};
pub use schema::{
    AutomationConfig, ExternalApiConfig, FeeApiConfig, FeeConfig, MempoolConfig, MintConfig,
    MintTargetConfig, MinterConfig, NetworkConfig, ObservabilityConfig, RetryConfig,
    RpcNodeConfig, SecretsConfig, TickerApiConfig, WalletConfig, WalletStrategy,
};
