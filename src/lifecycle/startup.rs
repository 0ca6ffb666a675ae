//! Startup wiring.
//!
//! # Responsibilities
//! - Load, merge and validate configuration
//! - Build the RPC client, external API clients and the orchestrator
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems are built in dependency order: node, APIs, engine

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::{load_config_with_overlay, ConfigError, MinterConfig};
use crate::external::{ExternalApiError, FeeHintSource, HttpFeeHint, HttpTicker, TickerSource};
use crate::inscription::MintTarget;
use crate::mint::MintOrchestrator;
use crate::rpc::{NodeApi, RpcClient, RpcError};

/// Errors that prevent the engine from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialize RPC client: {0}")]
    Rpc(#[from] RpcError),

    #[error("failed to initialize external API client: {0}")]
    External(#[from] ExternalApiError),
}

/// Everything the drivers need, built once at startup.
pub struct Runtime {
    pub config: MinterConfig,
    pub node: Arc<dyn NodeApi>,
    pub ticker: Option<Arc<dyn TickerSource>>,
    pub targets: Vec<MintTarget>,
    pub orchestrator: Arc<Mutex<MintOrchestrator>>,
}

impl Runtime {
    /// Assemble a runtime around already-built collaborators.
    pub fn assemble(
        config: MinterConfig,
        node: Arc<dyn NodeApi>,
        fee_hint: Option<Arc<dyn FeeHintSource>>,
        ticker: Option<Arc<dyn TickerSource>>,
    ) -> Self {
        let orchestrator = MintOrchestrator::new(node.clone(), fee_hint, &config);
        let targets = config.mint.targets.iter().map(MintTarget::from).collect();
        Self {
            node,
            ticker,
            targets,
            orchestrator: Arc::new(Mutex::new(orchestrator)),
            config,
        }
    }
}

/// Load the base config and optional overlay, then validate.
pub fn load_and_validate(base: &Path, overlay: Option<&Path>) -> Result<MinterConfig, StartupError> {
    let config = load_config_with_overlay(base, overlay)?;
    tracing::info!(
        rpc_nodes = config.network.rpc_nodes.len(),
        wallets = config.wallets.len(),
        targets = config.mint.targets.len(),
        strategy = ?config.wallet_strategy,
        "Configuration loaded"
    );
    Ok(config)
}

/// Build the production runtime from a validated config.
pub fn build_runtime(config: MinterConfig) -> Result<Runtime, StartupError> {
    let node: Arc<dyn NodeApi> = Arc::new(RpcClient::from_config(&config.network)?);

    let fee_hint = match &config.external_api.fee {
        Some(api) => Some(Arc::new(HttpFeeHint::new(api)?) as Arc<dyn FeeHintSource>),
        None => None,
    };
    let ticker = match &config.external_api.ticker {
        Some(api) => Some(Arc::new(HttpTicker::new(api)?) as Arc<dyn TickerSource>),
        None => None,
    };

    Ok(Runtime::assemble(config, node, fee_hint, ticker))
}
