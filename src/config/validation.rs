//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, intervals > 0, delays ordered)
//! - Check that every endpoint URL parses and every target is well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MinterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::MinterConfig;
use crate::inscription::MintTarget;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &MinterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.network.rpc_nodes.is_empty() {
        errors.push(ValidationError::new(
            "network.rpc_nodes",
            "at least one RPC node must be configured",
        ));
    }
    for (i, node) in config.network.rpc_nodes.iter().enumerate() {
        if let Err(e) = Url::parse(&node.url) {
            errors.push(ValidationError::new(
                format!("network.rpc_nodes[{}].url", i),
                format!("invalid URL '{}': {}", node.url, e),
            ));
        }
    }
    if config.network.timeout_secs == 0 {
        errors.push(ValidationError::new("network.timeout_secs", "must be > 0"));
    }
    if config.network.max_attempts == 0 {
        errors.push(ValidationError::new("network.max_attempts", "must be > 0"));
    }
    if let Some(rate) = config.network.rate_limit_per_sec {
        if !(rate.is_finite() && rate > 0.0) {
            errors.push(ValidationError::new(
                "network.rate_limit_per_sec",
                "must be a positive number",
            ));
        }
    }

    if config.wallets.is_empty() {
        errors.push(ValidationError::new("wallets", "at least one wallet must be configured"));
    }
    for (i, wallet) in config.wallets.iter().enumerate() {
        if wallet.address.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("wallets[{}].address", i),
                "must not be empty",
            ));
        }
    }

    if config.mint.targets.is_empty() {
        errors.push(ValidationError::new("mint.targets", "at least one target must be configured"));
    }
    for (i, target) in config.mint.targets.iter().enumerate() {
        let target = MintTarget::new(target.tick.clone(), target.amount, target.batch);
        if let Err(e) = target.validate() {
            errors.push(ValidationError::new(format!("mint.targets[{}]", i), e.to_string()));
        }
    }
    if config.mint.postage_sats == 0 {
        errors.push(ValidationError::new("mint.postage_sats", "must be > 0"));
    }

    if config.retry.base_delay_ms > config.retry.max_delay_ms {
        errors.push(ValidationError::new(
            "retry.base_delay_ms",
            "must not exceed retry.max_delay_ms",
        ));
    }

    if !config.fee.dynamic && config.fee.floor_rate.is_none() {
        errors.push(ValidationError::new(
            "fee.floor_rate",
            "required when fee.dynamic is false",
        ));
    }

    if let Some(api) = &config.external_api.fee {
        if let Err(e) = Url::parse(&api.url) {
            errors.push(ValidationError::new("external_api.fee.url", e.to_string()));
        }
    }
    if let Some(api) = &config.external_api.ticker {
        if let Err(e) = Url::parse(&api.url) {
            errors.push(ValidationError::new("external_api.ticker.url", e.to_string()));
        }
    }

    if config.automation.loop_interval_secs == 0 {
        errors.push(ValidationError::new("automation.loop_interval_secs", "must be > 0"));
    }
    if config.automation.watcher.interval_secs == 0 {
        errors.push(ValidationError::new("automation.watcher.interval_secs", "must be > 0"));
    }
    if config.automation.scheduler.intervals_secs.iter().any(|s| *s == 0) {
        errors.push(ValidationError::new(
            "automation.scheduler.intervals_secs",
            "every interval must be > 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
