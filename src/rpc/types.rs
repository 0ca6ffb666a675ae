//! Node RPC types and error definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::RpcNodeConfig;

/// One node endpoint with its credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct RpcEndpoint {
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl RpcEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user: None,
            password: None,
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }
}

impl From<&RpcNodeConfig> for RpcEndpoint {
    fn from(config: &RpcNodeConfig) -> Self {
        Self {
            url: config.url.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
        }
    }
}

impl std::fmt::Debug for RpcEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcEndpoint")
            .field("url", &self.url)
            .field("user", &self.user)
            .finish()
    }
}

/// Coarse classification of RPC failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcErrorKind {
    Auth,
    Connection,
    NodeBusy,
    Protocol,
}

impl RpcErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcErrorKind::Auth => "auth",
            RpcErrorKind::Connection => "connection",
            RpcErrorKind::NodeBusy => "node_busy",
            RpcErrorKind::Protocol => "protocol",
        }
    }
}

/// JSON-RPC error code for a node still loading its state.
pub const RPC_IN_WARMUP: i64 = -28;

/// Errors that can occur during node RPC calls.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    /// Credentials rejected.
    #[error("RPC authentication rejected by {endpoint}")]
    Auth { endpoint: String },

    /// Endpoint unreachable, timed out, or transport failed.
    #[error("RPC connection to {endpoint} failed: {reason}")]
    Connection { endpoint: String, reason: String },

    /// Endpoint reachable but temporarily refusing work.
    #[error("RPC node {endpoint} busy: {reason}")]
    NodeBusy { endpoint: String, reason: String },

    /// Node answered with an error or an unexpected shape.
    #[error("RPC protocol error{}: {message}", .code.map(|c| format!(" {}", c)).unwrap_or_default())]
    Protocol { code: Option<i64>, message: String },
}

impl RpcError {
    pub fn kind(&self) -> RpcErrorKind {
        match self {
            RpcError::Auth { .. } => RpcErrorKind::Auth,
            RpcError::Connection { .. } => RpcErrorKind::Connection,
            RpcError::NodeBusy { .. } => RpcErrorKind::NodeBusy,
            RpcError::Protocol { .. } => RpcErrorKind::Protocol,
        }
    }

    /// Whether another endpoint might succeed where this one failed.
    pub fn is_failover(&self) -> bool {
        matches!(self.kind(), RpcErrorKind::Connection | RpcErrorKind::NodeBusy)
    }

    /// Whether the node rejected a broadcast because an input is already spent.
    pub fn is_mempool_conflict(&self) -> bool {
        let RpcError::Protocol { message, .. } = self else {
            return false;
        };
        let message = message.to_ascii_lowercase();
        [
            "txn-mempool-conflict",
            "missing inputs",
            "missing-inputs",
            "already spent",
            "missingorspent",
            "bad-txns-inputs-spent",
            "inputs-missingorspent",
        ]
        .iter()
        .any(|needle| message.contains(needle))
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        RpcError::Protocol {
            code: None,
            message: message.into(),
        }
    }
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: &'a [Value],
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// Error object inside a JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Entry returned by `listunspent`.
#[derive(Debug, Clone, Deserialize)]
pub struct UnspentOutput {
    pub txid: String,
    pub vout: u32,
    #[serde(default)]
    pub address: Option<String>,
    pub amount: f64,
    #[serde(default, rename = "amountZat")]
    pub amount_zat: Option<u64>,
    #[serde(default)]
    pub confirmations: u32,
    #[serde(default = "default_spendable")]
    pub spendable: bool,
}

fn default_spendable() -> bool {
    true
}

impl UnspentOutput {
    /// Value in zatoshi, preferring the node's exact integer field.
    pub fn value_zat(&self) -> u64 {
        self.amount_zat.unwrap_or_else(|| coins_to_zat(self.amount))
    }
}

/// Result of `estimatesmartfee`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SmartFeeEstimate {
    /// Coins per kilobyte; absent or negative when the node lacks data.
    #[serde(default)]
    pub feerate: Option<f64>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
    #[serde(default)]
    pub blocks: Option<u32>,
}

/// Result of `signrawtransaction`.
#[derive(Debug, Clone, Deserialize)]
pub struct SignedRawTransaction {
    pub hex: String,
    #[serde(default)]
    pub complete: bool,
}

/// Previous output referenced by `createrawtransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxInputRef {
    pub txid: String,
    pub vout: u32,
}

/// Zatoshi per coin.
pub const ZAT_PER_COIN: u64 = 100_000_000;

/// Convert a node coin amount to zatoshi, rounding to the nearest unit.
pub fn coins_to_zat(amount: f64) -> u64 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0;
    }
    (amount * ZAT_PER_COIN as f64).round() as u64
}

/// Convert zatoshi to the coin amount the node expects.
pub fn zat_to_coins(zat: u64) -> f64 {
    zat as f64 / ZAT_PER_COIN as f64
}
