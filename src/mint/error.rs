//! Mint failures and their classification.

use std::fmt;

use thiserror::Error;

use crate::fees::FeeError;
use crate::inscription::InscriptionError;
use crate::rpc::{RpcError, RpcErrorKind};
use crate::wallet::SelectionError;

/// Flat failure category reported per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Auth,
    Connection,
    NodeBusy,
    Protocol,
    FeeUnavailable,
    NoEligibleWallet,
    InsufficientFunds,
    InvalidTarget,
    PayloadTooLarge,
    MempoolConflict,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Auth => "auth",
            FailureKind::Connection => "connection",
            FailureKind::NodeBusy => "node_busy",
            FailureKind::Protocol => "protocol",
            FailureKind::FeeUnavailable => "fee_unavailable",
            FailureKind::NoEligibleWallet => "no_eligible_wallet",
            FailureKind::InsufficientFunds => "insufficient_funds",
            FailureKind::InvalidTarget => "invalid_target",
            FailureKind::PayloadTooLarge => "payload_too_large",
            FailureKind::MempoolConflict => "mempool_conflict",
        }
    }

    /// Transient kinds worth retrying in place.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FailureKind::Connection | FailureKind::NodeBusy | FailureKind::FeeUnavailable
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RpcErrorKind> for FailureKind {
    fn from(kind: RpcErrorKind) -> Self {
        match kind {
            RpcErrorKind::Auth => FailureKind::Auth,
            RpcErrorKind::Connection => FailureKind::Connection,
            RpcErrorKind::NodeBusy => FailureKind::NodeBusy,
            RpcErrorKind::Protocol => FailureKind::Protocol,
        }
    }
}

/// Errors raised by a mint attempt.
#[derive(Debug, Clone, Error)]
pub enum MintError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Fee(#[from] FeeError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Inscription(#[from] InscriptionError),

    #[error("node could not fully sign the transaction")]
    IncompleteSignature,

    #[error("inputs still conflicting after {restarts} restarts: {last}")]
    MempoolConflict { restarts: u32, last: String },
}

impl MintError {
    pub fn kind(&self) -> FailureKind {
        match self {
            MintError::Rpc(e) => e.kind().into(),
            MintError::Fee(FeeError::FeeUnavailable { .. }) => FailureKind::FeeUnavailable,
            MintError::Selection(SelectionError::NoEligibleWallet(_)) => FailureKind::NoEligibleWallet,
            MintError::Selection(SelectionError::InsufficientFunds { .. }) => {
                FailureKind::InsufficientFunds
            }
            MintError::Selection(SelectionError::Rpc(e)) => e.kind().into(),
            MintError::Inscription(InscriptionError::InvalidTarget(_)) => FailureKind::InvalidTarget,
            MintError::Inscription(InscriptionError::PayloadTooLarge { .. }) => {
                FailureKind::PayloadTooLarge
            }
            MintError::Inscription(InscriptionError::MalformedTransaction(_)) => FailureKind::Protocol,
            MintError::IncompleteSignature => FailureKind::Protocol,
            MintError::MempoolConflict { .. } => FailureKind::MempoolConflict,
        }
    }

    /// Whether the node refused a broadcast because an input is already spent.
    pub fn is_mempool_conflict(&self) -> bool {
        matches!(self, MintError::Rpc(e) if e.is_mempool_conflict())
    }
}

/// Result type for mint operations.
pub type MintResult<T> = Result<T, MintError>;
