//! Wallet and UTXO selection.
//!
//! # Data Flow
//! ```text
//! configured wallets → selector.rs (round_robin | richest) → Wallet
//! Wallet + required value + fee rate → utxo.rs → UtxoSelection
//!                                                  └─ reservation.rs guard (RAII)
//! ```
//!
//! # Design Decisions
//! - The round-robin cursor only moves when an attempt completes
//! - Reservations live in process memory and are released on drop

pub mod import;
pub mod reservation;
pub mod selector;
pub mod utxo;

use std::fmt;

use thiserror::Error;

use crate::config::WalletConfig;
use crate::rpc::{RpcError, TxInputRef, UnspentOutput};

pub use import::{import_wallet_key, ImportKeyError};
pub use reservation::{ReservationSet, UtxoReservation};
pub use selector::WalletSelector;
pub use utxo::{estimate_vsize, UtxoSelection, UtxoSelector};

/// A spending identity managed by the node's wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    pub label: String,
    pub address: String,
    /// Confirmed balance in zatoshi, when it was queried.
    pub balance: Option<u64>,
}

impl Wallet {
    pub fn new(label: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            address: address.into(),
            balance: None,
        }
    }
}

impl From<&WalletConfig> for Wallet {
    fn from(config: &WalletConfig) -> Self {
        let label = config.label.clone().unwrap_or_else(|| config.address.clone());
        Self::new(label, config.address.clone())
    }
}

/// Reference to a transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutPoint {
    pub txid: String,
    pub vout: u32,
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

impl From<&OutPoint> for TxInputRef {
    fn from(outpoint: &OutPoint) -> Self {
        TxInputRef {
            txid: outpoint.txid.clone(),
            vout: outpoint.vout,
        }
    }
}

/// A spendable output as seen by the selectors. Value in zatoshi.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    pub outpoint: OutPoint,
    pub address: String,
    pub value: u64,
    pub confirmations: u32,
}

impl From<&UnspentOutput> for Utxo {
    fn from(output: &UnspentOutput) -> Self {
        Self {
            outpoint: OutPoint {
                txid: output.txid.clone(),
                vout: output.vout,
            },
            address: output.address.clone().unwrap_or_default(),
            value: output.value_zat(),
            confirmations: output.confirmations,
        }
    }
}

/// Errors from wallet and UTXO selection.
#[derive(Debug, Clone, Error)]
pub enum SelectionError {
    #[error("no eligible wallet: {0}")]
    NoEligibleWallet(String),

    #[error("insufficient funds: {available} zat available, {required} zat required")]
    InsufficientFunds { available: u64, required: u64 },

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Result type for selection.
pub type SelectionResult<T> = Result<T, SelectionError>;
