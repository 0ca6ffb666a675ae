//! Fee estimation.
//!
//! # Data Flow
//! ```text
//! estimatesmartfee ──(no data / error)──> external fee hint ──(error)──> static floor
//!        │                                       │                          │
//!        └────────────── FeeQuote { rate, source } ◄────────────────────────┘
//! ```
//!
//! Rates are zatoshi per vbyte throughout.

pub mod estimator;

use thiserror::Error;

pub use estimator::{FeeEstimator, FeeQuote, FeeSource};

/// Errors from fee estimation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    /// Every dynamic source failed and no floor is configured.
    #[error("no fee source available for {target} confirmations")]
    FeeUnavailable { target: u32 },
}

/// Result type for fee estimation.
pub type FeeResult<T> = Result<T, FeeError>;
