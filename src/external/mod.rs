//! External HTTP collaborators.
//!
//! # Data Flow
//! ```text
//! fee_hint.rs: GET <fee url>           → JSON { <field>: rate }  → Fee Estimator
//! ticker.rs:   GET <ticker url>?tick=T → JSON { <field>: bool }  → watcher gate
//! ```
//!
//! # Design Decisions
//! - Responses are untrusted: anything malformed is reported as a failure
//! - Both sources sit behind traits so the engine can run against fakes

pub mod fee_hint;
pub mod ticker;

use thiserror::Error;

pub use fee_hint::{FeeHintSource, HttpFeeHint};
pub use ticker::{HttpTicker, TickerSource};

/// Errors from external HTTP APIs.
#[derive(Debug, Clone, Error)]
pub enum ExternalApiError {
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

/// Result type for external API calls.
pub type ExternalApiResult<T> = Result<T, ExternalApiError>;
