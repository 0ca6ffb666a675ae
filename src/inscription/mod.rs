//! Inscription encoding subsystem.
//!
//! # Data Flow
//! ```text
//! MintTarget (tick, amount, batch)
//!     → payload.rs (validate, canonical JSON body)
//!     → envelope.rs (ord-style script pushes, size check)
//!     → embed.rs (prepend envelope to the first input's scriptSig)
//! ```
//!
//! # Design Decisions
//! - Encoding is a pure function of the target: same target, same bytes
//! - Oversize payloads are rejected, never truncated
//! - The envelope lives in the spending script; legacy transparent sighash does
//!   not commit to scriptSig, so splicing after signing keeps signatures valid

pub mod embed;
pub mod envelope;
pub mod payload;

use thiserror::Error;

pub use embed::embed_in_first_input;
pub use payload::{build, contains_mint_of, InscriptionPayload, MintTarget};

/// Protocol marker carried in every body.
pub const PROTOCOL: &str = "zrc-20";

/// Content type pushed in the envelope.
pub const CONTENT_TYPE: &str = "application/json";

/// Largest single data push accepted by standard script rules.
pub const MAX_PUSH_BYTES: usize = 520;

/// Standardness limit on the total size of a scriptSig.
pub const MAX_STANDARD_SCRIPTSIG_BYTES: usize = 1650;

/// Room left in the scriptSig for a DER signature and compressed public key.
pub const SIGNATURE_ALLOWANCE_BYTES: usize = 107;

/// Default ceiling on the envelope size.
pub const DEFAULT_MAX_SCRIPT_BYTES: usize = MAX_STANDARD_SCRIPTSIG_BYTES - SIGNATURE_ALLOWANCE_BYTES;

/// Errors raised while building or embedding an inscription.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InscriptionError {
    /// The target violates tick/amount/batch constraints.
    #[error("invalid mint target: {0}")]
    InvalidTarget(String),

    /// The encoded envelope exceeds the script size limit.
    #[error("inscription payload is {size} bytes, limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    /// The transaction returned by the node could not be parsed.
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),
}

/// Result type for inscription operations.
pub type InscriptionResult<T> = Result<T, InscriptionError>;
