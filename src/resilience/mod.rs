//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Failed collaborator call inside a mint attempt:
//!     → mint::state::decide (retry, restart or fail, bounded by retries.rs)
//!     → backoff.rs (base × 2^retry, capped, optional jitter)
//!     → sleeper.rs (injected delay, cancellable)
//! ```
//!
//! # Design Decisions
//! - Every node call already carries a timeout in the RPC transport
//! - Retry decisions are pure; only the sleeper touches time
//! - Tests inject a recording sleeper instead of waiting

pub mod backoff;
pub mod retries;
pub mod sleeper;

pub use backoff::{backoff_delay, calculate_backoff};
pub use retries::RetryPolicy;
pub use sleeper::{RecordingSleeper, Sleeper, TokioSleeper};
