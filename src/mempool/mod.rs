//! Mempool awareness.
//!
//! Detects mints of a tick that are already waiting for confirmation so the
//! engine does not stack duplicates behind them.

pub mod guard;

pub use guard::{MempoolGuard, MempoolStatus};
