//! Mint engine.
//!
//! # Data Flow
//! ```text
//! targets → orchestrator.rs
//!             ├─ mempool guard (once per target) ─→ Skipped
//!             └─ per mint: state.rs machine
//!                  fee → wallet → utxos → createraw → sign + embed → broadcast → Done
//!                  failures → decide() → retry | restart | Failed(kind)
//! ```
//!
//! # Design Decisions
//! - The retry decision is a pure function; waiting goes through an injected sleeper
//! - A mint attempt owns its reservation; dropping the attempt releases it
//! - Targets are independent: one failure never aborts the cycle

pub mod error;
pub mod orchestrator;
pub mod state;

pub use error::{FailureKind, MintError, MintResult};
pub use orchestrator::{CycleReport, MintOrchestrator, MintSettings, TargetOutcome, TargetStatus};
pub use state::{decide, AttemptState, Decision, MintPhase};
