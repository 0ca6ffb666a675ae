//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config + overlay → Validate → Build RPC client, APIs, orchestrator
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every driver's select! wakes → in-flight cycle dropped → exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and maps to exit status 2
//! - Dropping an in-flight cycle releases its UTXO reservations

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::spawn_signal_handler;
pub use startup::{build_runtime, load_and_validate, Runtime, StartupError};
