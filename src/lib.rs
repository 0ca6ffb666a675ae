//! ZRC-20 mint orchestration engine.
//!
//! Drives a Zcash-compatible node over JSON-RPC to build, sign and broadcast
//! inscription transactions that mint ZRC-20 tokens.

// Core engine
pub mod fees;
pub mod inscription;
pub mod mempool;
pub mod mint;
pub mod wallet;

// Collaborators
pub mod external;
pub mod rpc;

// Cross-cutting concerns
pub mod automation;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::MinterConfig;
pub use lifecycle::{Runtime, Shutdown};
pub use mint::{CycleReport, MintOrchestrator, TargetStatus};
