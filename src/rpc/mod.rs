//! Node RPC subsystem.
//!
//! # Data Flow
//! ```text
//! NodeApi (typed calls: listunspent, estimatesmartfee, ...)
//!     → client.rs (sticky failover across the endpoint list)
//!     → rate_limit.rs (optional call pacing)
//!     → transport.rs (one HTTP POST with timeout and error mapping)
//!     → node
//! ```
//!
//! # Security Constraints
//! - Credentials travel only in the basic-auth header
//! - Passwords are redacted from Debug output and never logged
//! - Every call has a bounded timeout; a timeout is a connection failure

pub mod client;
#[cfg(test)]
pub(crate) mod fake;
pub mod node;
pub mod rate_limit;
pub mod transport;
pub mod types;

pub use client::RpcClient;
pub use node::NodeApi;
pub use transport::{HttpTransport, RpcTransport};
pub use types::{
    RpcEndpoint, RpcError, RpcErrorKind, RpcResult, SignedRawTransaction, SmartFeeEstimate,
    TxInputRef, UnspentOutput,
};
