//! Mempool scan for in-flight mints.

use std::fmt;
use std::sync::Arc;

use crate::config::MempoolConfig;
use crate::inscription::contains_mint_of;
use crate::rpc::NodeApi;

/// Result of a mempool scan for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MempoolStatus {
    /// A pending transaction already mints this tick.
    InFlight,
    Clear,
    /// The mempool could not be listed.
    Unknown,
}

impl fmt::Display for MempoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MempoolStatus::InFlight => "in-flight",
            MempoolStatus::Clear => "clear",
            MempoolStatus::Unknown => "unknown",
        })
    }
}

/// Scans pending transactions for mints of a tick.
pub struct MempoolGuard {
    node: Arc<dyn NodeApi>,
    enabled: bool,
    max_scan: usize,
    unknown_is_gated: bool,
}

impl MempoolGuard {
    pub fn new(node: Arc<dyn NodeApi>, config: &MempoolConfig) -> Self {
        Self {
            node,
            enabled: config.enabled,
            max_scan: config.max_scan,
            unknown_is_gated: config.unknown_is_gated,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Look for a pending mint of `tick` among the first `max_scan` entries.
    pub async fn is_tick_in_flight(&self, tick: &str) -> MempoolStatus {
        let txids = match self.node.get_raw_mempool().await {
            Ok(txids) => txids,
            Err(e) => {
                tracing::warn!(tick = %tick, error = %e, "Mempool listing failed");
                return MempoolStatus::Unknown;
            }
        };

        for txid in txids.iter().take(self.max_scan) {
            let raw = match self.node.get_raw_transaction(txid).await {
                Ok(raw) => raw,
                Err(e) => {
                    // confirmed or evicted since the listing
                    tracing::debug!(txid = %txid, error = %e, "Skipping mempool entry");
                    continue;
                }
            };
            let bytes = match hex::decode(raw.trim()) {
                Ok(bytes) => bytes,
                Err(_) => raw.into_bytes(),
            };
            if contains_mint_of(&bytes, tick) {
                tracing::info!(tick = %tick, txid = %txid, "Mint already pending in mempool");
                return MempoolStatus::InFlight;
            }
        }
        MempoolStatus::Clear
    }

    /// Whether minting `tick` should be skipped this cycle.
    ///
    /// Always `false` when the guard is disabled.
    pub async fn is_gated(&self, tick: &str) -> bool {
        if !self.enabled {
            return false;
        }
        let status = self.is_tick_in_flight(tick).await;
        gates(status, self.unknown_is_gated)
    }
}

/// Gating policy for a scan result.
pub fn gates(status: MempoolStatus, unknown_is_gated: bool) -> bool {
    match status {
        MempoolStatus::InFlight => true,
        MempoolStatus::Clear => false,
        MempoolStatus::Unknown => unknown_is_gated,
    }
}
