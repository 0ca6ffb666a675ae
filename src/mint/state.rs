//! Attempt state machine.
//!
//! ```text
//! Start → FeeQuoted → WalletChosen → UtxoReserved → PayloadBuilt → Signed → Broadcast → Done
//!   ▲                                                                          │
//!   └──────────────────────── restart on mempool conflict ─────────────────────┘
//! ```
//!
//! Any step may end the attempt as `Failed(kind)`.

use std::fmt;
use std::time::Duration;

use crate::fees::FeeQuote;
use crate::mint::error::{FailureKind, MintError};
use crate::resilience::RetryPolicy;
use crate::wallet::{UtxoSelection, Wallet};

/// Named position in an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MintPhase {
    Start,
    FeeQuoted,
    WalletChosen,
    UtxoReserved,
    PayloadBuilt,
    Signed,
    Broadcast,
    Done,
}

impl MintPhase {
    /// The phase reached by a successful step from here.
    pub fn next(self) -> MintPhase {
        match self {
            MintPhase::Start => MintPhase::FeeQuoted,
            MintPhase::FeeQuoted => MintPhase::WalletChosen,
            MintPhase::WalletChosen => MintPhase::UtxoReserved,
            MintPhase::UtxoReserved => MintPhase::PayloadBuilt,
            MintPhase::PayloadBuilt => MintPhase::Signed,
            MintPhase::Signed => MintPhase::Broadcast,
            MintPhase::Broadcast | MintPhase::Done => MintPhase::Done,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MintPhase::Start => "start",
            MintPhase::FeeQuoted => "fee_quoted",
            MintPhase::WalletChosen => "wallet_chosen",
            MintPhase::UtxoReserved => "utxo_reserved",
            MintPhase::PayloadBuilt => "payload_built",
            MintPhase::Signed => "signed",
            MintPhase::Broadcast => "broadcast",
            MintPhase::Done => "done",
        }
    }
}

impl fmt::Display for MintPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data accumulated by an attempt, by phase.
///
/// Holding the state holds the UTXO reservation; dropping it releases it.
#[derive(Debug)]
pub enum AttemptState {
    Start,
    FeeQuoted {
        fee: FeeQuote,
    },
    WalletChosen {
        fee: FeeQuote,
        wallet: Wallet,
    },
    UtxoReserved {
        wallet: Wallet,
        selection: UtxoSelection,
    },
    PayloadBuilt {
        selection: UtxoSelection,
        unsigned_hex: String,
    },
    Signed {
        selection: UtxoSelection,
        signed_hex: String,
    },
    Broadcast {
        selection: UtxoSelection,
        txid: String,
    },
    Done {
        txid: String,
    },
}

impl AttemptState {
    pub fn phase(&self) -> MintPhase {
        match self {
            AttemptState::Start => MintPhase::Start,
            AttemptState::FeeQuoted { .. } => MintPhase::FeeQuoted,
            AttemptState::WalletChosen { .. } => MintPhase::WalletChosen,
            AttemptState::UtxoReserved { .. } => MintPhase::UtxoReserved,
            AttemptState::PayloadBuilt { .. } => MintPhase::PayloadBuilt,
            AttemptState::Signed { .. } => MintPhase::Signed,
            AttemptState::Broadcast { .. } => MintPhase::Broadcast,
            AttemptState::Done { .. } => MintPhase::Done,
        }
    }
}

/// What to do after a failed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Wait, then run the same step again.
    Retry(Duration),
    /// Drop everything and begin again from `Start`.
    Restart,
    /// Give up on this mint.
    Fail(FailureKind),
}

/// Decide how to handle `error` raised while stepping into `step`.
///
/// `retries` counts failures of this step so far; `restarts` counts restarts of
/// the whole attempt.
pub fn decide(
    step: MintPhase,
    error: &MintError,
    retries: u32,
    restarts: u32,
    policy: &RetryPolicy,
) -> Decision {
    if step == MintPhase::Broadcast && error.is_mempool_conflict() {
        return if restarts < policy.max_restarts {
            Decision::Restart
        } else {
            Decision::Fail(FailureKind::MempoolConflict)
        };
    }

    let kind = error.kind();
    if kind.is_transient() && retries < policy.max_retries {
        Decision::Retry(policy.delay_for(retries))
    } else {
        Decision::Fail(kind)
    }
}
