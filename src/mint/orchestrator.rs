//! Mint orchestrator: runs targets through the attempt state machine.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::MinterConfig;
use crate::external::FeeHintSource;
use crate::fees::{FeeEstimator, FeeQuote};
use crate::inscription::{self, embed_in_first_input, InscriptionPayload, MintTarget};
use crate::mempool::MempoolGuard;
use crate::mint::error::{FailureKind, MintError, MintResult};
use crate::mint::state::{decide, AttemptState, Decision, MintPhase};
use crate::observability::metrics;
use crate::resilience::{RetryPolicy, Sleeper, TokioSleeper};
use crate::rpc::{NodeApi, TxInputRef};
use crate::wallet::utxo::SpendShape;
use crate::wallet::{ReservationSet, UtxoSelector, WalletSelector};

/// Change below this many zatoshi is left to the fee.
pub const DUST_THRESHOLD: u64 = 546;

/// Outputs the fee is sized for: postage and change.
const FEE_OUTPUTS: usize = 2;

/// Final state of one target in a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    /// Every mint of the batch was broadcast.
    Done { txids: Vec<String> },
    /// Not attempted this cycle.
    Skipped { reason: String },
    /// A mint failed; earlier mints of the batch may have been broadcast.
    Failed {
        kind: FailureKind,
        error: String,
        txids: Vec<String>,
    },
}

impl TargetStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TargetStatus::Done { .. } => "done",
            TargetStatus::Skipped { .. } => "skipped",
            TargetStatus::Failed { .. } => "failed",
        }
    }
}

/// Outcome of one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutcome {
    pub tick: String,
    pub status: TargetStatus,
}

/// Outcomes of one cycle, in target order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub outcomes: Vec<TargetOutcome>,
}

impl CycleReport {
    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.status, TargetStatus::Failed { .. }))
    }

    pub fn count(&self, label: &str) -> usize {
        self.outcomes.iter().filter(|o| o.status.label() == label).count()
    }
}

/// Per-mint knobs taken from `[mint]` and `[fee]`.
#[derive(Debug, Clone)]
pub struct MintSettings {
    pub postage: u64,
    pub destination: Option<String>,
    pub target_confirmations: u32,
    pub min_confirmations: u32,
    pub max_script_bytes: usize,
    pub broadcast_spacing: Option<Duration>,
}

impl From<&MinterConfig> for MintSettings {
    fn from(config: &MinterConfig) -> Self {
        Self {
            postage: config.mint.postage_sats,
            destination: config.mint.destination.clone(),
            target_confirmations: config.fee.target_confirmations,
            min_confirmations: config.mint.min_confirmations,
            max_script_bytes: config.mint.max_script_bytes,
            broadcast_spacing: config
                .mint
                .rate_limit_secs
                .filter(|s| s.is_finite() && *s > 0.0)
                .map(Duration::from_secs_f64),
        }
    }
}

/// Owns every collaborator of a mint and the rotation state.
pub struct MintOrchestrator {
    node: Arc<dyn NodeApi>,
    fees: FeeEstimator,
    wallets: WalletSelector,
    utxos: UtxoSelector,
    mempool: MempoolGuard,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    settings: MintSettings,
    last_broadcast: Option<Instant>,
}

impl MintOrchestrator {
    pub fn new(
        node: Arc<dyn NodeApi>,
        fee_hint: Option<Arc<dyn FeeHintSource>>,
        config: &MinterConfig,
    ) -> Self {
        Self {
            fees: FeeEstimator::new(node.clone(), fee_hint, &config.fee),
            wallets: WalletSelector::from_config(config),
            utxos: UtxoSelector::new(ReservationSet::new(), config.mint.min_confirmations),
            mempool: MempoolGuard::new(node.clone(), &config.mempool),
            sleeper: Arc::new(TokioSleeper),
            policy: RetryPolicy::from(&config.retry),
            settings: MintSettings::from(config),
            last_broadcast: None,
            node,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn wallet_selector(&self) -> &WalletSelector {
        &self.wallets
    }

    pub fn reservations(&self) -> &Arc<ReservationSet> {
        self.utxos.reservations()
    }

    pub fn mempool(&self) -> &MempoolGuard {
        &self.mempool
    }

    /// Run every target once, in order. Never fails as a whole.
    pub async fn run_cycle(&mut self, targets: &[MintTarget]) -> CycleReport {
        let mut report = CycleReport::default();
        for target in targets {
            let status = self.run_target(target).await;
            metrics::record_mint_outcome(status.label(), &target.tick);
            match &status {
                TargetStatus::Done { txids } => {
                    tracing::info!(tick = %target.tick, txids = ?txids, "Target minted")
                }
                TargetStatus::Skipped { reason } => {
                    tracing::info!(tick = %target.tick, reason = %reason, "Target skipped")
                }
                TargetStatus::Failed { kind, error, .. } => {
                    tracing::error!(tick = %target.tick, kind = %kind, error = %error, "Target failed")
                }
            }
            report.outcomes.push(TargetOutcome {
                tick: target.tick.clone(),
                status,
            });
        }
        report
    }

    /// Mint one target, consulting the mempool guard first.
    pub async fn run_target(&mut self, target: &MintTarget) -> TargetStatus {
        let payload = match inscription::build(target, self.settings.max_script_bytes) {
            Ok(payload) => payload,
            Err(e) => {
                let error = MintError::from(e);
                return TargetStatus::Failed {
                    kind: error.kind(),
                    error: error.to_string(),
                    txids: Vec::new(),
                };
            }
        };

        if self.mempool.is_gated(&target.tick).await {
            return TargetStatus::Skipped {
                reason: "mint already pending in mempool".to_string(),
            };
        }

        let mut txids = Vec::new();
        for index in 0..target.batch {
            match self.mint_once(target, &payload, index).await {
                Ok(txid) => txids.push(txid),
                Err(error) => {
                    return TargetStatus::Failed {
                        kind: error.kind(),
                        error: error.to_string(),
                        txids,
                    }
                }
            }
        }
        TargetStatus::Done { txids }
    }

    /// One mint attempt, including its retries and restarts.
    ///
    /// The wallet cursor advances when the attempt ends, successfully or not.
    pub async fn mint_once(
        &mut self,
        target: &MintTarget,
        payload: &InscriptionPayload,
        index: u32,
    ) -> MintResult<String> {
        let attempt_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "mint_attempt",
            attempt_id = %attempt_id,
            tick = %target.tick,
            batch_index = index
        );
        let result = self.drive(target, payload).instrument(span).await;
        self.wallets.advance();
        result
    }

    async fn drive(&mut self, target: &MintTarget, payload: &InscriptionPayload) -> MintResult<String> {
        let mut restarts = 0;
        'attempt: loop {
            let mut state = AttemptState::Start;
            let mut retries = 0;
            loop {
                if let AttemptState::Done { txid } = state {
                    return Ok(txid);
                }
                let step = state.phase().next();
                match self.advance(state, target, payload).await {
                    Ok(next) => {
                        tracing::debug!(phase = %step, "Step complete");
                        state = next;
                        retries = 0;
                    }
                    Err((previous, error)) => match decide(step, &error, retries, restarts, &self.policy) {
                        Decision::Retry(delay) => {
                            tracing::warn!(
                                phase = %step,
                                retry = retries + 1,
                                delay_ms = delay.as_millis() as u64,
                                error = %error,
                                "Step failed, retrying"
                            );
                            self.sleeper.sleep(delay).await;
                            retries += 1;
                            state = previous;
                        }
                        Decision::Restart => {
                            restarts += 1;
                            tracing::warn!(restart = restarts, error = %error, "Inputs conflict, restarting attempt");
                            drop(previous);
                            continue 'attempt;
                        }
                        Decision::Fail(FailureKind::MempoolConflict) if !matches!(error, MintError::MempoolConflict { .. }) => {
                            return Err(MintError::MempoolConflict {
                                restarts,
                                last: error.to_string(),
                            });
                        }
                        Decision::Fail(_) => return Err(error),
                    },
                }
            }
        }
    }

    /// Run the single collaborator call that leaves `state`.
    ///
    /// On failure the unchanged state is handed back with the error.
    async fn advance(
        &mut self,
        state: AttemptState,
        target: &MintTarget,
        payload: &InscriptionPayload,
    ) -> Result<AttemptState, (AttemptState, MintError)> {
        match state {
            AttemptState::Start => match self.fees.quote(self.settings.target_confirmations).await {
                Ok(fee) => Ok(AttemptState::FeeQuoted { fee }),
                Err(e) => Err((AttemptState::Start, e.into())),
            },

            AttemptState::FeeQuoted { fee } => {
                let required = self.spend_shape(&fee, payload).needed(1);
                match self
                    .wallets
                    .select(
                        self.node.as_ref(),
                        self.settings.min_confirmations,
                        required,
                        self.utxos.reservations(),
                    )
                    .await
                {
                    Ok(wallet) => {
                        tracing::info!(wallet = %wallet.label, fee_rate = fee.rate, source = %fee.source, "Wallet chosen");
                        Ok(AttemptState::WalletChosen { fee, wallet })
                    }
                    Err(e) => Err((AttemptState::FeeQuoted { fee }, e.into())),
                }
            }

            AttemptState::WalletChosen { fee, wallet } => {
                let shape = self.spend_shape(&fee, payload);
                match self.utxos.select(self.node.as_ref(), &wallet, shape).await {
                    Ok(selection) => Ok(AttemptState::UtxoReserved { wallet, selection }),
                    Err(e) => Err((AttemptState::WalletChosen { fee, wallet }, e.into())),
                }
            }

            AttemptState::UtxoReserved { wallet, selection } => {
                let inputs: Vec<TxInputRef> = selection
                    .utxos
                    .iter()
                    .map(|u| TxInputRef::from(&u.outpoint))
                    .collect();
                let destination = self
                    .settings
                    .destination
                    .clone()
                    .unwrap_or_else(|| wallet.address.clone());
                let outputs = plan_outputs(
                    &destination,
                    &wallet.address,
                    self.settings.postage,
                    selection.total(),
                    selection.fee,
                );
                match self.node.create_raw_transaction(&inputs, &outputs).await {
                    Ok(unsigned_hex) => Ok(AttemptState::PayloadBuilt {
                        selection,
                        unsigned_hex,
                    }),
                    Err(e) => Err((AttemptState::UtxoReserved { wallet, selection }, e.into())),
                }
            }

            AttemptState::PayloadBuilt {
                selection,
                unsigned_hex,
            } => {
                let signed = match self.node.sign_raw_transaction(&unsigned_hex).await {
                    Ok(signed) if signed.complete => signed,
                    Ok(_) => {
                        return Err((
                            AttemptState::PayloadBuilt {
                                selection,
                                unsigned_hex,
                            },
                            MintError::IncompleteSignature,
                        ))
                    }
                    Err(e) => {
                        return Err((
                            AttemptState::PayloadBuilt {
                                selection,
                                unsigned_hex,
                            },
                            e.into(),
                        ))
                    }
                };
                match embed_in_first_input(&signed.hex, payload.script()) {
                    Ok(signed_hex) => Ok(AttemptState::Signed {
                        selection,
                        signed_hex,
                    }),
                    Err(e) => Err((
                        AttemptState::PayloadBuilt {
                            selection,
                            unsigned_hex,
                        },
                        e.into(),
                    )),
                }
            }

            AttemptState::Signed {
                selection,
                signed_hex,
            } => {
                self.pace_broadcast().await;
                match self.node.send_raw_transaction(&signed_hex).await {
                    Ok(txid) => {
                        self.last_broadcast = Some(Instant::now());
                        tracing::info!(txid = %txid, tick = %target.tick, "Mint broadcast");
                        Ok(AttemptState::Broadcast { selection, txid })
                    }
                    Err(e) => Err((
                        AttemptState::Signed {
                            selection,
                            signed_hex,
                        },
                        e.into(),
                    )),
                }
            }

            AttemptState::Broadcast { selection, txid } => {
                selection.reservation.consume();
                Ok(AttemptState::Done { txid })
            }

            AttemptState::Done { txid } => Ok(AttemptState::Done { txid }),
        }
    }

    fn spend_shape(&self, fee: &FeeQuote, payload: &InscriptionPayload) -> SpendShape {
        SpendShape {
            required: self.settings.postage,
            fee_rate: fee.rate,
            outputs: FEE_OUTPUTS,
            inscription_bytes: payload.len(),
        }
    }

    /// Hold the next broadcast until the configured spacing has passed.
    async fn pace_broadcast(&self) {
        let (Some(spacing), Some(last)) = (self.settings.broadcast_spacing, self.last_broadcast) else {
            return;
        };
        let elapsed = last.elapsed();
        if elapsed < spacing {
            let wait = spacing - elapsed;
            tracing::debug!(wait_ms = wait.as_millis() as u64, "Pacing broadcast");
            self.sleeper.sleep(wait).await;
        }
    }
}

/// Output map for a mint spending `total` with `fee`.
///
/// Postage goes to `destination`, the rest back to `change_address`. Change
/// under [`DUST_THRESHOLD`] is dropped into the fee.
pub fn plan_outputs(
    destination: &str,
    change_address: &str,
    postage: u64,
    total: u64,
    fee: u64,
) -> BTreeMap<String, u64> {
    let change = total.saturating_sub(postage).saturating_sub(fee);
    let mut outputs = BTreeMap::new();
    outputs.insert(destination.to_string(), postage);
    if change >= DUST_THRESHOLD {
        *outputs.entry(change_address.to_string()).or_insert(0) += change;
    }
    outputs
}
