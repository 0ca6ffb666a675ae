//! UTXO selection and the transaction size model.

use std::collections::HashSet;
use std::sync::Arc;

use crate::rpc::NodeApi;
use crate::wallet::{
    OutPoint, ReservationSet, SelectionError, SelectionResult, Utxo, UtxoReservation, Wallet,
};

const BASE_VBYTES: u64 = 10;
const INPUT_VBYTES: u64 = 148;
const OUTPUT_VBYTES: u64 = 34;

/// Estimated virtual size of a transparent transaction carrying an inscription.
pub fn estimate_vsize(inputs: usize, outputs: usize, inscription_bytes: usize) -> u64 {
    BASE_VBYTES + INPUT_VBYTES * inputs as u64 + OUTPUT_VBYTES * outputs as u64 + inscription_bytes as u64
}

/// Outputs chosen for one attempt, held by a reservation.
#[derive(Debug)]
pub struct UtxoSelection {
    pub utxos: Vec<Utxo>,
    /// Fee in zatoshi for the selected input count.
    pub fee: u64,
    pub reservation: UtxoReservation,
}

impl UtxoSelection {
    pub fn total(&self) -> u64 {
        self.utxos.iter().map(|u| u.value).sum()
    }
}

/// Shape of the transaction the selection has to pay for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendShape {
    /// Value sent to outputs other than change.
    pub required: u64,
    pub fee_rate: u64,
    pub outputs: usize,
    pub inscription_bytes: usize,
}

impl SpendShape {
    pub fn fee_for(&self, inputs: usize) -> u64 {
        estimate_vsize(inputs, self.outputs, self.inscription_bytes).saturating_mul(self.fee_rate)
    }

    /// Value plus fee for `inputs` inputs.
    pub fn needed(&self, inputs: usize) -> u64 {
        self.required.saturating_add(self.fee_for(inputs))
    }
}

/// Chooses and reserves funding outputs.
#[derive(Debug, Clone)]
pub struct UtxoSelector {
    reservations: Arc<ReservationSet>,
    min_confirmations: u32,
}

impl UtxoSelector {
    pub fn new(reservations: Arc<ReservationSet>, min_confirmations: u32) -> Self {
        Self {
            reservations,
            min_confirmations,
        }
    }

    pub fn reservations(&self) -> &Arc<ReservationSet> {
        &self.reservations
    }

    /// Select and reserve outputs of `wallet` covering `shape`.
    pub async fn select(
        &self,
        node: &dyn NodeApi,
        wallet: &Wallet,
        shape: SpendShape,
    ) -> SelectionResult<UtxoSelection> {
        let unspent = node
            .list_unspent(self.min_confirmations, std::slice::from_ref(&wallet.address))
            .await?;

        let live: HashSet<OutPoint> = unspent
            .iter()
            .map(|u| OutPoint {
                txid: u.txid.clone(),
                vout: u.vout,
            })
            .collect();
        self.reservations.prune_consumed(&wallet.address, &live);

        let candidates: Vec<Utxo> = unspent
            .iter()
            .filter(|u| u.spendable)
            .map(Utxo::from)
            .filter(|u| self.reservations.is_available(&u.outpoint))
            .collect();

        let utxos = choose(candidates, &shape)?;
        let fee = shape.fee_for(utxos.len());
        let reservation = self
            .reservations
            .try_reserve(&wallet.address, utxos.iter().map(|u| u.outpoint.clone()).collect())
            .ok_or_else(|| SelectionError::InsufficientFunds {
                available: 0,
                required: shape.needed(utxos.len()),
            })?;

        tracing::debug!(
            wallet = %wallet.label,
            inputs = utxos.len(),
            fee,
            "Reserved funding outputs"
        );
        Ok(UtxoSelection {
            utxos,
            fee,
            reservation,
        })
    }
}

/// Smallest single output covering the spend, else smallest-first accumulation.
pub fn choose(mut candidates: Vec<Utxo>, shape: &SpendShape) -> SelectionResult<Vec<Utxo>> {
    candidates.sort_by(|a, b| a.value.cmp(&b.value).then_with(|| a.outpoint.cmp(&b.outpoint)));

    let single_needed = shape.needed(1);
    if let Some(pos) = candidates.iter().position(|u| u.value >= single_needed) {
        return Ok(vec![candidates.swap_remove(pos)]);
    }

    let mut chosen = Vec::new();
    let mut total = 0u64;
    for utxo in candidates {
        total = total.saturating_add(utxo.value);
        chosen.push(utxo);
        if total >= shape.needed(chosen.len()) {
            return Ok(chosen);
        }
    }

    Err(SelectionError::InsufficientFunds {
        available: total,
        required: shape.needed(chosen.len().max(1)),
    })
}
