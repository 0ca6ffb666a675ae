//! In-process UTXO reservations.
//!
//! # Responsibilities
//! - Keep concurrent attempts from selecting the same output
//! - Release outputs automatically when an attempt is dropped
//! - Remember outputs spent by this process until the node stops listing them

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::{DashMap, DashSet};

use crate::observability::metrics;
use crate::wallet::OutPoint;

/// Outputs currently held by an attempt, plus outputs already spent.
///
/// Spent outputs remember the address that owned them so a listing of one
/// wallet never prunes another wallet's entries.
#[derive(Debug, Default)]
pub struct ReservationSet {
    reserved: DashSet<OutPoint>,
    consumed: DashMap<OutPoint, String>,
}

impl ReservationSet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Whether `outpoint` may be selected.
    pub fn is_available(&self, outpoint: &OutPoint) -> bool {
        !self.reserved.contains(outpoint) && !self.consumed.contains_key(outpoint)
    }

    pub fn reserved_count(&self) -> usize {
        self.reserved.len()
    }

    pub fn consumed_count(&self) -> usize {
        self.consumed.len()
    }

    /// Reserve every outpoint of `owner` or none of them.
    pub fn try_reserve(
        self: &Arc<Self>,
        owner: &str,
        outpoints: Vec<OutPoint>,
    ) -> Option<UtxoReservation> {
        let mut taken = Vec::with_capacity(outpoints.len());
        for outpoint in outpoints {
            if self.consumed.contains_key(&outpoint) || !self.reserved.insert(outpoint.clone()) {
                for rollback in &taken {
                    self.reserved.remove(rollback);
                }
                return None;
            }
            taken.push(outpoint);
        }
        metrics::record_reserved_utxos(self.reserved.len());
        Some(UtxoReservation {
            set: self.clone(),
            owner: owner.to_string(),
            outpoints: taken,
            consumed: false,
        })
    }

    /// Forget consumed outputs of `owner` the node no longer reports as unspent.
    ///
    /// `still_unspent` must be a listing of `owner` alone.
    pub fn prune_consumed(&self, owner: &str, still_unspent: &HashSet<OutPoint>) {
        self.consumed
            .retain(|outpoint, spent_by| spent_by.as_str() != owner || still_unspent.contains(outpoint));
    }
}

/// A RAII guard over reserved outputs.
///
/// Dropping it releases the outputs; [`UtxoReservation::consume`] moves them to
/// the consumed set instead.
#[derive(Debug)]
pub struct UtxoReservation {
    set: Arc<ReservationSet>,
    owner: String,
    outpoints: Vec<OutPoint>,
    consumed: bool,
}

impl UtxoReservation {
    pub fn outpoints(&self) -> &[OutPoint] {
        &self.outpoints
    }

    /// Mark the outputs as spent by a broadcast transaction.
    pub fn consume(mut self) {
        self.consumed = true;
    }
}

impl Drop for UtxoReservation {
    fn drop(&mut self) {
        for outpoint in &self.outpoints {
            self.set.reserved.remove(outpoint);
            if self.consumed {
                self.set.consumed.insert(outpoint.clone(), self.owner.clone());
            }
        }
        metrics::record_reserved_utxos(self.set.reserved.len());
    }
}
