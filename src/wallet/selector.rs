//! Wallet selection strategies.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::{MinterConfig, WalletStrategy};
use crate::rpc::NodeApi;
use crate::wallet::{OutPoint, ReservationSet, SelectionError, SelectionResult, Wallet};

/// Picks the wallet that funds the next attempt.
///
/// The round-robin cursor is only moved by [`WalletSelector::advance`], which
/// the orchestrator calls once an attempt has completed.
#[derive(Debug)]
pub struct WalletSelector {
    wallets: Vec<Wallet>,
    strategy: WalletStrategy,
    cursor: AtomicUsize,
}

impl WalletSelector {
    pub fn new(wallets: Vec<Wallet>, strategy: WalletStrategy) -> Self {
        Self {
            wallets,
            strategy,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &MinterConfig) -> Self {
        Self::new(
            config.wallets.iter().map(Wallet::from).collect(),
            config.wallet_strategy,
        )
    }

    pub fn wallets(&self) -> &[Wallet] {
        &self.wallets
    }

    pub fn strategy(&self) -> WalletStrategy {
        self.strategy
    }

    /// Position of the next round-robin pick.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed) % self.wallets.len().max(1)
    }

    /// Move the round-robin cursor one position.
    pub fn advance(&self) {
        self.cursor.fetch_add(1, Ordering::Relaxed);
    }

    /// Choose a wallet able to cover `required` zatoshi.
    ///
    /// Outputs held or spent according to `reservations` do not count towards a
    /// wallet's balance.
    pub async fn select(
        &self,
        node: &dyn NodeApi,
        min_conf: u32,
        required: u64,
        reservations: &ReservationSet,
    ) -> SelectionResult<Wallet> {
        if self.wallets.is_empty() {
            return Err(SelectionError::NoEligibleWallet(
                "no wallets configured".to_string(),
            ));
        }

        match self.strategy {
            WalletStrategy::RoundRobin => Ok(self.wallets[self.cursor()].clone()),
            WalletStrategy::Richest => self.richest(node, min_conf, required, reservations).await,
        }
    }

    async fn richest(
        &self,
        node: &dyn NodeApi,
        min_conf: u32,
        required: u64,
        reservations: &ReservationSet,
    ) -> SelectionResult<Wallet> {
        let addresses: Vec<String> = self.wallets.iter().map(|w| w.address.clone()).collect();
        let unspent = node.list_unspent(min_conf, &addresses).await?;

        let mut balances: HashMap<&str, u64> = HashMap::new();
        let spendable = unspent.iter().filter(|u| {
            u.spendable
                && reservations.is_available(&OutPoint {
                    txid: u.txid.clone(),
                    vout: u.vout,
                })
        });
        for output in spendable {
            if let Some(address) = output.address.as_deref() {
                *balances.entry(address).or_default() += output.value_zat();
            }
        }

        let mut best: Option<(usize, u64)> = None;
        for (index, wallet) in self.wallets.iter().enumerate() {
            let balance = balances.get(wallet.address.as_str()).copied().unwrap_or(0);
            tracing::debug!(wallet = %wallet.label, balance, "Wallet balance");
            // strict comparison keeps the earliest wallet on ties
            if best.map_or(true, |(_, b)| balance > b) {
                best = Some((index, balance));
            }
        }

        match best {
            Some((index, balance)) if balance >= required && balance > 0 => {
                let mut wallet = self.wallets[index].clone();
                wallet.balance = Some(balance);
                Ok(wallet)
            }
            Some((_, balance)) => Err(SelectionError::NoEligibleWallet(format!(
                "richest wallet holds {} zat, {} zat required",
                balance, required
            ))),
            None => Err(SelectionError::NoEligibleWallet(
                "no wallets configured".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::fake::FakeNode;

    fn free() -> ReservationSet {
        ReservationSet::default()
    }

    fn wallets() -> Vec<Wallet> {
        vec![
            Wallet::new("A", "t1A"),
            Wallet::new("B", "t1B"),
            Wallet::new("C", "t1C"),
        ]
    }

    #[tokio::test]
    async fn test_round_robin_order() {
        let node = FakeNode::new();
        let selector = WalletSelector::new(wallets(), WalletStrategy::RoundRobin);

        let mut picked = Vec::new();
        for _ in 0..4 {
            picked.push(selector.select(&node, 1, 0, &free()).await.unwrap().label);
            selector.advance();
        }
        assert_eq!(picked, vec!["A", "B", "C", "A"]);
    }

    #[tokio::test]
    async fn test_round_robin_does_not_move_without_advance() {
        let node = FakeNode::new();
        let selector = WalletSelector::new(wallets(), WalletStrategy::RoundRobin);
        assert_eq!(selector.select(&node, 1, 0, &free()).await.unwrap().label, "A");
        assert_eq!(selector.select(&node, 1, 0, &free()).await.unwrap().label, "A");
        assert_eq!(selector.cursor(), 0);
    }

    #[tokio::test]
    async fn test_richest_picks_largest_balance() {
        let node = FakeNode::new();
        node.add_utxo("t1A", "a0", 0, 5, 3);
        node.add_utxo("t1B", "b0", 0, 30, 3);
        node.add_utxo("t1B", "b1", 1, 20, 3);
        node.add_utxo("t1C", "c0", 0, 20, 3);
        let selector = WalletSelector::new(wallets(), WalletStrategy::Richest);

        let wallet = selector.select(&node, 1, 10, &free()).await.unwrap();
        assert_eq!(wallet.label, "B");
        assert_eq!(wallet.balance, Some(50));
        assert_eq!(node.calls_to("listunspent"), 1);
    }

    #[tokio::test]
    async fn test_richest_ties_keep_list_order() {
        let node = FakeNode::new();
        node.add_utxo("t1B", "b0", 0, 20, 3);
        node.add_utxo("t1C", "c0", 0, 20, 3);
        let selector = WalletSelector::new(wallets(), WalletStrategy::Richest);
        assert_eq!(selector.select(&node, 1, 0, &free()).await.unwrap().label, "B");
    }

    #[tokio::test]
    async fn test_richest_without_enough_funds() {
        let node = FakeNode::new();
        node.add_utxo("t1A", "a0", 0, 5, 3);
        let selector = WalletSelector::new(wallets(), WalletStrategy::Richest);
        assert!(matches!(
            selector.select(&node, 1, 1_000, &free()).await,
            Err(SelectionError::NoEligibleWallet(_))
        ));
    }

    #[tokio::test]
    async fn test_richest_ignores_held_outputs() {
        let node = FakeNode::new();
        node.add_utxo("t1A", "a0", 0, 30, 3);
        node.add_utxo("t1B", "b0", 0, 50, 3);
        let reservations = ReservationSet::new();
        let held = reservations
            .try_reserve("t1B", vec![OutPoint { txid: "b0".to_string(), vout: 0 }])
            .unwrap();
        let selector = WalletSelector::new(wallets(), WalletStrategy::Richest);

        let wallet = selector.select(&node, 1, 10, &reservations).await.unwrap();
        assert_eq!(wallet.label, "A");
        assert_eq!(wallet.balance, Some(30));

        // once spent, B's only output still does not count
        held.consume();
        reservations
            .try_reserve("t1A", vec![OutPoint { txid: "a0".to_string(), vout: 0 }])
            .unwrap()
            .consume();
        assert!(matches!(
            selector.select(&node, 1, 10, &reservations).await,
            Err(SelectionError::NoEligibleWallet(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_wallet_list() {
        let node = FakeNode::new();
        let selector = WalletSelector::new(Vec::new(), WalletStrategy::RoundRobin);
        assert!(matches!(
            selector.select(&node, 1, 0, &free()).await,
            Err(SelectionError::NoEligibleWallet(_))
        ));
    }
}
