//! In-memory node used by unit tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::rpc::node::NodeApi;
use crate::rpc::types::{
    RpcError, RpcResult, SignedRawTransaction, SmartFeeEstimate, TxInputRef, UnspentOutput,
};

/// Programmable node state.
#[derive(Default)]
pub struct FakeNode {
    pub unspent: Mutex<Vec<UnspentOutput>>,
    pub fee: Mutex<Option<SmartFeeEstimate>>,
    pub mempool: Mutex<Vec<String>>,
    pub raw_txs: Mutex<HashMap<String, String>>,
    /// Errors returned, in order, before a method starts succeeding.
    pub failures: Mutex<HashMap<&'static str, VecDeque<RpcError>>>,
    pub calls: Mutex<Vec<String>>,
    pub created: Mutex<Vec<(Vec<TxInputRef>, BTreeMap<String, u64>)>>,
    pub broadcast: Mutex<Vec<String>>,
}

impl FakeNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_utxo(&self, address: &str, txid: &str, vout: u32, zat: u64, confirmations: u32) {
        self.unspent.lock().unwrap().push(UnspentOutput {
            txid: txid.to_string(),
            vout,
            address: Some(address.to_string()),
            amount: zat as f64 / 100_000_000.0,
            amount_zat: Some(zat),
            confirmations,
            spendable: true,
        });
    }

    pub fn remove_utxo(&self, txid: &str, vout: u32) {
        self.unspent
            .lock()
            .unwrap()
            .retain(|u| !(u.txid == txid && u.vout == vout));
    }

    pub fn set_feerate(&self, feerate: Option<f64>) {
        *self.fee.lock().unwrap() = Some(SmartFeeEstimate {
            feerate,
            errors: None,
            blocks: Some(2),
        });
    }

    pub fn fail(&self, method: &'static str, error: RpcError) {
        self.failures
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(error);
    }

    pub fn add_mempool_tx(&self, txid: &str, raw_hex: &str) {
        self.mempool.lock().unwrap().push(txid.to_string());
        self.raw_txs
            .lock()
            .unwrap()
            .insert(txid.to_string(), raw_hex.to_string());
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|m| *m == method).count()
    }

    fn enter(&self, method: &'static str) -> RpcResult<()> {
        self.calls.lock().unwrap().push(method.to_string());
        match self
            .failures
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(|queue| queue.pop_front())
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Serialize a v4 transaction with empty scriptSigs.
pub fn unsigned_v4_tx(inputs: usize, outputs: &[u64]) -> String {
    let mut tx = Vec::new();
    tx.extend_from_slice(&(4u32 | 1 << 31).to_le_bytes());
    tx.extend_from_slice(&0x892f_2085u32.to_le_bytes());
    tx.push(inputs as u8);
    for i in 0..inputs {
        tx.extend_from_slice(&[i as u8; 32]);
        tx.extend_from_slice(&0u32.to_le_bytes());
        tx.push(0);
        tx.extend_from_slice(&0xffff_ffffu32.to_le_bytes());
    }
    tx.push(outputs.len() as u8);
    for value in outputs {
        tx.extend_from_slice(&value.to_le_bytes());
        tx.push(0);
    }
    tx.extend_from_slice(&[0u8; 8]);
    hex::encode(tx)
}

/// "Sign" by putting a fixed 72-byte push into every scriptSig of a tx made
/// by [`unsigned_v4_tx`].
fn fake_sign(tx_hex: &str) -> String {
    let tx = hex::decode(tx_hex).unwrap();
    let mut out = tx[..8].to_vec();
    let inputs = tx[8] as usize;
    out.push(tx[8]);
    let mut pos = 9;
    for _ in 0..inputs {
        out.extend_from_slice(&tx[pos..pos + 36]);
        out.push(72);
        out.push(71);
        out.extend_from_slice(&[0x30; 71]);
        // skip the empty script length byte
        out.extend_from_slice(&tx[pos + 37..pos + 41]);
        pos += 41;
    }
    out.extend_from_slice(&tx[pos..]);
    hex::encode(out)
}

#[async_trait]
impl NodeApi for FakeNode {
    async fn list_unspent(&self, min_conf: u32, addresses: &[String]) -> RpcResult<Vec<UnspentOutput>> {
        self.enter("listunspent")?;
        Ok(self
            .unspent
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.confirmations >= min_conf)
            .filter(|u| {
                addresses.is_empty()
                    || u.address.as_ref().map_or(false, |a| addresses.contains(a))
            })
            .cloned()
            .collect())
    }

    async fn estimate_smart_fee(&self, _target_blocks: u32) -> RpcResult<SmartFeeEstimate> {
        self.enter("estimatesmartfee")?;
        Ok(self.fee.lock().unwrap().clone().unwrap_or(SmartFeeEstimate {
            feerate: None,
            errors: Some(vec!["Insufficient data or no feerate found".to_string()]),
            blocks: Some(0),
        }))
    }

    async fn create_raw_transaction(
        &self,
        inputs: &[TxInputRef],
        outputs: &BTreeMap<String, u64>,
    ) -> RpcResult<String> {
        self.enter("createrawtransaction")?;
        self.created
            .lock()
            .unwrap()
            .push((inputs.to_vec(), outputs.clone()));
        let values: Vec<u64> = outputs.values().copied().collect();
        Ok(unsigned_v4_tx(inputs.len(), &values))
    }

    async fn sign_raw_transaction(&self, tx_hex: &str) -> RpcResult<SignedRawTransaction> {
        self.enter("signrawtransaction")?;
        Ok(SignedRawTransaction {
            hex: fake_sign(tx_hex),
            complete: true,
        })
    }

    async fn send_raw_transaction(&self, tx_hex: &str) -> RpcResult<String> {
        self.enter("sendrawtransaction")?;
        let mut broadcast = self.broadcast.lock().unwrap();
        broadcast.push(tx_hex.to_string());
        Ok(format!("txid-{}", broadcast.len()))
    }

    async fn get_raw_mempool(&self) -> RpcResult<Vec<String>> {
        self.enter("getrawmempool")?;
        Ok(self.mempool.lock().unwrap().clone())
    }

    async fn get_raw_transaction(&self, txid: &str) -> RpcResult<String> {
        self.enter("getrawtransaction")?;
        self.raw_txs
            .lock()
            .unwrap()
            .get(txid)
            .cloned()
            .ok_or_else(|| RpcError::Protocol {
                code: Some(-5),
                message: "No such mempool transaction".to_string(),
            })
    }

    async fn import_priv_key(&self, _wif: &str, _label: &str, _rescan: bool) -> RpcResult<()> {
        self.enter("importprivkey")
    }
}
