//! Typed node operations used by the mint engine.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::rpc::client::RpcClient;
use crate::rpc::types::{
    zat_to_coins, RpcError, RpcResult, SignedRawTransaction, SmartFeeEstimate, TxInputRef,
    UnspentOutput,
};

/// Upper confirmation bound passed to `listunspent`.
const MAX_CONFIRMATIONS: u32 = 9_999_999;

/// The node surface consumed by the engine. Injected so tests can use fakes.
#[async_trait]
pub trait NodeApi: Send + Sync {
    async fn list_unspent(&self, min_conf: u32, addresses: &[String]) -> RpcResult<Vec<UnspentOutput>>;

    async fn estimate_smart_fee(&self, target_blocks: u32) -> RpcResult<SmartFeeEstimate>;

    /// Outputs map address → zatoshi.
    async fn create_raw_transaction(
        &self,
        inputs: &[TxInputRef],
        outputs: &BTreeMap<String, u64>,
    ) -> RpcResult<String>;

    async fn sign_raw_transaction(&self, tx_hex: &str) -> RpcResult<SignedRawTransaction>;

    /// Returns the broadcast transaction id.
    async fn send_raw_transaction(&self, tx_hex: &str) -> RpcResult<String>;

    async fn get_raw_mempool(&self) -> RpcResult<Vec<String>>;

    async fn get_raw_transaction(&self, txid: &str) -> RpcResult<String>;

    async fn import_priv_key(&self, wif: &str, label: &str, rescan: bool) -> RpcResult<()>;
}

fn decode<T: DeserializeOwned>(method: &str, value: Value) -> RpcResult<T> {
    serde_json::from_value(value)
        .map_err(|e| RpcError::protocol(format!("unexpected {} response: {}", method, e)))
}

#[async_trait]
impl NodeApi for RpcClient {
    async fn list_unspent(&self, min_conf: u32, addresses: &[String]) -> RpcResult<Vec<UnspentOutput>> {
        let result = self
            .call("listunspent", vec![json!(min_conf), json!(MAX_CONFIRMATIONS), json!(addresses)])
            .await?;
        decode("listunspent", result)
    }

    async fn estimate_smart_fee(&self, target_blocks: u32) -> RpcResult<SmartFeeEstimate> {
        let result = self.call("estimatesmartfee", vec![json!(target_blocks)]).await?;
        decode("estimatesmartfee", result)
    }

    async fn create_raw_transaction(
        &self,
        inputs: &[TxInputRef],
        outputs: &BTreeMap<String, u64>,
    ) -> RpcResult<String> {
        let outputs: BTreeMap<&String, f64> =
            outputs.iter().map(|(addr, zat)| (addr, zat_to_coins(*zat))).collect();
        let result = self
            .call("createrawtransaction", vec![json!(inputs), json!(outputs)])
            .await?;
        decode("createrawtransaction", result)
    }

    async fn sign_raw_transaction(&self, tx_hex: &str) -> RpcResult<SignedRawTransaction> {
        let result = self.call("signrawtransaction", vec![json!(tx_hex)]).await?;
        decode("signrawtransaction", result)
    }

    async fn send_raw_transaction(&self, tx_hex: &str) -> RpcResult<String> {
        let result = self.call("sendrawtransaction", vec![json!(tx_hex)]).await?;
        decode("sendrawtransaction", result)
    }

    async fn get_raw_mempool(&self) -> RpcResult<Vec<String>> {
        let result = self.call("getrawmempool", vec![json!(false)]).await?;
        decode("getrawmempool", result)
    }

    async fn get_raw_transaction(&self, txid: &str) -> RpcResult<String> {
        let result = self.call("getrawtransaction", vec![json!(txid)]).await?;
        decode("getrawtransaction", result)
    }

    async fn import_priv_key(&self, wif: &str, label: &str, rescan: bool) -> RpcResult<()> {
        self.call("importprivkey", vec![json!(wif), json!(label), json!(rescan)])
            .await
            .map(|_| ())
    }
}
