//! Import of a funding key into the node wallet.

use thiserror::Error;

use crate::config::SecretsConfig;
use crate::rpc::{NodeApi, RpcError};

/// Marker left in template configs where the key belongs.
const PLACEHOLDER_MARKER: &str = "PASTE";

#[derive(Debug, Error)]
pub enum ImportKeyError {
    #[error("secrets.wallet_wif is not set")]
    MissingKey,

    #[error("secrets.wallet_wif still holds the template placeholder")]
    PlaceholderKey,

    #[error("importprivkey failed: {0}")]
    Rpc(#[from] RpcError),
}

/// Import `secrets.wallet_wif` under `secrets.wallet_label`.
///
/// The key itself is never logged.
pub async fn import_wallet_key(node: &dyn NodeApi, secrets: &SecretsConfig) -> Result<(), ImportKeyError> {
    let wif = secrets
        .wallet_wif
        .as_deref()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .ok_or(ImportKeyError::MissingKey)?;
    if wif.to_ascii_uppercase().contains(PLACEHOLDER_MARKER) {
        return Err(ImportKeyError::PlaceholderKey);
    }

    tracing::info!(
        label = %secrets.wallet_label,
        rescan = secrets.wallet_rescan,
        "Importing wallet key"
    );
    node.import_priv_key(wif, &secrets.wallet_label, secrets.wallet_rescan)
        .await?;
    tracing::info!(label = %secrets.wallet_label, "Wallet key imported");
    Ok(())
}
