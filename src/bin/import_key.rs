//! Import the configured funding key into the node wallet.
//!
//! Reads `secrets.wallet_wif` from the merged config (usually the local
//! overlay) and calls `importprivkey` on the configured nodes.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use zrc20_minter::lifecycle::load_and_validate;
use zrc20_minter::observability::logging;
use zrc20_minter::rpc::RpcClient;
use zrc20_minter::wallet::import_wallet_key;

#[derive(Parser, Debug)]
#[command(name = "zrc20-import-key")]
#[command(about = "Import the configured WIF key into the node wallet", long_about = None)]
struct Cli {
    /// Path to the base config file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Overlay holding the [secrets] section
    #[arg(long, default_value = "config.local.toml")]
    local_config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_and_validate(&cli.config, Some(&cli.local_config)) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&Default::default());
            tracing::error!(error = %e, "Cannot load configuration");
            return ExitCode::from(2);
        }
    };
    logging::init_logging(&config.observability);

    let client = match RpcClient::from_config(&config.network) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Cannot create RPC client");
            return ExitCode::from(2);
        }
    };

    match import_wallet_key(&client, &config.secrets).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Key import failed");
            ExitCode::from(1)
        }
    }
}
