//! ZRC-20 mint automation.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI / [automation] ──▶ driver (once | loop | watch | schedule)
//!                               │
//!                               ▼
//!                     ┌──────────────────────┐
//!                     │   MintOrchestrator   │──▶ mempool guard
//!                     │   (state machine)    │──▶ fee estimator ──▶ external fee API
//!                     └──────────┬───────────┘──▶ wallet + UTXO selectors
//!                                │                inscription builder
//!                                ▼
//!                        RPC client (failover) ──▶ node(s)
//! ```
//!
//! Exit status: 0 when no target failed, 1 when a target failed, 2 when the
//! engine could not start.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser};

use zrc20_minter::automation::{run_mode, Mode, ModeFlags};
use zrc20_minter::lifecycle::{build_runtime, load_and_validate, spawn_signal_handler, Shutdown};
use zrc20_minter::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "zrc20-minter")]
#[command(about = "ZRC-20 mint automation engine", long_about = None)]
#[command(group(ArgGroup::new("mode").args(["once", "loop_", "watch", "schedule"])))]
struct Cli {
    /// Path to the base config file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Optional overlay with local secrets, merged over the base config
    #[arg(long)]
    local_config: Option<PathBuf>,

    /// Run a single mint cycle
    #[arg(long)]
    once: bool,

    /// Run a cycle every loop interval
    #[arg(long = "loop")]
    loop_: bool,

    /// Mint each target when its ticker reports live
    #[arg(long)]
    watch: bool,

    /// Run the configured interval jobs
    #[arg(long)]
    schedule: bool,
}

impl Cli {
    fn flags(&self) -> ModeFlags {
        ModeFlags {
            once: self.once,
            loop_: self.loop_,
            watch: self.watch,
            schedule: self.schedule,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_and_validate(&cli.config, cli.local_config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&Default::default());
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::from(2);
        }
    };
    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "zrc20-minter starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mode = Mode::resolve(cli.flags(), &config.automation);
    let runtime = match build_runtime(config) {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::from(2);
        }
    };

    let shutdown = Shutdown::new();
    let signals = spawn_signal_handler(shutdown.clone());
    let totals = run_mode(&runtime, mode, &shutdown).await;
    signals.abort();

    tracing::info!(
        cycles = totals.cycles(),
        failed_targets = totals.failed_targets(),
        "Shutdown complete"
    );
    if mode == Mode::Once && totals.failed_targets() > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
