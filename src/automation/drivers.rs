//! Manual, loop, scheduler and watcher drivers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::time::{self, MissedTickBehavior};

use crate::automation::Mode;
use crate::external::TickerSource;
use crate::inscription::MintTarget;
use crate::lifecycle::{Runtime, Shutdown};
use crate::mint::{CycleReport, MintOrchestrator};

/// The orchestrator shared by every driver task.
pub type SharedOrchestrator = Arc<Mutex<MintOrchestrator>>;

/// Totals across every cycle a driver ran.
#[derive(Debug, Default)]
pub struct RunTotals {
    cycles: AtomicUsize,
    failed_targets: AtomicUsize,
}

impl RunTotals {
    pub fn cycles(&self) -> usize {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn failed_targets(&self) -> usize {
        self.failed_targets.load(Ordering::Relaxed)
    }

    fn record(&self, report: &CycleReport) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.failed_targets
            .fetch_add(report.count("failed"), Ordering::Relaxed);
    }
}

async fn locked_cycle(orchestrator: &SharedOrchestrator, targets: &[MintTarget]) -> CycleReport {
    let mut orchestrator = orchestrator.lock().await;
    orchestrator.run_cycle(targets).await
}

fn summarize(job: &str, report: &CycleReport) {
    tracing::info!(
        job,
        done = report.count("done"),
        skipped = report.count("skipped"),
        failed = report.count("failed"),
        "Cycle finished"
    );
}

/// Run one cycle unless shutdown arrives first.
///
/// Returns `None` when the cycle was cancelled.
pub async fn run_once(
    orchestrator: &SharedOrchestrator,
    targets: &[MintTarget],
    mut shutdown: broadcast::Receiver<()>,
) -> Option<CycleReport> {
    tokio::select! {
        report = locked_cycle(orchestrator, targets) => {
            summarize("once", &report);
            Some(report)
        }
        _ = shutdown.recv() => {
            tracing::warn!("Cycle cancelled by shutdown");
            None
        }
    }
}

/// Run a cycle over `targets` every `interval` until shutdown.
pub async fn run_interval_job(
    name: String,
    orchestrator: SharedOrchestrator,
    targets: Vec<MintTarget>,
    interval: Duration,
    totals: Arc<RunTotals>,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::info!(job = %name, interval_secs = interval.as_secs_f64(), "Job started");
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.recv() => break,
        }

        let report = tokio::select! {
            report = locked_cycle(&orchestrator, &targets) => report,
            _ = shutdown.recv() => {
                tracing::warn!(job = %name, "Cycle cancelled by shutdown");
                break;
            }
        };
        summarize(&name, &report);
        totals.record(&report);
    }
    tracing::info!(job = %name, "Job stopped");
}

/// Ask the ticker API whether `tick` is live, applying its error policy.
pub async fn ticker_allows(ticker: Option<&dyn TickerSource>, tick: &str) -> bool {
    let Some(ticker) = ticker else {
        return true;
    };
    match ticker.is_live(tick).await {
        Ok(live) => live,
        Err(e) => {
            let assume = ticker.assume_live_on_error();
            tracing::warn!(tick = %tick, error = %e, assume_live = assume, "Ticker API failed");
            assume
        }
    }
}

/// Poll the ticker for one target and mint it whenever it is live.
///
/// The mempool guard still applies inside the cycle.
pub async fn run_watcher(
    orchestrator: SharedOrchestrator,
    target: MintTarget,
    ticker: Option<Arc<dyn TickerSource>>,
    interval: Duration,
    totals: Arc<RunTotals>,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::info!(tick = %target.tick, interval_secs = interval.as_secs_f64(), "Watcher started");
    let mut ticker_interval = time::interval(interval);
    ticker_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let targets = [target];

    loop {
        tokio::select! {
            _ = ticker_interval.tick() => {}
            _ = shutdown.recv() => break,
        }

        if !ticker_allows(ticker.as_deref(), &targets[0].tick).await {
            tracing::debug!(tick = %targets[0].tick, "Tick not live yet");
            continue;
        }
        tracing::info!(tick = %targets[0].tick, "Watcher ready, minting");

        let report = tokio::select! {
            report = locked_cycle(&orchestrator, &targets) => report,
            _ = shutdown.recv() => break,
        };
        summarize("watch", &report);
        totals.record(&report);
    }
    tracing::info!(tick = %targets[0].tick, "Watcher stopped");
}

/// Drive `runtime` in `mode` until done or shut down.
pub async fn run_mode(runtime: &Runtime, mode: Mode, shutdown: &Shutdown) -> Arc<RunTotals> {
    let totals = Arc::new(RunTotals::default());
    let automation = &runtime.config.automation;
    tracing::info!(mode = %mode, targets = runtime.targets.len(), "Starting driver");

    let mut jobs = Vec::new();
    match mode {
        Mode::Once => {
            match run_once(&runtime.orchestrator, &runtime.targets, shutdown.subscribe()).await {
                Some(report) => totals.record(&report),
                None => {
                    totals
                        .failed_targets
                        .fetch_add(runtime.targets.len(), Ordering::Relaxed);
                }
            }
            return totals;
        }
        Mode::Loop => {
            jobs.push(tokio::spawn(run_interval_job(
                "auto-mint".to_string(),
                runtime.orchestrator.clone(),
                runtime.targets.clone(),
                Duration::from_secs(automation.loop_interval_secs),
                totals.clone(),
                shutdown.subscribe(),
            )));
        }
        Mode::Schedule => {
            for (index, secs) in automation.scheduler.intervals_secs.iter().enumerate() {
                jobs.push(tokio::spawn(run_interval_job(
                    format!("scheduled-{}", index),
                    runtime.orchestrator.clone(),
                    runtime.targets.clone(),
                    Duration::from_secs(*secs),
                    totals.clone(),
                    shutdown.subscribe(),
                )));
            }
        }
        Mode::Watch => {
            for target in &runtime.targets {
                jobs.push(tokio::spawn(run_watcher(
                    runtime.orchestrator.clone(),
                    target.clone(),
                    runtime.ticker.clone(),
                    Duration::from_secs(automation.watcher.interval_secs),
                    totals.clone(),
                    shutdown.subscribe(),
                )));
            }
        }
    }

    for job in jobs {
        if let Err(e) = job.await {
            tracing::error!(error = %e, "Driver task ended abnormally");
        }
    }
    totals
}
