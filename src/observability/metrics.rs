//! Metrics collection and exposition.
//!
//! # Metrics
//! - `zrc20_mint_outcomes_total` (counter): target outcomes by outcome, tick
//! - `zrc20_rpc_errors_total` (counter): RPC failures by kind
//! - `zrc20_rpc_failovers_total` (counter): endpoint switches by endpoint
//! - `zrc20_fee_quotes_total` (counter): fee quotes by source
//! - `zrc20_reserved_utxos` (gauge): outputs currently reserved
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::rpc::RpcErrorKind;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_mint_outcome(outcome: &'static str, tick: &str) {
    metrics::counter!("zrc20_mint_outcomes_total", "outcome" => outcome, "tick" => tick.to_string())
        .increment(1);
}

pub fn record_rpc_error(kind: RpcErrorKind) {
    metrics::counter!("zrc20_rpc_errors_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_rpc_failover(endpoint: &str) {
    metrics::counter!("zrc20_rpc_failovers_total", "endpoint" => endpoint.to_string()).increment(1);
}

pub fn record_fee_quote(source: &'static str) {
    metrics::counter!("zrc20_fee_quotes_total", "source" => source).increment(1);
}

pub fn record_reserved_utxos(count: usize) {
    metrics::gauge!("zrc20_reserved_utxos").set(count as f64);
}
