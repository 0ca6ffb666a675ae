//! Node RPC client with sticky failover.
//!
//! # Responsibilities
//! - Walk the ordered endpoint list on `Connection`/`NodeBusy` failures
//! - Surface `Auth`/`Protocol` failures immediately
//! - Pin the last endpoint that answered as the first choice for later calls
//! - Pause between full passes over the list

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::NetworkConfig;
use crate::observability::metrics;
use crate::resilience::{Sleeper, TokioSleeper};
use crate::rpc::rate_limit::CallRateLimiter;
use crate::rpc::transport::{HttpTransport, RpcTransport};
use crate::rpc::types::{RpcEndpoint, RpcError, RpcResult};

/// Failover-aware JSON-RPC client.
#[derive(Clone)]
pub struct RpcClient {
    endpoints: Arc<Vec<RpcEndpoint>>,
    transport: Arc<dyn RpcTransport>,
    /// Index of the sticky endpoint.
    preferred: Arc<AtomicUsize>,
    max_attempts: u32,
    retry_wait: Duration,
    sleeper: Arc<dyn Sleeper>,
    limiter: Option<Arc<CallRateLimiter>>,
}

impl RpcClient {
    /// Create a client over an arbitrary transport.
    pub fn new(
        endpoints: Vec<RpcEndpoint>,
        transport: Arc<dyn RpcTransport>,
        max_attempts: u32,
        retry_wait: Duration,
    ) -> RpcResult<Self> {
        if endpoints.is_empty() {
            return Err(RpcError::protocol("at least one RPC endpoint must be configured"));
        }
        Ok(Self {
            endpoints: Arc::new(endpoints),
            transport,
            preferred: Arc::new(AtomicUsize::new(0)),
            max_attempts: max_attempts.max(1),
            retry_wait,
            sleeper: Arc::new(TokioSleeper),
            limiter: None,
        })
    }

    /// Create an HTTP client from the network configuration.
    pub fn from_config(config: &NetworkConfig) -> RpcResult<Self> {
        let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs))?;
        let endpoints = config.rpc_nodes.iter().map(RpcEndpoint::from).collect();
        let mut client = Self::new(
            endpoints,
            Arc::new(transport),
            config.max_attempts,
            Duration::from_secs(config.retry_wait_secs),
        )?;
        if let Some(rate) = config.rate_limit_per_sec {
            client.limiter = Some(Arc::new(CallRateLimiter::new(rate)));
        }

        tracing::info!(
            endpoints = client.endpoints.len(),
            primary = %client.endpoints[0].url,
            timeout_secs = config.timeout_secs,
            max_attempts = client.max_attempts,
            "RPC client initialized"
        );
        Ok(client)
    }

    /// Replace the sleeper used between full passes over the endpoint list.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// The endpoint the next call will try first.
    pub fn preferred_endpoint(&self) -> &RpcEndpoint {
        &self.endpoints[self.preferred.load(Ordering::Relaxed) % self.endpoints.len()]
    }

    /// Perform one JSON-RPC call with failover.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> RpcResult<Value> {
        let len = self.endpoints.len();
        let start = self.preferred.load(Ordering::Relaxed) % len;
        let mut last_error = None;

        for attempt in 0..self.max_attempts as usize {
            // Wrapped around to the first endpoint of this call: every endpoint failed once.
            if attempt > 0 && attempt % len == 0 {
                tracing::warn!(
                    method = method,
                    wait_secs = self.retry_wait.as_secs_f64(),
                    "All RPC endpoints failed, pausing before next pass"
                );
                self.sleeper.sleep(self.retry_wait).await;
            }

            let index = (start + attempt) % len;
            let endpoint = &self.endpoints[index];

            if let Some(limiter) = &self.limiter {
                limiter.acquire().await;
            }

            match self.transport.send(endpoint, method, &params).await {
                Ok(result) => {
                    if index != start {
                        tracing::info!(endpoint = %endpoint.url, "Pinned RPC endpoint after failover");
                    }
                    self.preferred.store(index, Ordering::Relaxed);
                    return Ok(result);
                }
                Err(e) => {
                    metrics::record_rpc_error(e.kind());
                    if !e.is_failover() {
                        tracing::error!(method = method, endpoint = %endpoint.url, error = %e, "RPC call failed");
                        return Err(e);
                    }
                    tracing::warn!(
                        method = method,
                        endpoint_idx = index,
                        attempt = attempt + 1,
                        error = %e,
                        "RPC error, trying next endpoint"
                    );
                    if len > 1 {
                        metrics::record_rpc_failover(&endpoint.url);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| RpcError::protocol("no RPC attempt was made")))
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("endpoints", &self.endpoints)
            .field("preferred", &self.preferred.load(Ordering::Relaxed))
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}
