//! Single-endpoint JSON-RPC transport.
//!
//! # Responsibilities
//! - Serialize one request and POST it to one endpoint
//! - Enforce the per-call timeout
//! - Map HTTP status, transport failures and JSON-RPC errors onto `RpcError`

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::time::timeout;

use crate::rpc::types::{RpcEndpoint, RpcError, RpcRequest, RpcResponse, RpcResult, RPC_IN_WARMUP};

/// Sends one call to one endpoint. Failover lives above this seam.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn send(&self, endpoint: &RpcEndpoint, method: &str, params: &[Value]) -> RpcResult<Value>;
}

/// HTTP transport backed by `reqwest`.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout_duration: Duration,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(timeout_duration: Duration) -> RpcResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| RpcError::protocol(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            timeout_duration,
            next_id: AtomicU64::new(1),
        })
    }

    async fn post(&self, endpoint: &RpcEndpoint, method: &str, params: &[Value]) -> RpcResult<Value> {
        let request = RpcRequest {
            jsonrpc: "1.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let mut builder = self.client.post(&endpoint.url).json(&request);
        if let Some(user) = &endpoint.user {
            builder = builder.basic_auth(user, endpoint.password.as_ref());
        }

        let response = builder.send().await.map_err(|e| RpcError::Connection {
            endpoint: endpoint.url.clone(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(RpcError::Auth {
                    endpoint: endpoint.url.clone(),
                });
            }
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::TOO_MANY_REQUESTS => {
                return Err(RpcError::NodeBusy {
                    endpoint: endpoint.url.clone(),
                    reason: format!("HTTP {}", status),
                });
            }
            StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT => {
                return Err(RpcError::Connection {
                    endpoint: endpoint.url.clone(),
                    reason: format!("HTTP {}", status),
                });
            }
            _ => {}
        }

        let body = response.bytes().await.map_err(|e| RpcError::Connection {
            endpoint: endpoint.url.clone(),
            reason: format!("failed reading body: {}", e),
        })?;

        // Nodes answer JSON-RPC errors with HTTP 500/404 and a JSON body, so the
        // body is inspected before the status.
        let parsed: RpcResponse = match serde_json::from_slice(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Err(RpcError::Protocol {
                    code: None,
                    message: format!("HTTP {} with undecodable body: {}", status, e),
                });
            }
        };

        if let Some(error) = parsed.error {
            if error.code == RPC_IN_WARMUP {
                return Err(RpcError::NodeBusy {
                    endpoint: endpoint.url.clone(),
                    reason: error.message,
                });
            }
            return Err(RpcError::Protocol {
                code: Some(error.code),
                message: error.message,
            });
        }

        if !status.is_success() {
            return Err(RpcError::protocol(format!("HTTP {} without error object", status)));
        }

        Ok(parsed.result)
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn send(&self, endpoint: &RpcEndpoint, method: &str, params: &[Value]) -> RpcResult<Value> {
        match timeout(self.timeout_duration, self.post(endpoint, method, params)).await {
            Ok(result) => result,
            Err(_) => Err(RpcError::Connection {
                endpoint: endpoint.url.clone(),
                reason: format!("timeout after {:?}", self.timeout_duration),
            }),
        }
    }
}
