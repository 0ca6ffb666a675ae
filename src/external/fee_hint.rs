//! External fee-hint API client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::FeeApiConfig;
use crate::external::{ExternalApiError, ExternalApiResult};

/// A source of fee rates in zatoshi per vbyte.
#[async_trait]
pub trait FeeHintSource: Send + Sync {
    async fn fee_rate(&self) -> ExternalApiResult<f64>;
}

/// Fee hints fetched over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeeHint {
    client: reqwest::Client,
    url: String,
    field: String,
}

impl HttpFeeHint {
    pub fn new(config: &FeeApiConfig) -> ExternalApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExternalApiError::Request {
                url: config.url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            url: config.url.clone(),
            field: config.field.clone(),
        })
    }
}

/// Pull a positive, finite rate out of `body[field]`.
///
/// Accepts a JSON number or a numeric string.
pub fn extract_rate(body: &Value, field: &str) -> Result<f64, String> {
    let raw = body.get(field).ok_or_else(|| format!("missing field '{}'", field))?;
    let rate = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("field '{}' is not numeric: {}", field, raw))?;

    if !rate.is_finite() || rate <= 0.0 {
        return Err(format!("field '{}' must be positive, got {}", field, rate));
    }
    Ok(rate)
}

#[async_trait]
impl FeeHintSource for HttpFeeHint {
    async fn fee_rate(&self) -> ExternalApiResult<f64> {
        let request_error = |e: reqwest::Error| ExternalApiError::Request {
            url: self.url.clone(),
            reason: e.to_string(),
        };

        let body: Value = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(request_error)?
            .json()
            .await
            .map_err(|e| ExternalApiError::Malformed {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        extract_rate(&body, &self.field).map_err(|reason| ExternalApiError::Malformed {
            url: self.url.clone(),
            reason,
        })
    }
}
