//! External ticker "live" API client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::TickerApiConfig;
use crate::external::{ExternalApiError, ExternalApiResult};

/// Reports whether minting of a tick has opened.
#[async_trait]
pub trait TickerSource: Send + Sync {
    async fn is_live(&self, tick: &str) -> ExternalApiResult<bool>;

    /// Answer to use when `is_live` fails.
    fn assume_live_on_error(&self) -> bool {
        true
    }
}

/// Ticker status fetched over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTicker {
    client: reqwest::Client,
    url: String,
    field: String,
    assume_live_on_error: bool,
}

impl HttpTicker {
    pub fn new(config: &TickerApiConfig) -> ExternalApiResult<Self> {
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
            assume_live_on_error: config.assume_live_on_error,
        })
    }
}

/// Read `body[field]` as a boolean.
pub fn extract_live(body: &Value, field: &str) -> Result<bool, String> {
    match body.get(field) {
        Some(Value::Bool(live)) => Ok(*live),
        Some(other) => Err(format!("field '{}' is not a boolean: {}", field, other)),
        None => Err(format!("missing field '{}'", field)),
    }
}

#[async_trait]
impl TickerSource for HttpTicker {
    async fn is_live(&self, tick: &str) -> ExternalApiResult<bool> {
        let body: Value = self
            .client
            .get(&self.url)
            .query(&[("tick", tick)])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ExternalApiError::Request {
                url: self.url.clone(),
                reason: e.to_string(),
            })?
            .json()
            .await
            .map_err(|e| ExternalApiError::Malformed {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        extract_live(&body, &self.field).map_err(|reason| ExternalApiError::Malformed {
            url: self.url.clone(),
            reason,
        })
    }

    fn assume_live_on_error(&self) -> bool {
        self.assume_live_on_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_live() {
        assert_eq!(extract_live(&json!({"live": true}), "live"), Ok(true));
        assert_eq!(extract_live(&json!({"open": false}), "open"), Ok(false));
        assert!(extract_live(&json!({"live": "yes"}), "live").is_err());
        assert!(extract_live(&json!({}), "live").is_err());
    }
}
