//! Fee estimator with node, external and static sources.

use std::fmt;
use std::sync::Arc;

use crate::config::FeeConfig;
use crate::external::FeeHintSource;
use crate::fees::{FeeError, FeeResult};
use crate::observability::metrics;
use crate::rpc::{NodeApi, SmartFeeEstimate};

/// Zatoshi per vbyte for one coin per kB.
const ZAT_PER_VBYTE_PER_COIN_PER_KB: f64 = 100_000.0;

/// Where a quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeSource {
    LocalEstimate,
    ExternalApi,
    StaticFallback,
}

impl FeeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeSource::LocalEstimate => "local-estimate",
            FeeSource::ExternalApi => "external-api",
            FeeSource::StaticFallback => "static-fallback",
        }
    }
}

impl fmt::Display for FeeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fee rate and its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    /// Zatoshi per vbyte.
    pub rate: u64,
    pub source: FeeSource,
}

/// Produces fee quotes, falling back through the configured sources.
pub struct FeeEstimator {
    node: Arc<dyn NodeApi>,
    external: Option<Arc<dyn FeeHintSource>>,
    dynamic: bool,
    floor_rate: Option<u64>,
    max_rate: u64,
}

impl FeeEstimator {
    pub fn new(
        node: Arc<dyn NodeApi>,
        external: Option<Arc<dyn FeeHintSource>>,
        config: &FeeConfig,
    ) -> Self {
        Self {
            node,
            external,
            dynamic: config.dynamic,
            floor_rate: config.floor_rate,
            max_rate: config.max_rate,
        }
    }

    /// Quote a rate for confirmation within `target` blocks.
    pub async fn quote(&self, target: u32) -> FeeResult<FeeQuote> {
        let quote = self.resolve(target).await?;
        metrics::record_fee_quote(quote.source.as_str());
        tracing::debug!(rate = quote.rate, source = %quote.source, target, "Fee quoted");
        Ok(quote)
    }

    async fn resolve(&self, target: u32) -> FeeResult<FeeQuote> {
        if self.dynamic {
            if let Some(rate) = self.local_rate(target).await {
                return Ok(FeeQuote {
                    rate,
                    source: FeeSource::LocalEstimate,
                });
            }
            if let Some(rate) = self.external_rate().await {
                return Ok(FeeQuote {
                    rate,
                    source: FeeSource::ExternalApi,
                });
            }
        }

        self.floor_rate
            .map(|rate| FeeQuote {
                rate,
                source: FeeSource::StaticFallback,
            })
            .ok_or(FeeError::FeeUnavailable { target })
    }

    async fn local_rate(&self, target: u32) -> Option<u64> {
        match self.node.estimate_smart_fee(target).await {
            Ok(estimate) => {
                let rate = node_rate(&estimate);
                if rate.is_none() {
                    tracing::debug!(errors = ?estimate.errors, "Node has no fee estimate");
                }
                rate.filter(|r| self.within_cap(*r, "node"))
            }
            Err(e) => {
                tracing::warn!(error = %e, "estimatesmartfee failed");
                None
            }
        }
    }

    async fn external_rate(&self) -> Option<u64> {
        let source = self.external.as_ref()?;
        match source.fee_rate().await {
            Ok(rate) => Some(rate.ceil().max(1.0) as u64).filter(|r| self.within_cap(*r, "external")),
            Err(e) => {
                tracing::warn!(error = %e, "External fee hint failed");
                None
            }
        }
    }

    fn within_cap(&self, rate: u64, origin: &str) -> bool {
        if rate > self.max_rate {
            tracing::warn!(rate, max_rate = self.max_rate, origin, "Fee rate above cap ignored");
            return false;
        }
        true
    }
}

/// Convert a node estimate (coin per kB) to zatoshi per vbyte.
///
/// `None` when the node reports errors or a missing/non-positive rate.
pub fn node_rate(estimate: &SmartFeeEstimate) -> Option<u64> {
    if estimate.errors.as_ref().map_or(false, |e| !e.is_empty()) {
        return None;
    }
    let feerate = estimate.feerate?;
    if !feerate.is_finite() || feerate <= 0.0 {
        return None;
    }
    // tolerate float noise just above an integer
    Some((feerate * ZAT_PER_VBYTE_PER_COIN_PER_KB - 1e-9).ceil().max(1.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{ExternalApiError, ExternalApiResult};
    use crate::rpc::fake::FakeNode;
    use crate::rpc::RpcError;
    use async_trait::async_trait;

    struct FixedHint(ExternalApiResult<f64>);

    #[async_trait]
    impl FeeHintSource for FixedHint {
        async fn fee_rate(&self) -> ExternalApiResult<f64> {
            self.0.clone()
        }
    }

    fn hint_error() -> ExternalApiError {
        ExternalApiError::Request {
            url: "http://fees".to_string(),
            reason: "connection refused".to_string(),
        }
    }

    fn config(dynamic: bool, floor: Option<u64>) -> FeeConfig {
        FeeConfig {
            dynamic,
            floor_rate: floor,
            target_confirmations: 2,
            max_rate: 1_000,
        }
    }

    fn estimator(node: Arc<FakeNode>, hint: Option<ExternalApiResult<f64>>, config: FeeConfig) -> FeeEstimator {
        let external = hint.map(|h| Arc::new(FixedHint(h)) as Arc<dyn FeeHintSource>);
        FeeEstimator::new(node, external, &config)
    }

    #[test]
    fn test_node_rate_conversion() {
        let estimate = |feerate, errors: Option<Vec<String>>| SmartFeeEstimate {
            feerate,
            errors,
            blocks: Some(2),
        };
        assert_eq!(node_rate(&estimate(Some(0.0001), None)), Some(10));
        assert_eq!(node_rate(&estimate(Some(0.000_000_01), None)), Some(1));
        assert_eq!(node_rate(&estimate(Some(0.000_123_4), None)), Some(13));
        assert_eq!(node_rate(&estimate(Some(-1.0), None)), None);
        assert_eq!(node_rate(&estimate(None, None)), None);
        assert_eq!(
            node_rate(&estimate(Some(0.0001), Some(vec!["Insufficient data".to_string()]))),
            None
        );
    }

    #[tokio::test]
    async fn test_prefers_local_estimate() {
        let node = Arc::new(FakeNode::new());
        node.set_feerate(Some(0.0002));
        let quote = estimator(node, Some(Ok(99.0)), config(true, Some(5)))
            .quote(2)
            .await
            .unwrap();
        assert_eq!(quote, FeeQuote { rate: 20, source: FeeSource::LocalEstimate });
    }

    #[tokio::test]
    async fn test_external_when_node_has_no_data() {
        let node = Arc::new(FakeNode::new());
        let quote = estimator(node, Some(Ok(12.0)), config(true, Some(5)))
            .quote(2)
            .await
            .unwrap();
        assert_eq!(quote, FeeQuote { rate: 12, source: FeeSource::ExternalApi });
        assert_eq!(quote.source.to_string(), "external-api");
    }

    #[tokio::test]
    async fn test_floor_when_everything_fails() {
        let node = Arc::new(FakeNode::new());
        node.fail(
            "estimatesmartfee",
            RpcError::Connection {
                endpoint: "http://node".to_string(),
                reason: "timeout".to_string(),
            },
        );
        let quote = estimator(node, Some(Err(hint_error())), config(true, Some(5)))
            .quote(2)
            .await
            .unwrap();
        assert_eq!(quote, FeeQuote { rate: 5, source: FeeSource::StaticFallback });
    }

    #[tokio::test]
    async fn test_unavailable_without_floor() {
        let node = Arc::new(FakeNode::new());
        let result = estimator(node, None, config(true, None)).quote(3).await;
        assert_eq!(result, Err(FeeError::FeeUnavailable { target: 3 }));
    }

    #[tokio::test]
    async fn test_static_mode_skips_dynamic_sources() {
        let node = Arc::new(FakeNode::new());
        node.set_feerate(Some(0.0002));
        let quote = estimator(node.clone(), Some(Ok(12.0)), config(false, Some(7)))
            .quote(2)
            .await
            .unwrap();
        assert_eq!(quote, FeeQuote { rate: 7, source: FeeSource::StaticFallback });
        assert_eq!(node.calls_to("estimatesmartfee"), 0);
    }

    #[tokio::test]
    async fn test_rates_above_cap_are_ignored() {
        let node = Arc::new(FakeNode::new());
        node.set_feerate(Some(1.0));
        let quote = estimator(node, Some(Ok(5_000.0)), config(true, Some(5)))
            .quote(2)
            .await
            .unwrap();
        assert_eq!(quote.source, FeeSource::StaticFallback);
    }
}
