// =============================================================================
// Fetcher: bounded, timed access to a MarketDataSource
// =============================================================================
//
// Every metric operation goes through `Fetcher::fetch`, which:
//   - caps in-flight requests with a semaphore,
//   - applies an explicit per-call timeout (a timeout is a fetch fault),
//   - maps the outcome onto `MetricError` (empty series => NoData),
//   - records the outcome in `FetchStats`.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::candle::Series;
use super::source::MarketDataSource;
use super::stats::FetchStats;
use crate::error::MetricError;

#[derive(Clone)]
pub struct Fetcher {
    source: Arc<dyn MarketDataSource>,
    timeout: Duration,
    permits: Arc<Semaphore>,
    stats: Arc<FetchStats>,
}

impl Fetcher {
    /// Wrap `source`; `max_in_flight` is clamped to at least one.
    pub fn new(source: Arc<dyn MarketDataSource>, timeout: Duration, max_in_flight: usize) -> Self {
        Self {
            source,
            timeout,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
            stats: Arc::new(FetchStats::new()),
        }
    }

    pub fn stats(&self) -> &Arc<FetchStats> {
        &self.stats
    }

    /// Fetch one series. Never panics; every failure is a `MetricError`.
    pub async fn fetch(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Series, MetricError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| MetricError::FetchFault("fetcher closed".to_string()))?;

        self.stats.record_request();
        let outcome =
            tokio::time::timeout(self.timeout, self.source.fetch(symbol, period, interval)).await;

        match outcome {
            Err(_) => {
                self.stats.record_timeout();
                warn!(
                    source = self.source.name(),
                    symbol,
                    period,
                    interval,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "market data fetch timed out"
                );
                Err(MetricError::FetchFault(format!(
                    "timed out after {} ms",
                    self.timeout.as_millis()
                )))
            }
            Ok(Err(e)) => {
                self.stats.record_failure();
                warn!(
                    source = self.source.name(),
                    symbol,
                    period,
                    interval,
                    error = %e,
                    "market data fetch failed"
                );
                Err(MetricError::FetchFault(format!("{e:#}")))
            }
            Ok(Ok(series)) if series.is_empty() => {
                self.stats.record_empty();
                debug!(symbol, period, interval, "market data fetch returned no bars");
                Err(MetricError::NoData)
            }
            Ok(Ok(series)) => {
                self.stats.record_success();
                debug!(symbol, period, interval, bars = series.len(), "market data fetched");
                Ok(series)
            }
        }
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("source", &self.source.name())
            .field("timeout", &self.timeout)
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{closes, MockSource};

    fn fetcher(source: MockSource) -> Fetcher {
        Fetcher::new(Arc::new(source), Duration::from_millis(200), 4)
    }

    #[tokio::test]
    async fn data_available() {
        let f = fetcher(MockSource::new().with_series("^DJI", "1d", closes(&[1.0, 2.0])));
        let series = f.fetch("^DJI", "5d", "1d").await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(f.stats().snapshot().successes, 1);
    }

    #[tokio::test]
    async fn empty_series_is_no_data() {
        let f = fetcher(MockSource::new().with_series("^DJI", "1d", Vec::new()));
        assert_eq!(f.fetch("^DJI", "5d", "1d").await, Err(MetricError::NoData));
        assert_eq!(f.stats().snapshot().empty, 1);
    }

    #[tokio::test]
    async fn source_error_is_fetch_fault() {
        let f = fetcher(MockSource::new().with_failure("BAD", "1d", "unknown symbol"));
        match f.fetch("BAD", "5d", "1d").await {
            Err(MetricError::FetchFault(msg)) => assert!(msg.contains("unknown symbol")),
            other => panic!("expected fetch fault, got {other:?}"),
        }
        assert_eq!(f.stats().snapshot().failures, 1);
    }

    #[tokio::test]
    async fn timeout_is_fetch_fault() {
        let f = fetcher(MockSource::new().with_delay(
            "YM=F",
            "30m",
            Duration::from_secs(5),
            closes(&[1.0]),
        ));
        let res = f.fetch("YM=F", "1d", "30m").await;
        assert!(matches!(res, Err(MetricError::FetchFault(_))));
        let snap = f.stats().snapshot();
        assert_eq!(snap.timeouts, 1);
        assert_eq!(snap.failures, 1);
    }
}
