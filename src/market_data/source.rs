// =============================================================================
// Market Data Source: the external OHLCV provider seam
// =============================================================================

use anyhow::Result;
use async_trait::async_trait;

use super::candle::Series;

/// A remote service returning OHLCV series for a symbol.
///
/// Implementations may return an empty series or an error for unknown
/// symbols and unsupported `period`/`interval` combinations. Callers only
/// distinguish "data available" from "no data".
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch `symbol` over the lookback `period` (e.g. "5d") sampled at
    /// `interval` (e.g. "1h").
    async fn fetch(&self, symbol: &str, period: &str, interval: &str) -> Result<Series>;
}
