// =============================================================================
// Daily Gap
// =============================================================================
//
// gap = (open[-1] - close[-2]) / close[-2] * 100 over a short daily series.

use serde::Serialize;
use tracing::debug;

use super::round2;
use crate::error::{Metric, MetricError};
use crate::market_data::{Fetcher, Series};

/// Daily lookback requested for the gap computation.
const GAP_PERIOD: &str = "5d";
const GAP_INTERVAL: &str = "1d";

#[derive(Debug, Clone, Serialize)]
pub struct GapEntry {
    pub label: &'static str,
    pub symbol: &'static str,
    pub gap_pct: Metric<f64>,
}

/// Today's open versus yesterday's close, in percent.
///
/// Fewer than two bars is `NoData`; a zero previous close is
/// `DegenerateDenominator`.
pub fn gap_pct(series: &Series) -> Result<f64, MetricError> {
    let today = series.last().ok_or(MetricError::NoData)?;
    let yesterday = series.previous().ok_or(MetricError::NoData)?;

    if !today.open.is_finite() || !yesterday.close.is_finite() {
        return Err(MetricError::NoData);
    }
    if yesterday.close == 0.0 {
        return Err(MetricError::DegenerateDenominator);
    }

    Ok(round2((today.open - yesterday.close) / yesterday.close * 100.0))
}

pub async fn daily_gap(fetcher: &Fetcher, symbol: &str) -> Metric<f64> {
    let gap: Metric<f64> = fetcher
        .fetch(symbol, GAP_PERIOD, GAP_INTERVAL)
        .await
        .and_then(|series| gap_pct(&series))
        .into();
    debug!(symbol, gap = ?gap, "daily gap computed");
    gap
}
