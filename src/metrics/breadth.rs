// =============================================================================
// Advance / Decline Breadth
// =============================================================================
//
// For each constituent, the last daily bar is advancing when close - open > 0
// and declining otherwise (an unchanged bar counts as declining). Symbols
// whose fetch fails are excluded from both counts:
//
//   positive + negative == successful fetches

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, info};

use super::{pct_change, round2};
use crate::error::MetricError;
use crate::market_data::{Fetcher, Series};

const BREADTH_PERIOD: &str = "2d";
const BREADTH_INTERVAL: &str = "1d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Advancing,
    Declining,
}

impl Direction {
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Advancing => "▲",
            Self::Declining => "▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreadthDetail {
    pub symbol: String,
    pub direction: Direction,
    pub change_pct: f64,
}

/// A constituent left out of the counts, with why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreadthFailure {
    pub symbol: String,
    pub reason: MetricError,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Breadth {
    pub positive: usize,
    pub negative: usize,
    /// Symbols skipped because their fetch failed or returned no usable bar.
    pub failed: Vec<BreadthFailure>,
    pub detail: Vec<BreadthDetail>,
}

impl Breadth {
    /// Number of constituents that contributed to the counts.
    pub fn counted(&self) -> usize {
        self.positive + self.negative
    }

    pub fn failed_symbols(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.symbol.as_str()).collect()
    }
}

/// Classify the last bar of `series`.
pub fn classify(series: &Series) -> Result<BreadthDetail, MetricError> {
    let bar = series.last().ok_or(MetricError::NoData)?;
    if !bar.open.is_finite() || !bar.close.is_finite() {
        return Err(MetricError::NoData);
    }

    let direction = if bar.close - bar.open > 0.0 {
        Direction::Advancing
    } else {
        Direction::Declining
    };

    Ok(BreadthDetail {
        symbol: series.symbol.clone(),
        direction,
        change_pct: round2(pct_change(bar.open, bar.close)),
    })
}

/// Fold per-symbol fetch outcomes into counts, preserving input order.
pub fn tally<'a>(
    outcomes: impl IntoIterator<Item = (&'a str, Result<Series, MetricError>)>,
) -> Breadth {
    let mut breadth = Breadth::default();

    for (symbol, outcome) in outcomes {
        match outcome.and_then(|series| classify(&series)) {
            Ok(detail) => {
                match detail.direction {
                    Direction::Advancing => breadth.positive += 1,
                    Direction::Declining => breadth.negative += 1,
                }
                breadth.detail.push(detail);
            }
            Err(reason) => {
                debug!(symbol, reason = %reason, "breadth constituent skipped");
                breadth.failed.push(BreadthFailure {
                    symbol: symbol.to_string(),
                    reason,
                });
            }
        }
    }

    breadth
}

/// Fetch every constituent of `universe` and tally the result.
pub async fn breadth(fetcher: &Fetcher, universe: &[&str]) -> Breadth {
    let outcomes = join_all(universe.iter().map(|&symbol| async move {
        let outcome = fetcher
            .fetch(symbol, BREADTH_PERIOD, BREADTH_INTERVAL)
            .await;
        (symbol, outcome)
    }))
    .await;

    let breadth = tally(outcomes);
    info!(
        positive = breadth.positive,
        negative = breadth.negative,
        counted = breadth.counted(),
        failed = breadth.failed.len(),
        "breadth computed"
    );
    breadth
}
