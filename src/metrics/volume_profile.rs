// =============================================================================
// Volume Profile: approximate Point of Control
// =============================================================================
//
// Each intraday bar contributes its full volume to the bucket
// round((high + low) / 2), rounded half-to-even to a whole price unit. The
// POC is the bucket with the largest summed volume; ties go to the lowest
// price (buckets are scanned ascending and only a strictly larger volume
// replaces the current best).

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::round2;
use crate::error::{Metric, MetricError};
use crate::market_data::{Fetcher, Series};

const PROFILE_PERIOD: &str = "1d";
const PROFILE_INTERVAL: &str = "15m";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PointOfControl {
    /// Whole-unit price bucket with the highest traded volume.
    pub price: i64,
    pub volume: u64,
    /// Last close of the session.
    pub current: f64,
}

/// Summed volume per price bucket, ascending by price.
pub fn profile(series: &Series) -> BTreeMap<i64, f64> {
    let mut buckets = BTreeMap::new();
    for bar in series.candles.iter().filter(|c| c.is_finite()) {
        let level = ((bar.high + bar.low) / 2.0).round_ties_even() as i64;
        *buckets.entry(level).or_insert(0.0) += bar.volume;
    }
    buckets
}

pub fn point_of_control(series: &Series) -> Result<PointOfControl, MetricError> {
    let buckets = profile(series);

    let mut best: Option<(i64, f64)> = None;
    for (&level, &volume) in &buckets {
        match best {
            Some((_, best_volume)) if volume <= best_volume => {}
            _ => best = Some((level, volume)),
        }
    }
    let (price, volume) = best.ok_or(MetricError::NoData)?;

    let current = series
        .candles
        .iter()
        .rev()
        .find(|c| c.close.is_finite())
        .map(|c| c.close)
        .ok_or(MetricError::NoData)?;

    Ok(PointOfControl {
        price,
        volume: volume.max(0.0) as u64,
        current: round2(current),
    })
}

pub async fn volume_profile_poc(fetcher: &Fetcher, symbol: &str) -> Metric<PointOfControl> {
    let poc: Metric<PointOfControl> = fetcher
        .fetch(symbol, PROFILE_PERIOD, PROFILE_INTERVAL)
        .await
        .and_then(|series| point_of_control(&series))
        .into();
    debug!(symbol, poc = ?poc, "point of control computed");
    poc
}
