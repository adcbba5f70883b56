// =============================================================================
// Overnight Structure
// =============================================================================
//
// Session extremes of a futures contract inside an exchange-local window
// (00:00-09:29 by default):
//   mid      = (high + low) / 2
//   range    = high - low
//   position = (current - low) / range * 100     (0 when range is 0)
//
// Two days are fetched because a futures session opens the evening before;
// only the most recent local date with bars inside the window counts.
// `current` is the last close of the whole fetched series, which may sit
// outside the window, so position is not clamped to [0, 100].

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::Serialize;
use tracing::debug;

use super::round2;
use crate::config::SessionWindow;
use crate::error::{Metric, MetricError};
use crate::market_data::{Candle, Fetcher, Series};

const OVERNIGHT_PERIOD: &str = "2d";
const OVERNIGHT_INTERVAL: &str = "30m";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OvernightStructure {
    pub high: f64,
    pub low: f64,
    pub mid: f64,
    pub range: f64,
    pub current: f64,
    pub position_pct: f64,
}

/// Local date and minutes after local midnight for a bar, given the
/// exchange offset.
fn local_time(bar: &Candle, utc_offset_secs: i32) -> Option<(NaiveDate, u32)> {
    let offset = FixedOffset::east_opt(utc_offset_secs)
        .or_else(|| FixedOffset::east_opt(0))?;
    let local = DateTime::from_timestamp(bar.timestamp, 0)?.with_timezone(&offset);
    Some((local.date_naive(), local.hour() * 60 + local.minute()))
}

pub fn overnight_structure_of(
    series: &Series,
    window: SessionWindow,
) -> Result<OvernightStructure, MetricError> {
    let current = series
        .candles
        .iter()
        .rev()
        .find(|c| c.close.is_finite())
        .map(|c| c.close)
        .ok_or(MetricError::NoData)?;

    let in_window: Vec<(NaiveDate, &Candle)> = series
        .candles
        .iter()
        .filter(|c| c.is_finite())
        .filter_map(|bar| {
            let (date, minute) = local_time(bar, series.utc_offset_secs)?;
            window.contains(minute).then_some((date, bar))
        })
        .collect();
    let session = in_window
        .iter()
        .map(|(date, _)| *date)
        .max()
        .ok_or(MetricError::NoData)?;

    let (high, low) = in_window
        .iter()
        .filter(|(date, _)| *date == session)
        .fold((f64::MIN, f64::MAX), |(high, low), (_, bar)| {
            (high.max(bar.high), low.min(bar.low))
        });

    let range = high - low;
    let position_pct = if range > 0.0 {
        (current - low) / range * 100.0
    } else {
        0.0
    };

    Ok(OvernightStructure {
        high: round2(high),
        low: round2(low),
        mid: round2((high + low) / 2.0),
        range: round2(range),
        current: round2(current),
        position_pct: round2(position_pct),
    })
}

pub async fn overnight_structure(
    fetcher: &Fetcher,
    symbol: &str,
    window: SessionWindow,
) -> Metric<OvernightStructure> {
    let structure: Metric<OvernightStructure> = fetcher
        .fetch(symbol, OVERNIGHT_PERIOD, OVERNIGHT_INTERVAL)
        .await
        .and_then(|series| overnight_structure_of(&series, window))
        .into();
    debug!(symbol, window = %window, structure = ?structure, "overnight structure computed");
    structure
}
