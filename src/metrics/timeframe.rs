// =============================================================================
// Multi-Timeframe Snapshot
// =============================================================================
//
// For each timeframe of a tracked asset:
//   price      = last close
//   change_pct = (close[-1] - close[-2]) / close[-2] * 100   (0 if < 2 bars)
//   volume     = last-bar volume
//   avg_volume = mean volume over the series
//   vol_ratio  = volume / avg_volume                         (0 if avg is 0)
//
// Timeframes are fetched concurrently; a failure affects its own entry only.

use futures_util::future::join_all;
use serde::Serialize;
use tracing::debug;

use super::{pct_change, round2};
use crate::config::{Timeframe, TrackedAsset};
use crate::error::{Metric, MetricError};
use crate::market_data::{Candle, Fetcher, Series};

/// Derived price/volume record for one timeframe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimeframeQuote {
    pub price: f64,
    pub change_pct: f64,
    pub volume: u64,
    pub avg_volume: u64,
    pub vol_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeframeEntry {
    pub label: &'static str,
    pub period: &'static str,
    pub quote: Metric<TimeframeQuote>,
}

/// All timeframes for one tracked asset, in table order.
#[derive(Debug, Clone, Serialize)]
pub struct AssetSnapshot {
    pub label: &'static str,
    pub symbol: &'static str,
    pub timeframes: Vec<TimeframeEntry>,
}

/// Compute the quote for one series. Non-finite bars are ignored.
pub fn timeframe_quote(series: &Series) -> Result<TimeframeQuote, MetricError> {
    let bars: Vec<&Candle> = series.candles.iter().filter(|c| c.is_finite()).collect();
    let last = bars.last().ok_or(MetricError::NoData)?;

    let change_pct = match bars.len() {
        n if n >= 2 => pct_change(bars[n - 2].close, last.close),
        _ => 0.0,
    };

    let volume = last.volume;
    let avg_volume = bars.iter().map(|c| c.volume).sum::<f64>() / bars.len() as f64;
    let vol_ratio = if avg_volume > 0.0 {
        round2(volume / avg_volume)
    } else {
        0.0
    };

    Ok(TimeframeQuote {
        price: round2(last.close),
        change_pct: round2(change_pct),
        volume: volume.max(0.0) as u64,
        avg_volume: avg_volume.max(0.0) as u64,
        vol_ratio,
    })
}

/// Fetch and compute every timeframe of `asset`.
pub async fn multi_timeframe_snapshot(
    fetcher: &Fetcher,
    asset: &TrackedAsset,
    timeframes: &[Timeframe],
) -> AssetSnapshot {
    let entries = join_all(timeframes.iter().map(|tf| async move {
        let quote: Metric<TimeframeQuote> = fetcher
            .fetch(asset.symbol, tf.period, tf.label)
            .await
            .and_then(|series| timeframe_quote(&series))
            .into();
        TimeframeEntry {
            label: tf.label,
            period: tf.period,
            quote,
        }
    }))
    .await;

    let available = entries.iter().filter(|e| e.quote.is_ok()).count();
    debug!(
        asset = asset.label,
        symbol = asset.symbol,
        available,
        total = entries.len(),
        "multi-timeframe snapshot computed"
    );

    AssetSnapshot {
        label: asset.label,
        symbol: asset.symbol,
        timeframes: entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TIMEFRAMES;
    use crate::test_util::{candle, closes, quote_for, series, MockSource};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn change_from_prior_bar() {
        let q = timeframe_quote(&series(closes(&[100.0, 105.0]))).unwrap();
        assert_eq!(q.price, 105.0);
        assert_eq!(q.change_pct, 5.0);
    }

    #[test]
    fn single_bar_has_zero_change() {
        let q = timeframe_quote(&series(closes(&[42.0]))).unwrap();
        assert_eq!(q.price, 42.0);
        assert_eq!(q.change_pct, 0.0);
    }

    #[test]
    fn empty_series_is_no_data() {
        assert_eq!(timeframe_quote(&series(Vec::new())), Err(MetricError::NoData));
    }

    #[test]
    fn zero_average_volume_gives_zero_ratio() {
        let bars = vec![
            candle(0, 10.0, 10.0, 10.0, 10.0, 0.0),
            candle(60, 10.0, 11.0, 10.0, 11.0, 0.0),
        ];
        let q = timeframe_quote(&series(bars)).unwrap();
        assert_eq!(q.avg_volume, 0);
        assert_eq!(q.vol_ratio, 0.0);
    }

    #[test]
    fn volume_ratio_against_mean() {
        let bars = vec![
            candle(0, 1.0, 1.0, 1.0, 1.0, 100.0),
            candle(60, 1.0, 1.0, 1.0, 1.0, 200.0),
            candle(120, 1.0, 1.0, 1.0, 1.0, 300.0),
        ];
        let q = timeframe_quote(&series(bars)).unwrap();
        assert_eq!(q.volume, 300);
        assert_eq!(q.avg_volume, 200);
        assert_eq!(q.vol_ratio, 1.5);
    }

    #[test]
    fn zero_previous_close_gives_zero_change() {
        let q = timeframe_quote(&series(closes(&[0.0, 10.0]))).unwrap();
        assert_eq!(q.change_pct, 0.0);
    }

    #[test]
    fn non_finite_bars_are_ignored() {
        let mut bars = closes(&[100.0, 110.0]);
        bars.push(candle(999, f64::NAN, 1.0, 1.0, f64::NAN, 1.0));
        let q = timeframe_quote(&series(bars)).unwrap();
        assert_eq!(q.price, 110.0);
        assert_eq!(q.change_pct, 10.0);
    }

    #[tokio::test]
    async fn failures_are_isolated_per_timeframe() {
        let source = MockSource::new()
            .with_series("^DJI", "1h", closes(&[100.0, 101.0]))
            .with_failure("^DJI", "4h", "Invalid input - interval=4h is not supported")
            .with_series("^DJI", "1d", Vec::new());
        let fetcher = Fetcher::new(Arc::new(source), Duration::from_secs(1), 4);
        let asset = TrackedAsset { label: "US30", symbol: "^DJI" };

        let snap = multi_timeframe_snapshot(&fetcher, &asset, TIMEFRAMES).await;

        assert_eq!(snap.timeframes.len(), TIMEFRAMES.len());
        assert_eq!(snap.timeframes[0].label, "1m");
        assert_eq!(quote_for(&snap, "1h").and_then(|m| m.value()).map(|q| q.change_pct), Some(1.0));
        assert!(matches!(
            quote_for(&snap, "4h").and_then(|m| m.reason()),
            Some(MetricError::FetchFault(_))
        ));
        assert_eq!(quote_for(&snap, "1d").and_then(|m| m.reason()), Some(&MetricError::NoData));
    }
}
