// =============================================================================
// Metrics Engine
// =============================================================================
//
// Pure, stateless transforms from OHLCV series to dashboard metrics. Each
// submodule exposes a synchronous computation over a `Series` plus one async
// operation that fetches through the `Fetcher` and computes. Failures are
// returned as `MetricError` / `Metric::Unavailable`, never panics.

pub mod breadth;
pub mod gap;
pub mod overnight;
pub mod timeframe;
pub mod volume_profile;

pub use breadth::{Breadth, Direction};
pub use gap::GapEntry;
pub use overnight::OvernightStructure;
pub use timeframe::{AssetSnapshot, TimeframeQuote};
pub use volume_profile::PointOfControl;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage change from `from` to `to`; zero when `from` is zero.
pub fn pct_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        0.0
    } else {
        (to - from) / from * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_change_basic() {
        assert!((pct_change(100.0, 105.0) - 5.0).abs() < 1e-10);
        assert!((pct_change(100.0, 98.0) + 2.0).abs() < 1e-10);
    }

    #[test]
    fn pct_change_zero_denominator() {
        assert_eq!(pct_change(0.0, 10.0), 0.0);
    }

    #[test]
    fn round2_basic() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(-0.125001), -0.13);
    }
}
