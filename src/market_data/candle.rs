use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV bar as returned by the market data provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time, unix seconds (UTC).
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// `true` when every price and volume field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }
}

/// An ordered OHLCV series for one symbol, ascending by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub symbol: String,
    /// Offset of the exchange's local time from UTC, in seconds.
    pub utc_offset_secs: i32,
    pub candles: Vec<Candle>,
}

impl Series {
    pub fn new(symbol: impl Into<String>, utc_offset_secs: i32, mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.timestamp);
        Self {
            symbol: symbol.into(),
            utc_offset_secs,
            candles,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// The bar before the last one, if any.
    pub fn previous(&self) -> Option<&Candle> {
        let n = self.candles.len();
        if n >= 2 {
            self.candles.get(n - 2)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sorts_ascending() {
        let series = Series::new(
            "^DJI",
            0,
            vec![
                Candle::new(300, 3.0, 3.0, 3.0, 3.0, 1.0),
                Candle::new(100, 1.0, 1.0, 1.0, 1.0, 1.0),
                Candle::new(200, 2.0, 2.0, 2.0, 2.0, 1.0),
            ],
        );
        let closes: Vec<f64> = series.candles.iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.previous().map(|c| c.close), Some(2.0));
    }

    #[test]
    fn previous_needs_two_bars() {
        let series = Series::new("^DJI", 0, vec![Candle::new(1, 1.0, 1.0, 1.0, 1.0, 0.0)]);
        assert!(series.previous().is_none());
        assert!(Series::default().last().is_none());
    }

    #[test]
    fn non_finite_detected() {
        let c = Candle::new(0, 1.0, f64::NAN, 1.0, 1.0, 1.0);
        assert!(!c.is_finite());
    }
}
