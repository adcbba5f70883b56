// src/test_util.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::Metric;
use crate::market_data::{Candle, MarketDataSource, Series};
use crate::metrics::{AssetSnapshot, TimeframeQuote};

/// Scripted reply for one `(symbol, interval)` pair.
#[derive(Clone)]
enum Reply {
    Bars(Vec<Candle>),
    Fail(String),
    Delay(Duration, Vec<Candle>),
}

/// In-memory source answering from a fixed script. Unscripted requests fail
/// the way an unknown symbol does.
pub struct MockSource {
    replies: HashMap<(String, String), Reply>,
    utc_offset_secs: i32,
    calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            utc_offset_secs: 0,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_series(mut self, symbol: &str, interval: &str, bars: Vec<Candle>) -> Self {
        self.replies
            .insert((symbol.to_string(), interval.to_string()), Reply::Bars(bars));
        self
    }

    pub fn with_failure(mut self, symbol: &str, interval: &str, msg: &str) -> Self {
        self.replies.insert(
            (symbol.to_string(), interval.to_string()),
            Reply::Fail(msg.to_string()),
        );
        self
    }

    pub fn with_delay(
        mut self,
        symbol: &str,
        interval: &str,
        delay: Duration,
        bars: Vec<Candle>,
    ) -> Self {
        self.replies.insert(
            (symbol.to_string(), interval.to_string()),
            Reply::Delay(delay, bars),
        );
        self
    }

    pub fn with_offset(mut self, utc_offset_secs: i32) -> Self {
        self.utc_offset_secs = utc_offset_secs;
        self
    }

    /// Number of `fetch` calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataSource for MockSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch(&self, symbol: &str, _period: &str, interval: &str) -> Result<Series> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .get(&(symbol.to_string(), interval.to_string()))
            .cloned();
        match reply {
            Some(Reply::Bars(bars)) => Ok(Series::new(symbol, self.utc_offset_secs, bars)),
            Some(Reply::Delay(delay, bars)) => {
                tokio::time::sleep(delay).await;
                Ok(Series::new(symbol, self.utc_offset_secs, bars))
            }
            Some(Reply::Fail(msg)) => anyhow::bail!("{msg}"),
            None => anyhow::bail!("no data found, symbol may be delisted: {symbol}"),
        }
    }
}

/// Bar with explicit fields; timestamp in unix seconds.
pub fn candle(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
    Candle::new(timestamp, open, high, low, close, volume)
}

/// One bar per close, 60 s apart, OHLC all equal to the close, volume 100.
pub fn closes(values: &[f64]) -> Vec<Candle> {
    values
        .iter()
        .enumerate()
        .map(|(i, &c)| Candle::new(i as i64 * 60, c, c, c, c, 100.0))
        .collect()
}

/// Wrap bars into a series with a zero UTC offset.
pub fn series(bars: Vec<Candle>) -> Series {
    Series::new("TEST", 0, bars)
}

/// The quote for one timeframe label of an asset, if that label exists.
pub fn quote_for<'a>(asset: &'a AssetSnapshot, label: &str) -> Option<&'a Metric<TimeframeQuote>> {
    asset
        .timeframes
        .iter()
        .find(|t| t.label == label)
        .map(|t| &t.quote)
}
