// =============================================================================
// Yahoo Finance Chart Client: public OHLCV endpoint
// =============================================================================
//
// GET {base}/v8/finance/chart/{symbol}?range={period}&interval={interval}
//
// The endpoint is unauthenticated. It answers unknown symbols with 404 and
// unsupported range/interval combinations with 422, both carrying a
// `chart.error` object. Rows with null prices are dropped.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use tracing::{debug, instrument};

use crate::market_data::{Candle, MarketDataSource, Series};

/// Production chart host.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// The chart API rejects requests without a browser-like user agent.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Yahoo Finance chart API client.
#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a client against `base_url` (no trailing path).
    ///
    /// `timeout` is the transport-level ceiling; the `Fetcher` applies its own
    /// per-call timeout on top.
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "YahooClient initialised");

        Ok(Self { base_url, client })
    }

    /// Build the chart URL, percent-encoding the symbol as a path segment.
    fn chart_url(&self, symbol: &str, period: &str, interval: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("invalid base url '{}'", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("base url '{}' cannot take a path", self.base_url))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        url.query_pairs_mut()
            .append_pair("range", period)
            .append_pair("interval", interval)
            .append_pair("includePrePost", "false");
        Ok(url)
    }

    // -------------------------------------------------------------------------
    // Public market data
    // -------------------------------------------------------------------------

    /// GET /v8/finance/chart/{symbol}.
    #[instrument(skip(self), name = "yahoo::get_chart")]
    pub async fn get_chart(&self, symbol: &str, period: &str, interval: &str) -> Result<Series> {
        let url = self.chart_url(symbol, period, interval)?;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("GET /v8/finance/chart request failed")?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .context("failed to read chart response body")?;
        let body: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("chart response ({status}) is not JSON"))?;

        if !status.is_success() {
            anyhow::bail!(
                "Yahoo GET /v8/finance/chart/{} returned {}: {}",
                symbol,
                status,
                describe_error(&body)
            );
        }

        let series = parse_chart(symbol, &body)?;
        debug!(symbol, period, interval, count = series.len(), "chart fetched");
        Ok(series)
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch(&self, symbol: &str, period: &str, interval: &str) -> Result<Series> {
        self.get_chart(symbol, period, interval).await
    }
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// -------------------------------------------------------------------------
// Response parsing
// -------------------------------------------------------------------------

/// Human-readable summary of a `chart.error` object, or the raw body.
fn describe_error(body: &serde_json::Value) -> String {
    let err = &body["chart"]["error"];
    match (err["code"].as_str(), err["description"].as_str()) {
        (Some(code), Some(desc)) => format!("{code}: {desc}"),
        _ => body.to_string(),
    }
}

/// Parse a chart payload into an ascending series.
///
/// Layout:
///   chart.result[0].meta.gmtoffset            exchange offset, seconds
///   chart.result[0].timestamp[i]              bar open time, unix seconds
///   chart.result[0].indicators.quote[0].open[i] / high / low / close / volume
///
/// A result without `timestamp` is a valid empty series.
fn parse_chart(symbol: &str, body: &serde_json::Value) -> Result<Series> {
    let chart = &body["chart"];
    if !chart["error"].is_null() {
        anyhow::bail!("chart error for {symbol}: {}", describe_error(body));
    }

    let result = chart["result"]
        .as_array()
        .and_then(|arr| arr.first())
        .context("chart response missing 'result' entry")?;

    let utc_offset_secs = result["meta"]["gmtoffset"].as_i64().unwrap_or(0) as i32;

    let timestamps = match result["timestamp"].as_array() {
        Some(ts) => ts,
        None => return Ok(Series::new(symbol, utc_offset_secs, Vec::new())),
    };

    let quote = result["indicators"]["quote"]
        .as_array()
        .and_then(|arr| arr.first())
        .context("chart response missing 'indicators.quote[0]'")?;

    let mut candles = Vec::with_capacity(timestamps.len());
    let mut skipped = 0usize;

    for (i, ts) in timestamps.iter().enumerate() {
        let Some(timestamp) = ts.as_i64() else {
            skipped += 1;
            continue;
        };
        let fields = (
            field_at(quote, "open", i),
            field_at(quote, "high", i),
            field_at(quote, "low", i),
            field_at(quote, "close", i),
        );
        let (Some(open), Some(high), Some(low), Some(close)) = fields else {
            skipped += 1;
            continue;
        };
        // Indices often report null or zero volume.
        let volume = field_at(quote, "volume", i).unwrap_or(0.0);
        candles.push(Candle::new(timestamp, open, high, low, close, volume));
    }

    if skipped > 0 {
        debug!(symbol, skipped, "dropped chart rows with missing fields");
    }

    Ok(Series::new(symbol, utc_offset_secs, candles))
}

fn field_at(quote: &serde_json::Value, name: &str, i: usize) -> Option<f64> {
    quote[name].get(i).and_then(serde_json::Value::as_f64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
