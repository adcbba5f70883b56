// =============================================================================
// Dashboard Configuration: static tables plus environment-driven settings
// =============================================================================
//
// The ticker, timeframe, and breadth-universe tables are compile-time
// constants. Operational settings (bind address, cache TTL, fetch timeout,
// concurrency bound, provider URL) come from the environment, with defaults
// for anything unset or unparsable.
//
// One `DashboardConfig` is built at startup and injected into the aggregator
// and the HTTP layer behind an `Arc`.
// =============================================================================

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::yahoo::DEFAULT_BASE_URL;

// =============================================================================
// Static tables
// =============================================================================

/// A sampling interval and the lookback requested with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timeframe {
    /// Display label, also sent to the provider as the interval.
    pub label: &'static str,
    /// Lookback period sent to the provider.
    pub period: &'static str,
}

/// A display label bound to a provider symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackedAsset {
    pub label: &'static str,
    pub symbol: &'static str,
}

/// Exchange-local time-of-day window, inclusive on both ends, in minutes
/// after midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionWindow {
    pub start_minute: u32,
    pub end_minute: u32,
}

impl SessionWindow {
    pub const fn new(start_minute: u32, end_minute: u32) -> Self {
        Self {
            start_minute,
            end_minute,
        }
    }

    pub fn contains(&self, minute_of_day: u32) -> bool {
        minute_of_day >= self.start_minute && minute_of_day <= self.end_minute
    }
}

impl std::fmt::Display for SessionWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start_minute / 60,
            self.start_minute % 60,
            self.end_minute / 60,
            self.end_minute % 60
        )
    }
}

pub const TIMEFRAMES: &[Timeframe] = &[
    Timeframe { label: "1m", period: "1d" },
    Timeframe { label: "5m", period: "1d" },
    Timeframe { label: "15m", period: "5d" },
    Timeframe { label: "30m", period: "5d" },
    Timeframe { label: "1h", period: "5d" },
    Timeframe { label: "4h", period: "1mo" },
    Timeframe { label: "1d", period: "3mo" },
];

pub const TRACKED_ASSETS: &[TrackedAsset] = &[
    TrackedAsset { label: "US30", symbol: "^DJI" },
    TrackedAsset { label: "YM FUT", symbol: "YM=F" },
    TrackedAsset { label: "US500", symbol: "^GSPC" },
    TrackedAsset { label: "US100", symbol: "^IXIC" },
    TrackedAsset { label: "VIX", symbol: "^VIX" },
    TrackedAsset { label: "DXY", symbol: "DX-Y.NYB" },
];

pub const GAP_TARGETS: &[TrackedAsset] = &[
    TrackedAsset { label: "US30 Gap %", symbol: "^DJI" },
    TrackedAsset { label: "YM Gap %", symbol: "YM=F" },
];

pub const DOW30_COMPONENTS: &[&str] = &[
    "MMM", "AXP", "AMGN", "AAPL", "BA", "CAT", "CVX", "CSCO", "KO", "DOW", "GS", "HD", "HON",
    "IBM", "INTC", "JNJ", "JPM", "MCD", "MRK", "MSFT", "NKE", "PG", "CRM", "TRV", "UNH", "VZ",
    "V", "AMZN", "WMT", "DIS",
];

/// Symbol whose intraday volume profile yields the point of control.
pub const POC_SYMBOL: &str = "^DJI";

/// Futures contract used for the overnight structure.
pub const OVERNIGHT_SYMBOL: &str = "YM=F";

/// 00:00 through 09:29 exchange-local time.
pub const OVERNIGHT_WINDOW: SessionWindow = SessionWindow::new(0, 9 * 60 + 29);

// =============================================================================
// Default-value helpers
// =============================================================================

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_IN_FLIGHT: usize = 8;

// =============================================================================
// DashboardConfig
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DashboardConfig {
    // --- Operational ---------------------------------------------------------
    pub bind_addr: String,
    pub cache_ttl_secs: u64,
    pub fetch_timeout_secs: u64,
    pub max_in_flight: usize,
    pub yahoo_base_url: String,

    // --- Static tables -------------------------------------------------------
    pub assets: &'static [TrackedAsset],
    pub gap_targets: &'static [TrackedAsset],
    pub timeframes: &'static [Timeframe],
    pub breadth_universe: &'static [&'static str],
    pub poc_symbol: &'static str,
    pub overnight_symbol: &'static str,
    pub overnight_window: SessionWindow,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            yahoo_base_url: DEFAULT_BASE_URL.to_string(),
            assets: TRACKED_ASSETS,
            gap_targets: GAP_TARGETS,
            timeframes: TIMEFRAMES,
            breadth_universe: DOW30_COMPONENTS,
            poc_symbol: POC_SYMBOL,
            overnight_symbol: OVERNIGHT_SYMBOL,
            overnight_window: OVERNIGHT_WINDOW,
        }
    }
}

impl DashboardConfig {
    /// Build from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// Recognised variables: `PULSE_BIND_ADDR`, `PULSE_CACHE_TTL_SECS`,
    /// `PULSE_FETCH_TIMEOUT_SECS`, `PULSE_MAX_IN_FLIGHT`,
    /// `PULSE_YAHOO_BASE_URL`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let config = Self {
            bind_addr: lookup_str(&lookup, "PULSE_BIND_ADDR").unwrap_or(defaults.bind_addr),
            cache_ttl_secs: lookup_parsed(&lookup, "PULSE_CACHE_TTL_SECS")
                .unwrap_or(defaults.cache_ttl_secs),
            fetch_timeout_secs: lookup_parsed::<u64>(&lookup, "PULSE_FETCH_TIMEOUT_SECS")
                .filter(|&secs| secs > 0)
                .unwrap_or(defaults.fetch_timeout_secs),
            max_in_flight: lookup_parsed::<usize>(&lookup, "PULSE_MAX_IN_FLIGHT")
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_in_flight),
            yahoo_base_url: lookup_str(&lookup, "PULSE_YAHOO_BASE_URL")
                .unwrap_or(defaults.yahoo_base_url),
            ..defaults
        };

        info!(
            bind_addr = %config.bind_addr,
            cache_ttl_secs = config.cache_ttl_secs,
            fetch_timeout_secs = config.fetch_timeout_secs,
            max_in_flight = config.max_in_flight,
            "dashboard config resolved"
        );

        config
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn lookup_str(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn lookup_parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    let raw = lookup_str(lookup, name)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(variable = name, value = %raw, "invalid value, using default");
            None
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> DashboardConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DashboardConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn default_config_has_expected_values() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(300));
        assert_eq!(cfg.assets.len(), 6);
        assert_eq!(cfg.assets[1].symbol, "YM=F");
        assert_eq!(cfg.timeframes.len(), 7);
        assert_eq!(cfg.breadth_universe.len(), 30);
        assert_eq!(cfg.overnight_window.to_string(), "00:00-09:29");
    }

    #[test]
    fn timeframe_table_matches_lookbacks() {
        let lookup: HashMap<_, _> = TIMEFRAMES.iter().map(|t| (t.label, t.period)).collect();
        assert_eq!(lookup["1m"], "1d");
        assert_eq!(lookup["1h"], "5d");
        assert_eq!(lookup["4h"], "1mo");
        assert_eq!(lookup["1d"], "3mo");
    }

    #[test]
    fn breadth_universe_has_no_duplicates() {
        let mut syms: Vec<&str> = DOW30_COMPONENTS.to_vec();
        syms.sort_unstable();
        syms.dedup();
        assert_eq!(syms.len(), 30);
    }

    #[test]
    fn environment_overrides_apply() {
        let cfg = from_map(&[
            ("PULSE_BIND_ADDR", "127.0.0.1:8080"),
            ("PULSE_CACHE_TTL_SECS", "60"),
            ("PULSE_MAX_IN_FLIGHT", "2"),
        ]);
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
        assert_eq!(cfg.cache_ttl_secs, 60);
        assert_eq!(cfg.max_in_flight, 2);
        assert_eq!(cfg.fetch_timeout_secs, 10);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let cfg = from_map(&[
            ("PULSE_CACHE_TTL_SECS", "five minutes"),
            ("PULSE_FETCH_TIMEOUT_SECS", "0"),
            ("PULSE_BIND_ADDR", "   "),
        ]);
        assert_eq!(cfg.cache_ttl_secs, 300);
        assert_eq!(cfg.fetch_timeout_secs, 10);
        assert_eq!(cfg.bind_addr, "0.0.0.0:5000");
    }

    #[test]
    fn session_window_is_inclusive() {
        assert!(OVERNIGHT_WINDOW.contains(0));
        assert!(OVERNIGHT_WINDOW.contains(9 * 60 + 29));
        assert!(!OVERNIGHT_WINDOW.contains(9 * 60 + 30));
    }
}
