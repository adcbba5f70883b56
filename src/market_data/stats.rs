// =============================================================================
// Fetch Statistics: lock-free counters over every market data request
// =============================================================================
//
// Updated by the `Fetcher` after each request outcome; read by the health
// endpoint. Counters only ever grow for the lifetime of the process.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Failure ratio above which a warning is logged after each failure.
const FAILURE_WARN_RATIO: f64 = 0.5;
/// Minimum request count before the failure ratio is considered meaningful.
const FAILURE_WARN_MIN_REQUESTS: u64 = 20;

/// Thread-safe request counters backed by atomics.
pub struct FetchStats {
    requests: AtomicU64,
    successes: AtomicU64,
    empty: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
}

/// Immutable snapshot of the counters (serialised into the health payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchStatsSnapshot {
    pub requests: u64,
    pub successes: u64,
    pub empty: u64,
    pub failures: u64,
    pub timeouts: u64,
}

impl FetchStats {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            empty: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_empty(&self) {
        self.empty.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        let failures = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
        self.warn_if_degraded(failures);
    }

    /// A timeout counts as both a timeout and a failure.
    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        self.record_failure();
    }

    fn warn_if_degraded(&self, failures: u64) {
        let requests = self.requests.load(Ordering::Relaxed);
        if requests < FAILURE_WARN_MIN_REQUESTS {
            return;
        }
        let ratio = failures as f64 / requests as f64;
        if ratio > FAILURE_WARN_RATIO {
            warn!(
                failures,
                requests,
                ratio = format!("{ratio:.2}"),
                "market data failure ratio above threshold"
            );
        }
    }

    pub fn snapshot(&self) -> FetchStatsSnapshot {
        FetchStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }
}

impl Default for FetchStats {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FetchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchStats")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_counts_as_failure() {
        let stats = FetchStats::new();
        stats.record_request();
        stats.record_timeout();
        let snap = stats.snapshot();
        assert_eq!(snap.requests, 1);
        assert_eq!(snap.timeouts, 1);
        assert_eq!(snap.failures, 1);
        assert_eq!(snap.successes, 0);
    }

    #[test]
    fn counters_accumulate() {
        let stats = FetchStats::default();
        for _ in 0..3 {
            stats.record_request();
        }
        stats.record_success();
        stats.record_empty();
        stats.record_failure();
        let snap = stats.snapshot();
        assert_eq!(snap.requests, 3);
        assert_eq!(snap.successes, 1);
        assert_eq!(snap.empty, 1);
        assert_eq!(snap.failures, 1);
    }
}
