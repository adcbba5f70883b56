// =============================================================================
// Central Application State: market-pulse dashboard
// =============================================================================
//
// Owned by the HTTP layer and shared via `Arc<AppState>`. Ties together the
// injected configuration, the snapshot aggregator, and the single-slot
// snapshot cache.
//
// Thread safety:
//   - tokio::sync::Mutex inside SnapshotCache guards check-then-refresh.
//   - parking_lot::RwLock for the recent-error log.
//   - Atomic counter for refresh tracking.
//   Both live in `RefreshLog`, shared with the spawned refresh task.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::aggregator::{DashboardSnapshot, SnapshotAggregator};
use crate::cache::SnapshotCache;
use crate::config::DashboardConfig;
use crate::market_data::{FetchStatsSnapshot, Fetcher, MarketDataSource};

// =============================================================================
// Error Record
// =============================================================================

/// An unavailable metric observed during a refresh, for the health payload.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Which metric could not be computed (e.g. "US30 4h").
    pub metric: String,
    /// Human-readable reason.
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

// =============================================================================
// Refresh Log
// =============================================================================

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// Refresh bookkeeping. Shared with the refresh task, which outlives the
/// request that started it.
#[derive(Default)]
pub struct RefreshLog {
    /// Number of snapshots computed since startup.
    count: AtomicU64,
    recent_errors: RwLock<Vec<ErrorRecord>>,
}

impl RefreshLog {
    fn record(&self, snapshot: &DashboardSnapshot) {
        self.count.fetch_add(1, Ordering::SeqCst);
        for item in snapshot.unavailable() {
            self.push_error(item.metric, item.reason.to_string());
        }
    }

    /// Record an error. The log is capped at [`MAX_RECENT_ERRORS`]; oldest
    /// entries are evicted first.
    pub fn push_error(&self, metric: String, message: String) {
        let record = ErrorRecord {
            metric,
            message,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        let excess = errors.len().saturating_sub(MAX_RECENT_ERRORS);
        if excess > 0 {
            errors.drain(..excess);
        }
    }
}

// =============================================================================
// AppState
// =============================================================================

pub struct AppState {
    // ── Configuration ───────────────────────────────────────────────────
    pub config: Arc<DashboardConfig>,

    // ── Core ────────────────────────────────────────────────────────────
    pub aggregator: Arc<SnapshotAggregator>,
    pub cache: SnapshotCache<DashboardSnapshot>,

    // ── Operational Status ──────────────────────────────────────────────
    pub refresh_log: Arc<RefreshLog>,

    // ── Timing ──────────────────────────────────────────────────────────
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Build the state around `source`. The fetcher's timeout and
    /// concurrency bound come from `config`.
    pub fn new(config: Arc<DashboardConfig>, source: Arc<dyn MarketDataSource>) -> Self {
        let fetcher = Fetcher::new(source, config.fetch_timeout(), config.max_in_flight);

        Self {
            aggregator: Arc::new(SnapshotAggregator::new(Arc::clone(&config), fetcher)),
            config,
            cache: SnapshotCache::new(),
            refresh_log: Arc::new(RefreshLog::default()),
            start_time: std::time::Instant::now(),
        }
    }

    /// The cached snapshot, recomputed when older than the configured TTL.
    pub async fn snapshot(&self) -> Result<Arc<DashboardSnapshot>> {
        let aggregator = Arc::clone(&self.aggregator);
        let log = Arc::clone(&self.refresh_log);

        self.cache
            .get_or_refresh(self.config.cache_ttl(), move || async move {
                let snapshot = aggregator.build().await;
                log.record(&snapshot);
                snapshot
            })
            .await
            .context("snapshot refresh task failed")
    }

    /// The held snapshot and its age, without refreshing.
    pub fn cached_snapshot(&self) -> Option<(Arc<DashboardSnapshot>, Duration)> {
        self.cache.peek()
    }

    // ── Error Logging ───────────────────────────────────────────────────

    pub fn recent_errors(&self) -> Vec<ErrorRecord> {
        self.refresh_log.recent_errors.read().clone()
    }

    // ── Introspection ───────────────────────────────────────────────────

    pub fn refreshes(&self) -> u64 {
        self.refresh_log.count.load(Ordering::SeqCst)
    }

    pub fn fetch_stats(&self) -> FetchStatsSnapshot {
        self.aggregator.fetcher().stats().snapshot()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
