// =============================================================================
// Snapshot Aggregator: one consolidated dashboard snapshot per refresh
// =============================================================================
//
// Issues every metric operation for the configured tables concurrently and
// assembles a `DashboardSnapshot`. Operations share nothing but the Fetcher,
// so the result is the same as evaluating them one after another.
// =============================================================================

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::DashboardConfig;
use crate::error::{Metric, MetricError};
use crate::market_data::Fetcher;
use crate::metrics::breadth::breadth;
use crate::metrics::gap::daily_gap;
use crate::metrics::overnight::overnight_structure;
use crate::metrics::timeframe::multi_timeframe_snapshot;
use crate::metrics::volume_profile::volume_profile_poc;
use crate::metrics::{AssetSnapshot, Breadth, GapEntry, OvernightStructure, PointOfControl};

/// Everything the dashboard shows, computed in one pass.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub id: Uuid,
    pub computed_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub assets: Vec<AssetSnapshot>,
    pub gaps: Vec<GapEntry>,
    pub breadth: Breadth,
    pub point_of_control: Metric<PointOfControl>,
    pub overnight: Metric<OvernightStructure>,
}

/// A metric that could not be computed, with where it belongs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnavailableMetric {
    pub metric: String,
    pub reason: MetricError,
}

impl DashboardSnapshot {
    /// Every unavailable metric in display order. Breadth constituents are
    /// listed individually.
    pub fn unavailable(&self) -> Vec<UnavailableMetric> {
        let mut out = Vec::new();

        for asset in &self.assets {
            for tf in &asset.timeframes {
                if let Some(reason) = tf.quote.reason() {
                    out.push(UnavailableMetric {
                        metric: format!("{} {}", asset.label, tf.label),
                        reason: reason.clone(),
                    });
                }
            }
        }
        for gap in &self.gaps {
            if let Some(reason) = gap.gap_pct.reason() {
                out.push(UnavailableMetric {
                    metric: gap.label.to_string(),
                    reason: reason.clone(),
                });
            }
        }
        for failure in &self.breadth.failed {
            out.push(UnavailableMetric {
                metric: format!("breadth {}", failure.symbol),
                reason: failure.reason.clone(),
            });
        }
        if let Some(reason) = self.point_of_control.reason() {
            out.push(UnavailableMetric {
                metric: "point of control".to_string(),
                reason: reason.clone(),
            });
        }
        if let Some(reason) = self.overnight.reason() {
            out.push(UnavailableMetric {
                metric: "overnight structure".to_string(),
                reason: reason.clone(),
            });
        }

        out
    }
}

pub struct SnapshotAggregator {
    config: Arc<DashboardConfig>,
    fetcher: Fetcher,
}

impl SnapshotAggregator {
    pub fn new(config: Arc<DashboardConfig>, fetcher: Fetcher) -> Self {
        Self { config, fetcher }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Compute a fresh snapshot. Never fails: unavailable metrics are
    /// carried inside the snapshot.
    pub async fn build(&self) -> DashboardSnapshot {
        let started = Instant::now();
        let cfg = &self.config;
        let fetcher = &self.fetcher;

        let assets = join_all(
            cfg.assets
                .iter()
                .map(|asset| multi_timeframe_snapshot(fetcher, asset, cfg.timeframes)),
        );
        let gaps = join_all(cfg.gap_targets.iter().map(|target| async move {
            GapEntry {
                label: target.label,
                symbol: target.symbol,
                gap_pct: daily_gap(fetcher, target.symbol).await,
            }
        }));

        let (assets, gaps, breadth, point_of_control, overnight) = tokio::join!(
            assets,
            gaps,
            breadth(fetcher, cfg.breadth_universe),
            volume_profile_poc(fetcher, cfg.poc_symbol),
            overnight_structure(fetcher, cfg.overnight_symbol, cfg.overnight_window),
        );

        let snapshot = DashboardSnapshot {
            id: Uuid::new_v4(),
            computed_at: Utc::now(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            assets,
            gaps,
            breadth,
            point_of_control,
            overnight,
        };

        info!(
            snapshot_id = %snapshot.id,
            elapsed_ms = snapshot.elapsed_ms,
            unavailable = snapshot.unavailable().len(),
            "dashboard snapshot built"
        );

        snapshot
    }
}
