// =============================================================================
// Snapshot Cache: single-slot, TTL-bound, refresh under lock
// =============================================================================
//
// The slot mutex is held across the refresh itself, so concurrent readers
// that miss at the same time wait for one computation instead of each
// starting their own. The refresh runs in its own task which owns the slot
// guard: a reader that goes away mid-refresh does not abandon the work, and
// the next reader picks up its result. A value is stale once `elapsed > ttl`.
// =============================================================================

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinError;
use tracing::debug;

struct Entry<T> {
    value: Arc<T>,
    computed_at: Instant,
}

/// Observable cache state, without triggering a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CacheStatus {
    Empty,
    Ready { age_secs: u64 },
    /// A refresh (or another reader) currently holds the slot.
    Busy,
}

pub struct SnapshotCache<T> {
    slot: Arc<Mutex<Option<Entry<T>>>>,
}

impl<T> SnapshotCache<T>
where
    T: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Return the held value if it is younger than `ttl`, otherwise run
    /// `compute` on a spawned task, store its output, and return that.
    ///
    /// Fails only if the refresh task panicked or the runtime is shutting
    /// down; the slot keeps its previous contents in that case.
    pub async fn get_or_refresh<F, Fut>(&self, ttl: Duration, compute: F) -> Result<Arc<T>, JoinError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut slot = Arc::clone(&self.slot).lock_owned().await;

        if let Some(entry) = slot.as_ref() {
            let age = entry.computed_at.elapsed();
            if age <= ttl {
                debug!(age_ms = age.as_millis() as u64, "snapshot cache hit");
                return Ok(Arc::clone(&entry.value));
            }
            debug!(age_ms = age.as_millis() as u64, "snapshot cache expired");
        } else {
            debug!("snapshot cache empty");
        }

        let refresh = compute();
        tokio::spawn(async move {
            let value = Arc::new(refresh.await);
            *slot = Some(Entry {
                value: Arc::clone(&value),
                computed_at: Instant::now(),
            });
            value
        })
        .await
    }

    /// The held value and its age, if any, without refreshing or waiting.
    /// Returns `None` while the slot is empty or busy.
    pub fn peek(&self) -> Option<(Arc<T>, Duration)> {
        let slot = self.slot.try_lock().ok()?;
        slot.as_ref()
            .map(|entry| (Arc::clone(&entry.value), entry.computed_at.elapsed()))
    }

    /// Current state without waiting on the slot.
    pub fn status(&self) -> CacheStatus {
        match self.slot.try_lock() {
            Ok(slot) => match slot.as_ref() {
                Some(entry) => CacheStatus::Ready {
                    age_secs: entry.computed_at.elapsed().as_secs(),
                },
                None => CacheStatus::Empty,
            },
            Err(_) => CacheStatus::Busy,
        }
    }
}

impl<T> Default for SnapshotCache<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
