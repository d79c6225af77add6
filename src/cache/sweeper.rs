//! Periodic refresh of cached entries
//!
//! Requests only notice a changed file when somebody asks for it again. The
//! sweeper walks every cached path on a fixed interval so entries for files
//! that were deleted or edited are evicted or reloaded regardless of traffic.

use crate::cache::entry::FileStamp;
use crate::cache::store::CacheStore;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

/// Outcome of a single pass over the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries whose path was checked
    pub checked: usize,

    /// Entries removed because their file is gone
    pub evicted: usize,

    /// Background reloads scheduled for modified files
    pub reloads_scheduled: usize,
}

/// Background task refreshing a [`CacheStore`] on a timer
#[derive(Debug, Clone)]
pub struct Sweeper {
    store: CacheStore,
    period: Duration,
}

impl Sweeper {
    /// Create a sweeper ticking every `period`
    ///
    /// `period` must be non-zero.
    pub fn new(store: CacheStore, period: Duration) -> Self {
        Self { store, period }
    }

    /// Run the sweeper on the current runtime until the handle is aborted
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        tracing::info!(period = ?self.period, "Cache sweeper started");

        // First tick one full period from now, not immediately
        let mut ticker = interval_at(Instant::now() + self.period, self.period);

        loop {
            ticker.tick().await;
            let report = sweep(&self.store).await;
            tracing::debug!(
                checked = report.checked,
                evicted = report.evicted,
                reloads = report.reloads_scheduled,
                "Cache sweep finished"
            );
        }
    }
}

/// Check every cached path against the filesystem once
///
/// Missing files are evicted before this returns; modified files get a
/// reload that runs in the background.
pub async fn sweep(store: &CacheStore) -> SweepReport {
    let mut report = SweepReport::default();

    for (path, last_modified) in store.entries().await {
        report.checked += 1;

        match tokio::fs::metadata(&path).await {
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Cached file no longer accessible");
                if store.remove(&path).await {
                    report.evicted += 1;
                }
            }
            Ok(meta) => {
                let stamp = FileStamp::from_metadata(&meta);
                if stamp.modified != last_modified {
                    store.spawn_reload(path, stamp);
                    report.reloads_scheduled += 1;
                }
            }
        }
    }

    report
}
