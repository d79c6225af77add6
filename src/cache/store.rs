//! Shared file cache
//!
//! Maps resolved file paths to their cached contents. The map itself sits
//! behind one lock that is only held to look up, insert or remove a slot;
//! every slot carries its own lock so that reloading one file never blocks
//! readers of another, and readers of a reloading file keep getting the
//! previous contents until the new ones are swapped in.

use crate::cache::entry::{CacheEntry, FileStamp};
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::SystemTime;
use tokio::io::AsyncReadExt;
use tokio::sync::{OnceCell, RwLock};

/// Per-path cache slot
#[derive(Debug)]
struct Slot {
    entry: RwLock<CacheEntry>,

    /// Set once the first load has run, successful or not
    primed: OnceCell<()>,

    /// True while a background reload owns this slot
    reloading: AtomicBool,
}

impl Slot {
    fn new() -> Self {
        Self {
            entry: RwLock::new(CacheEntry::placeholder()),
            primed: OnceCell::new(),
            reloading: AtomicBool::new(false),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    slots: RwLock<HashMap<PathBuf, Arc<Slot>>>,
    reloads: AtomicU64,
}

/// Process-wide cache of file contents keyed by resolved path
///
/// Cloning is cheap and every clone shares the same map.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    inner: Arc<Inner>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the contents to serve for `path`, given its freshly observed stamp
    ///
    /// The first request for a path loads it before returning; concurrent
    /// first requests share that single load. A known path whose
    /// modification time moved gets a background reload and is served
    /// from what is cached right now.
    pub async fn fetch(&self, path: &Path, stamp: FileStamp) -> Bytes {
        let slot = self.slot_or_insert(path).await;

        if !slot.primed.initialized() {
            slot.primed
                .get_or_init(|| self.reload_slot(path, &slot, stamp))
                .await;
            return slot.entry.read().await.content.clone();
        }

        let entry = slot.entry.read().await.clone();
        if entry.is_stale(stamp.modified) {
            tracing::debug!(path = %path.display(), "Cache entry stale, scheduling reload");
            self.spawn_slot_reload(path.to_path_buf(), slot, stamp);
        }

        entry.content
    }

    /// Snapshot of the entry cached for `path`, if any
    pub async fn get(&self, path: &Path) -> Option<CacheEntry> {
        let slot = self.slot(path).await?;
        let entry = slot.entry.read().await.clone();
        Some(entry)
    }

    /// Re-read `path` into its entry, if the path is cached
    ///
    /// Returns false when no entry exists for the path or another reload of
    /// it is already running.
    pub async fn reload(&self, path: &Path, stamp: FileStamp) -> bool {
        match self.slot(path).await {
            Some(slot) => self.reload_exclusive(path, &slot, stamp).await,
            None => false,
        }
    }

    /// Schedule a reload of `path` without waiting for it
    pub fn spawn_reload(&self, path: PathBuf, stamp: FileStamp) {
        let store = self.clone();
        tokio::spawn(async move {
            store.reload(&path, stamp).await;
        });
    }

    /// Drop the entry for `path`; returns whether one was present
    pub async fn remove(&self, path: &Path) -> bool {
        let removed = self.inner.slots.write().await.remove(path).is_some();
        if removed {
            tracing::info!(path = %path.display(), "Evicted cache entry");
        }
        removed
    }

    /// Schedule removal of `path` without waiting for it
    pub fn spawn_remove(&self, path: PathBuf) {
        let store = self.clone();
        tokio::spawn(async move {
            store.remove(&path).await;
        });
    }

    /// Paths that have been loaded at least once, with their recorded
    /// modification times
    pub async fn entries(&self) -> Vec<(PathBuf, SystemTime)> {
        let slots: Vec<(PathBuf, Arc<Slot>)> = self
            .inner
            .slots
            .read()
            .await
            .iter()
            .map(|(path, slot)| (path.clone(), Arc::clone(slot)))
            .collect();

        let mut entries = Vec::with_capacity(slots.len());
        for (path, slot) in slots {
            if slot.primed.initialized() {
                let last_modified = slot.entry.read().await.last_modified;
                entries.push((path, last_modified));
            }
        }
        entries
    }

    pub async fn contains(&self, path: &Path) -> bool {
        self.inner.slots.read().await.contains_key(path)
    }

    pub async fn len(&self) -> usize {
        self.inner.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of file reads performed since the store was created
    pub fn reload_count(&self) -> u64 {
        self.inner.reloads.load(Ordering::Relaxed)
    }

    async fn slot(&self, path: &Path) -> Option<Arc<Slot>> {
        self.inner.slots.read().await.get(path).cloned()
    }

    async fn slot_or_insert(&self, path: &Path) -> Arc<Slot> {
        if let Some(slot) = self.slot(path).await {
            return slot;
        }

        let mut slots = self.inner.slots.write().await;
        Arc::clone(
            slots
                .entry(path.to_path_buf())
                .or_insert_with(|| Arc::new(Slot::new())),
        )
    }

    fn spawn_slot_reload(&self, path: PathBuf, slot: Arc<Slot>, stamp: FileStamp) {
        let store = self.clone();
        tokio::spawn(async move {
            store.reload_exclusive(&path, &slot, stamp).await;
        });
    }

    async fn reload_exclusive(&self, path: &Path, slot: &Slot, stamp: FileStamp) -> bool {
        if slot.reloading.swap(true, Ordering::AcqRel) {
            tracing::trace!(path = %path.display(), "Reload already in flight");
            return false;
        }

        self.reload_slot(path, slot, stamp).await;
        slot.reloading.store(false, Ordering::Release);
        true
    }

    // A slot removed from the map while this runs is written to but never
    // put back, so a late reload cannot resurrect a deleted file.
    async fn reload_slot(&self, path: &Path, slot: &Slot, stamp: FileStamp) {
        self.inner.reloads.fetch_add(1, Ordering::Relaxed);

        match read_file(path, stamp.len).await {
            Ok(content) => {
                let len = content.len();
                *slot.entry.write().await = CacheEntry::new(content, stamp.modified);
                tracing::debug!(path = %path.display(), bytes = len, "Reloaded cache entry");
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to reload cache entry"
                );
            }
        }
    }
}

/// Read a whole file, using the observed length only as a capacity hint
async fn read_file(path: &Path, len_hint: u64) -> std::io::Result<Bytes> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut buf = Vec::with_capacity(usize::try_from(len_hint).unwrap_or(0));
    file.read_to_end(&mut buf).await?;
    Ok(Bytes::from(buf))
}
