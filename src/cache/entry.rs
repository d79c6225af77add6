//! Cached file records

use bytes::Bytes;
use std::fs::Metadata;
use std::time::SystemTime;

/// Filesystem state observed by a `stat` call, used to drive a reload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    /// File length in bytes at the time of the stat
    pub len: u64,

    /// Modification time at the time of the stat
    pub modified: SystemTime,
}

impl FileStamp {
    pub fn new(len: u64, modified: SystemTime) -> Self {
        Self { len, modified }
    }

    /// Capture the stamp of a file from its metadata
    ///
    /// Platforms without modification times report the Unix epoch, which
    /// means such files are never detected as stale.
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self {
            len: meta.len(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }
}

/// Contents of a file as of its last successful reload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Full file contents
    pub content: Bytes,

    /// Modification time recorded when `content` was captured
    pub last_modified: SystemTime,
}

impl CacheEntry {
    pub fn new(content: Bytes, last_modified: SystemTime) -> Self {
        Self {
            content,
            last_modified,
        }
    }

    /// Empty entry inserted before the first load completes
    pub fn placeholder() -> Self {
        Self::new(Bytes::new(), SystemTime::UNIX_EPOCH)
    }

    /// Whether the file has changed since this entry was captured
    pub fn is_stale(&self, modified: SystemTime) -> bool {
        self.last_modified != modified
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
