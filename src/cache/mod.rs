//! In-memory file cache
//!
//! Keeps the contents of served files keyed by resolved path and keeps them
//! consistent with the filesystem using modification times, checked on every
//! request and by a periodic sweep.

pub mod entry;
pub mod store;
pub mod sweeper;

pub use entry::{CacheEntry, FileStamp};
pub use store::CacheStore;
pub use sweeper::{SweepReport, Sweeper, sweep};
