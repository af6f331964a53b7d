//! Cache Statistics Module
//!
//! Tracks hits, misses and writes seen by the facade, combined with what the
//! backend reports about its own size.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::cache::StoreUsage;

// == Cache Stats ==
/// Point-in-time cache metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of reads answered from the cache
    pub hits: u64,
    /// Number of reads that fell through (absent, expired or unreadable)
    pub misses: u64,
    /// Number of writes the backend actually stored
    pub writes: u64,
    /// Entries currently held by the backend
    pub entries: u64,
    /// Bytes held, when the backend can tell
    pub bytes: Option<u64>,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Lock-free counters shared by every clone of the facade.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Combines the counters with the backend's usage.
    pub fn snapshot(&self, usage: StoreUsage) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            entries: usage.entries,
            bytes: usage.bytes,
        }
    }
}
