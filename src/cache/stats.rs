//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, expirations and evictions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of lookups that found a live value
    pub hits: u64,
    /// Number of lookups that found nothing live
    pub misses: u64,
    /// Number of entries removed by reclaim
    pub evictions: u64,
    /// Number of entries removed by expiration sweeps
    pub expirations: u64,
    /// Number of reclaim passes that ran
    pub reclaims: u64,
    /// Number of reclaim requests dropped by the throttle
    pub reclaims_skipped: u64,
    /// Current number of physical entries in the cache
    pub total_entries: usize,
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
/// Lock-free counters shared by callers and the janitor.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    reclaims: AtomicU64,
    reclaims_skipped: AtomicU64,
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

    pub fn record_evictions(&self, count: usize) {
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_expirations(&self, count: usize) {
        self.expirations.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_reclaim(&self) {
        self.reclaims.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reclaim_skipped(&self) {
        self.reclaims_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads all counters. Individual counters are consistent, the set as a whole is not.
    pub fn snapshot(&self, total_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            reclaims: self.reclaims.load(Ordering::Relaxed),
            reclaims_skipped: self.reclaims_skipped.load(Ordering::Relaxed),
            total_entries,
        }
    }
}
