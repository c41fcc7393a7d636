//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Insertion time, refreshed by touch and re-put
    pub inserted_at: Instant,
    /// Lifetime measured from `inserted_at`, None = no expiration
    pub ttl: Option<Duration>,
    /// Store-wide insertion sequence, breaks `inserted_at` ties
    pub seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current time.
    pub fn new(value: V, ttl: Option<Duration>, seq: u64) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            ttl,
            seq,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired relative to `now`.
    ///
    /// An entry is expired once strictly more than `ttl` has elapsed since
    /// insertion. Entries without a TTL never expire.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(self.inserted_at) > ttl,
            None => false,
        }
    }

    // == Refresh ==
    /// Resets the insertion time, restarting the TTL.
    pub fn refresh(&mut self, seq: u64) {
        self.inserted_at = Instant::now();
        self.seq = seq;
    }

    /// Ordering key for eviction: oldest insertion first, sequence breaks ties.
    pub fn age_key(&self) -> (Instant, u64) {
        (self.inserted_at, self.seq)
    }
}
