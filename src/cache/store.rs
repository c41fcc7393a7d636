//! Cache Store Module
//!
//! Concurrent entry store backed by a sharded `DashMap`.
//!
//! Per-key operations only lock the shard holding the key. Cross-key
//! operations (sweep, purge, eviction, key listing) walk the shards one at
//! a time and never hold the whole map, so they interleave with ordinary
//! reads and writes.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::cache::CacheEntry;
use crate::config::{BackendOptions, StoreMode};

// == Lookup ==
/// Live value(s) found for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    /// Single-value mode hit
    One(V),
    /// Multi-value mode hit, values in insertion order (never empty)
    Many(Vec<V>),
}

impl<V> Lookup<V> {
    /// Wraps one value in the shape the given mode returns.
    pub fn from_value(mode: StoreMode, value: V) -> Self {
        match mode {
            StoreMode::Single => Lookup::One(value),
            StoreMode::Multi => Lookup::Many(vec![value]),
        }
    }

    /// Number of values carried.
    pub fn len(&self) -> usize {
        match self {
            Lookup::One(_) => 1,
            Lookup::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Probe ==
/// Lookup result that also exposes an expired value still physically present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<V> {
    Live(Lookup<V>),
    /// Most recently inserted expired value
    Stale(V),
    Missing,
}

// == Entry Store ==
/// Concurrent key-value store with per-entry TTL.
#[derive(Debug)]
pub struct EntryStore<K, V>
where
    K: Eq + Hash,
{
    /// Entries per key, oldest first. Single mode keeps at most one.
    entries: DashMap<K, Vec<CacheEntry<V>>>,
    /// Storage mode, fixed at creation
    mode: StoreMode,
    /// TTL applied to entries put without one
    default_ttl: Option<Duration>,
    /// Physical entry count across all keys
    len: AtomicUsize,
    /// Insertion sequence source
    seq: AtomicU64,
}

impl<K, V> EntryStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `mode` - Single- or multi-value storage
    /// * `default_ttl` - TTL for entries put without one
    /// * `backend` - Options forwarded to the underlying map
    pub fn new(mode: StoreMode, default_ttl: Option<Duration>, backend: &BackendOptions) -> Self {
        let entries = match backend.shard_amount {
            Some(shards) => {
                DashMap::with_capacity_and_shard_amount(backend.initial_capacity, shards)
            }
            None => DashMap::with_capacity(backend.initial_capacity),
        };

        Self {
            entries,
            mode,
            default_ttl,
            len: AtomicUsize::new(0),
            seq: AtomicU64::new(0),
        }
    }

    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    // == Put ==
    /// Stores a value, overwriting (single mode) or appending (multi mode).
    ///
    /// Falls back to the store's default TTL when `ttl` is None.
    /// Returns the stored value.
    pub fn put(&self, key: K, value: V, ttl: Option<Duration>) -> V {
        let entry = CacheEntry::new(value.clone(), ttl.or(self.default_ttl), self.next_seq());

        // Counter updates happen under the shard lock so a concurrent
        // removal never decrements before the matching increment.
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => match self.mode {
                StoreMode::Single => {
                    let previous = occupied.insert(vec![entry]);
                    self.len.fetch_add(1, Ordering::Relaxed);
                    self.len.fetch_sub(previous.len(), Ordering::Relaxed);
                }
                StoreMode::Multi => {
                    occupied.get_mut().push(entry);
                    self.len.fetch_add(1, Ordering::Relaxed);
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(vec![entry]);
                self.len.fetch_add(1, Ordering::Relaxed);
            }
        }

        value
    }

    // == Get ==
    /// Returns the live value(s) for a key.
    ///
    /// Expired entries are skipped even if no sweep has removed them yet.
    /// A multi-value key whose entries have all expired reads as absent.
    pub fn get(&self, key: &K) -> Option<Lookup<V>> {
        match self.probe(key) {
            Probe::Live(found) => Some(found),
            Probe::Stale(_) | Probe::Missing => None,
        }
    }

    /// Like `get`, but reports an expired value that has not been swept yet.
    pub fn probe(&self, key: &K) -> Probe<V> {
        let now = Instant::now();
        let Some(slot) = self.entries.get(key) else {
            return Probe::Missing;
        };

        let mut live = slot
            .iter()
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.value.clone());

        let found = match self.mode {
            StoreMode::Single => live.next().map(Lookup::One),
            StoreMode::Multi => {
                let values: Vec<V> = live.collect();
                (!values.is_empty()).then_some(Lookup::Many(values))
            }
        };

        match found {
            Some(found) => Probe::Live(found),
            None => match slot.last() {
                Some(entry) => Probe::Stale(entry.value.clone()),
                None => Probe::Missing,
            },
        }
    }

    // == Delete ==
    /// Removes every entry under a key.
    ///
    /// Returns whether anything was physically removed. Deleting an absent
    /// key is not an error and keeps returning false.
    pub fn delete(&self, key: &K) -> bool {
        match self.entries.remove(key) {
            Some((_, slot)) => {
                self.len.fetch_sub(slot.len(), Ordering::Relaxed);
                !slot.is_empty()
            }
            None => false,
        }
    }

    // == Touch ==
    /// Restarts the TTL of the live entries under a key.
    ///
    /// Returns false if the key is absent or every entry has expired.
    pub fn touch(&self, key: &K) -> bool {
        let now = Instant::now();
        let Some(mut slot) = self.entries.get_mut(key) else {
            return false;
        };

        let mut touched = false;
        for entry in slot.iter_mut().filter(|entry| !entry.is_expired_at(now)) {
            entry.refresh(self.next_seq());
            touched = true;
        }
        touched
    }

    // == Keys ==
    /// Lists keys, once per physical entry.
    ///
    /// Expired but unswept entries are included only when asked for.
    pub fn keys(&self, include_expired: bool) -> Vec<K> {
        let now = Instant::now();
        let mut keys = Vec::with_capacity(self.len());

        for slot in self.entries.iter() {
            for entry in slot.value() {
                if include_expired || !entry.is_expired_at(now) {
                    keys.push(slot.key().clone());
                }
            }
        }
        keys
    }

    // == Purge ==
    /// Removes every entry, returning how many were removed.
    pub fn purge(&self) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, slot| {
            self.len.fetch_sub(slot.len(), Ordering::Relaxed);
            removed += slot.len();
            false
        });
        removed
    }

    // == Remove Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed. An entry deleted concurrently
    /// is simply no longer seen, so it is never counted twice.
    pub fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.entries.retain(|_, slot| {
            let before = slot.len();
            slot.retain(|entry| !entry.is_expired_at(now));
            let dropped = before - slot.len();
            self.len.fetch_sub(dropped, Ordering::Relaxed);
            removed += dropped;
            !slot.is_empty()
        });

        removed
    }

    // == Remove Oldest ==
    /// Removes up to `count` entries with the oldest insertion time.
    ///
    /// Ordering is global across keys; in multi mode single entries are
    /// evicted, not whole keys. Ties on insertion time fall back to the
    /// insertion sequence. Returns the number actually removed.
    pub fn remove_oldest(&self, count: usize) -> usize {
        if count == 0 {
            return 0;
        }

        let mut candidates: Vec<(Instant, u64, K)> = Vec::with_capacity(self.len());
        for slot in self.entries.iter() {
            for entry in slot.value() {
                let (inserted_at, seq) = entry.age_key();
                candidates.push((inserted_at, seq, slot.key().clone()));
            }
        }

        if candidates.len() > count {
            candidates.select_nth_unstable_by_key(count, |(inserted_at, seq, _)| {
                (*inserted_at, *seq)
            });
            candidates.truncate(count);
        }

        candidates
            .into_iter()
            .filter(|(_, seq, key)| self.remove_entry(key, *seq))
            .count()
    }

    /// Removes one entry identified by its sequence number.
    ///
    /// Returns false if the entry was refreshed or removed since it was seen.
    fn remove_entry(&self, key: &K, seq: u64) -> bool {
        let removed = match self.entries.get_mut(key) {
            Some(mut slot) => {
                let before = slot.len();
                slot.retain(|entry| entry.seq != seq);
                let removed = slot.len() != before;
                if removed {
                    self.len.fetch_sub(1, Ordering::Relaxed);
                }
                removed
            }
            None => false,
        };

        if removed {
            self.entries.remove_if(key, |_, slot| slot.is_empty());
        }
        removed
    }

    // == Length ==
    /// Returns the number of physical entries, expired ones included.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
