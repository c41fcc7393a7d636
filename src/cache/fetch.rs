//! Fetch Module
//!
//! Get-or-compute on top of the cache handle.
//!
//! The producer runs outside any lock and concurrent fetches of the same
//! missing key are not deduplicated: each may run its producer, and the
//! last commit to land is what stays cached.

use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use crate::cache::{Cache, Lookup, Probe};

// == Verdict ==
/// A producer's decision about the value it computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<V> {
    /// Store the value, then return it
    Commit(V),
    /// Return the value without storing it
    Ignore(V),
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Fetch ==
    /// Returns the live value(s) for `key`, computing them on a miss.
    ///
    /// A cached value is a hit whatever it contains, so an empty value put
    /// earlier short-circuits the producer. On a miss the producer receives
    /// the expired value still sitting in the store, if any. A committed
    /// value is stored with `ttl` (or the cache default). Producer errors
    /// are returned unchanged and nothing is stored.
    ///
    /// # Arguments
    /// * `key` - The key to look up
    /// * `ttl` - TTL for a committed value
    /// * `producer` - Computes the value on a miss
    pub fn fetch<E, F>(&self, key: K, ttl: Option<Duration>, producer: F) -> Result<Lookup<V>, E>
    where
        F: FnOnce(Option<V>) -> Result<Verdict<V>, E>,
    {
        let stale = match self.probe(&key) {
            Probe::Live(found) => return Ok(found),
            Probe::Stale(value) => Some(value),
            Probe::Missing => None,
        };

        let verdict = producer(stale)?;
        Ok(self.settle(key, ttl, verdict))
    }

    /// Async variant of [`Cache::fetch`]; the producer future is awaited
    /// without holding any part of the store.
    pub async fn fetch_async<E, F, Fut>(
        &self,
        key: K,
        ttl: Option<Duration>,
        producer: F,
    ) -> Result<Lookup<V>, E>
    where
        F: FnOnce(Option<V>) -> Fut,
        Fut: Future<Output = Result<Verdict<V>, E>>,
    {
        let stale = match self.probe(&key) {
            Probe::Live(found) => return Ok(found),
            Probe::Stale(value) => Some(value),
            Probe::Missing => None,
        };

        let verdict = producer(stale).await?;
        Ok(self.settle(key, ttl, verdict))
    }

    fn settle(&self, key: K, ttl: Option<Duration>, verdict: Verdict<V>) -> Lookup<V> {
        let value = match verdict {
            Verdict::Commit(value) => self.put(key, value, ttl),
            Verdict::Ignore(value) => value,
        };
        Lookup::from_value(self.mode(), value)
    }
}
