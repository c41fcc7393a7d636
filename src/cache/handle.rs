//! Cache Handle Module
//!
//! The `Cache` handle ties an entry store to its janitor. Handles are cheap
//! to clone; the janitor stops when the last handle is dropped.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::{CacheStats, EntryStore, Lookup, Probe, StatsRecorder};
use crate::config::{CacheConfig, SizeLimit, StoreMode};
use crate::error::Result;
use crate::janitor::{spawn_janitor, JanitorHandle, JanitorObserver, TracingObserver};

// == Cache Core ==
/// State shared between cache handles and the janitor.
pub(crate) struct CacheCore<K, V>
where
    K: Eq + Hash,
{
    config: CacheConfig,
    store: EntryStore<K, V>,
    stats: StatsRecorder,
}

impl<K, V> CacheCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn name(&self) -> &str {
        &self.config.name
    }

    pub(crate) fn stats(&self) -> &StatsRecorder {
        &self.stats
    }

    pub(crate) fn remove_expired(&self) -> usize {
        let removed = self.store.remove_expired();
        self.stats.record_expirations(removed);
        removed
    }

    pub(crate) fn remove_oldest(&self, count: usize) -> usize {
        let removed = self.store.remove_oldest(count);
        self.stats.record_evictions(removed);
        removed
    }

    /// False once a size-limited store is back within its limit.
    ///
    /// Unlimited caches always accept an explicit reclaim request.
    pub(crate) fn needs_reclaim(&self) -> bool {
        match &self.config.limit {
            Some(limit) => self.store.len() > limit.max_size,
            None => true,
        }
    }
}

// == Cache ==
/// Handle to a running cache.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use ttl_cache::Cache;
///
/// # async fn demo() -> ttl_cache::error::Result<()> {
/// let cache: Cache<String, String> = Cache::builder("sessions")
///     .default_ttl(Duration::from_secs(300))
///     .sweep_interval(Duration::from_secs(1))
///     .limit(10_000, 0.1)
///     .build()?;
///
/// cache.put("user:1".to_string(), "alice".to_string(), None);
/// assert!(cache.get(&"user:1".to_string()).is_some());
/// # Ok(())
/// # }
/// ```
pub struct Cache<K, V>
where
    K: Eq + Hash,
{
    core: Arc<CacheCore<K, V>>,
    janitor: Arc<JanitorHandle>,
}

impl<K, V> Clone for Cache<K, V>
where
    K: Eq + Hash,
{
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            janitor: self.janitor.clone(),
        }
    }
}

impl<K, V> fmt::Debug for Cache<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("name", &self.core.config.name)
            .field("mode", &self.core.config.mode)
            .finish_non_exhaustive()
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Starts building a cache with the given name.
    pub fn builder(name: impl Into<String>) -> CacheBuilder<K, V> {
        CacheBuilder::new(name)
    }

    /// Creates a cache that logs janitor events through `tracing`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    /// Creates a cache reporting janitor events to `observer`.
    pub fn with_observer(config: CacheConfig, observer: Arc<dyn JanitorObserver>) -> Result<Self> {
        config.validate()?;

        let store = EntryStore::new(config.mode, config.default_ttl, &config.backend);
        let sweep_interval = config.sweep_interval.unwrap_or_default();
        let min_reclaim_interval = config.min_reclaim_interval;

        let core = Arc::new(CacheCore {
            config,
            store,
            stats: StatsRecorder::new(),
        });
        let janitor = spawn_janitor(core.clone(), sweep_interval, min_reclaim_interval, observer)?;

        info!(
            cache = %core.name(),
            mode = ?core.config.mode,
            default_ttl = ?core.config.default_ttl,
            limit = ?core.config.limit,
            "Cache created"
        );

        Ok(Self {
            core,
            janitor: Arc::new(janitor),
        })
    }

    // == Accessors ==
    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn mode(&self) -> StoreMode {
        self.core.config.mode
    }

    // == Put ==
    /// Stores a value and returns it.
    ///
    /// In a size-limited cache, crossing the limit sends a reclaim request
    /// to the janitor without waiting for it.
    pub fn put(&self, key: K, value: V, ttl: Option<Duration>) -> V {
        let stored = self.core.store.put(key, value, ttl);
        if let Some(limit) = &self.core.config.limit {
            self.check_limit(limit);
        }
        stored
    }

    fn check_limit(&self, limit: &SizeLimit) {
        let size = self.core.store.len();
        if size > limit.max_size {
            debug!(
                cache = %self.name(),
                size,
                max_size = limit.max_size,
                "Size limit exceeded, requesting reclaim"
            );
            self.janitor.request_reclaim(limit.reclaim_count());
        }
    }

    // == Get ==
    /// Returns the live value(s) for a key, or None.
    pub fn get(&self, key: &K) -> Option<Lookup<V>> {
        match self.probe(key) {
            Probe::Live(found) => Some(found),
            Probe::Stale(_) | Probe::Missing => None,
        }
    }

    /// Looks a key up and records the hit or miss.
    pub(crate) fn probe(&self, key: &K) -> Probe<V> {
        let probe = self.core.store.probe(key);
        match probe {
            Probe::Live(_) => self.core.stats.record_hit(),
            Probe::Stale(_) | Probe::Missing => self.core.stats.record_miss(),
        }
        probe
    }

    // == Delete ==
    /// Removes every entry under a key; false if there was none.
    pub fn delete(&self, key: &K) -> bool {
        self.core.store.delete(key)
    }

    // == Touch ==
    /// Restarts the TTL of a live key; false if absent or expired.
    pub fn touch(&self, key: &K) -> bool {
        self.core.store.touch(key)
    }

    // == Keys ==
    /// Lists keys once per physical entry.
    pub fn keys(&self, include_expired: bool) -> Vec<K> {
        self.core.store.keys(include_expired)
    }

    // == Purge ==
    /// Removes every entry, returning how many were removed.
    pub fn purge(&self) -> usize {
        let removed = self.core.store.purge();
        debug!(cache = %self.name(), removed, "Cache purged");
        removed
    }

    // == Remove Expired ==
    /// Runs an expiration sweep now, returning the number of entries removed.
    pub fn remove_expired(&self) -> usize {
        self.core.remove_expired()
    }

    // == Remove Oldest ==
    /// Evicts up to `count` oldest entries now, bypassing the janitor throttle.
    pub fn remove_oldest(&self, count: usize) -> usize {
        self.core.remove_oldest(count)
    }

    /// Asks the janitor for a throttled reclaim of `count` entries.
    ///
    /// In a size-limited cache the request is dropped if the store is
    /// within its limit by the time the janitor handles it.
    pub fn request_reclaim(&self, count: usize) {
        self.janitor.request_reclaim(count);
    }

    // == Length ==
    /// Number of physical entries, expired but unswept ones included.
    pub fn len(&self) -> usize {
        self.core.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.store.is_empty()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.core.stats.snapshot(self.len())
    }
}

// == Cache Builder ==
/// Fluent construction of a [`Cache`].
pub struct CacheBuilder<K, V> {
    config: CacheConfig,
    observer: Option<Arc<dyn JanitorObserver>>,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K, V> CacheBuilder<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_config(CacheConfig::new(name))
    }

    /// Starts from an existing config.
    pub fn from_config(config: CacheConfig) -> Self {
        Self {
            config,
            observer: None,
            _types: PhantomData,
        }
    }

    pub fn mode(mut self, mode: StoreMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = Some(ttl);
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = Some(interval);
        self
    }

    /// Bounds the cache to `max_size` entries, reclaiming
    /// `ceil(max_size * reclaim_fraction)` of the oldest on overflow.
    pub fn limit(mut self, max_size: usize, reclaim_fraction: f64) -> Self {
        self.config.limit = Some(SizeLimit::new(max_size, reclaim_fraction));
        self
    }

    pub fn min_reclaim_interval(mut self, interval: Duration) -> Self {
        self.config.min_reclaim_interval = interval;
        self
    }

    pub fn shard_amount(mut self, shards: usize) -> Self {
        self.config.backend.shard_amount = Some(shards);
        self
    }

    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.backend.initial_capacity = capacity;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn JanitorObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Validates the options and starts the cache and its janitor.
    pub fn build(self) -> Result<Cache<K, V>> {
        let observer = self
            .observer
            .unwrap_or_else(|| Arc::new(TracingObserver));
        Cache::with_observer(self.config, observer)
    }
}
