//! TTL Cache - An embeddable concurrent key-value cache
//!
//! Per-entry TTL expiration, optional size-bounded reclaim of the oldest
//! entries, and a get-or-compute `fetch` with commit/ignore verdicts. Each
//! cache runs one background janitor for sweeps and throttled reclaim.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod janitor;
pub mod models;

pub use api::AppState;
pub use cache::{Cache, CacheBuilder, CacheStats, Lookup, Verdict};
pub use config::{BackendOptions, CacheConfig, ServerConfig, SizeLimit, StoreMode};
pub use error::CacheError;
pub use janitor::{JanitorEvent, JanitorObserver, TracingObserver};
