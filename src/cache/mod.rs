//! Cache Module
//!
//! Concurrent in-memory caching with TTL expiration, size-bounded reclaim
//! and get-or-compute fetch.

mod entry;
mod fetch;
mod handle;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use fetch::Verdict;
pub use handle::{Cache, CacheBuilder};
pub(crate) use handle::CacheCore;
pub use stats::{CacheStats, StatsRecorder};
pub use store::{EntryStore, Lookup, Probe};
