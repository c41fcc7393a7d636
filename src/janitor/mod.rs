//! Janitor Module
//!
//! One background task per cache, owning sweep timing and reclaim throttling.
//!
//! # Duties
//! - TTL sweep: removes expired entries every sweep interval
//! - Reclaim: evicts the oldest entries when writers report an over-limit
//!   store, at most once per throttle window

mod events;
mod scheduler;

pub use events::{JanitorEvent, JanitorObserver, TracingObserver};
pub(crate) use scheduler::{spawn_janitor, JanitorHandle};
