//! Janitor Events
//!
//! Events emitted by the background janitor, and the observer seam that
//! consumes them.

use std::time::Duration;

use tracing::{debug, info};

// == Janitor Event ==
/// Outcome of one janitor action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JanitorEvent {
    /// An expiration sweep finished
    SweepCompleted { duration: Duration, removed: usize },
    /// A reclaim pass finished
    ReclaimCompleted { duration: Duration, removed: usize },
    /// A reclaim request arrived inside the throttle window and was dropped
    ReclaimSkipped,
}

// == Observer ==
/// Receives janitor events tagged with the emitting cache's name.
///
/// Called from the janitor task, so implementations should return quickly.
pub trait JanitorObserver: Send + Sync {
    fn on_event(&self, cache: &str, event: &JanitorEvent);
}

/// Default observer: structured log lines through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl JanitorObserver for TracingObserver {
    fn on_event(&self, cache: &str, event: &JanitorEvent) {
        match *event {
            JanitorEvent::SweepCompleted { duration, removed } if removed > 0 => {
                info!(cache, removed, ?duration, "TTL sweep removed expired entries");
            }
            JanitorEvent::SweepCompleted { duration, .. } => {
                debug!(cache, ?duration, "TTL sweep: no expired entries found");
            }
            JanitorEvent::ReclaimCompleted { duration, removed } => {
                info!(cache, removed, ?duration, "Reclaim evicted oldest entries");
            }
            JanitorEvent::ReclaimSkipped => {
                debug!(cache, "Reclaim skipped, throttle window still open");
            }
        }
    }
}
