//! Janitor Scheduler
//!
//! Background task that periodically sweeps expired entries and runs
//! throttled reclaim passes when writers report an over-limit store.

use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::CacheCore;
use crate::error::{CacheError, Result};
use crate::janitor::{JanitorEvent, JanitorObserver};

// == Janitor Handle ==
/// Owner's side of a running janitor. Dropping it stops the task.
#[derive(Debug)]
pub(crate) struct JanitorHandle {
    name: String,
    requests: mpsc::UnboundedSender<usize>,
    task: JoinHandle<()>,
}

impl JanitorHandle {
    /// Asks the janitor to evict `count` oldest entries.
    ///
    /// Never blocks and never fails: a request sent after the janitor has
    /// stopped is dropped.
    pub(crate) fn request_reclaim(&self, count: usize) {
        let _ = self.requests.send(count);
    }
}

impl Drop for JanitorHandle {
    fn drop(&mut self) {
        self.task.abort();
        debug!(cache = %self.name, "Janitor stopped");
    }
}

// == Janitor ==
struct Janitor<K, V>
where
    K: Eq + Hash,
{
    core: Arc<CacheCore<K, V>>,
    observer: Arc<dyn JanitorObserver>,
    sweep_interval: Duration,
    min_reclaim_interval: Duration,
    /// Start time of the last reclaim, initialised when the janitor starts
    last_reclaim: Instant,
}

/// Spawns the janitor for a cache on the current tokio runtime.
///
/// # Arguments
/// * `core` - Shared cache state the janitor sweeps and reclaims
/// * `sweep_interval` - Period between expiration sweeps
/// * `min_reclaim_interval` - Throttle window measured from the start of the previous reclaim
/// * `observer` - Receives sweep and reclaim events
///
/// # Errors
/// Returns `CacheError::NoRuntime` when called outside a tokio runtime.
pub(crate) fn spawn_janitor<K, V>(
    core: Arc<CacheCore<K, V>>,
    sweep_interval: Duration,
    min_reclaim_interval: Duration,
    observer: Arc<dyn JanitorObserver>,
) -> Result<JanitorHandle>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;
    let (requests, receiver) = mpsc::unbounded_channel();
    let name = core.name().to_string();

    let janitor = Janitor {
        core,
        observer,
        sweep_interval,
        min_reclaim_interval,
        last_reclaim: Instant::now(),
    };
    let task = runtime.spawn(janitor.run(receiver));

    Ok(JanitorHandle {
        name,
        requests,
        task,
    })
}

impl<K, V> Janitor<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn run(mut self, mut requests: mpsc::UnboundedReceiver<usize>) {
        info!(
            cache = %self.core.name(),
            sweep_interval = ?self.sweep_interval,
            min_reclaim_interval = ?self.min_reclaim_interval,
            "Starting janitor"
        );

        let first_tick = tokio::time::Instant::now() + self.sweep_interval;
        let mut ticker = tokio::time::interval_at(first_tick, self.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.sweep(),
                request = requests.recv() => match request {
                    Some(count) => self.reclaim(count),
                    None => break,
                },
            }
        }
    }

    fn sweep(&self) {
        let started = Instant::now();
        let removed = self.core.remove_expired();
        self.emit(JanitorEvent::SweepCompleted {
            duration: started.elapsed(),
            removed,
        });
    }

    fn reclaim(&mut self, count: usize) {
        let started = Instant::now();
        let window_open = !self.min_reclaim_interval.is_zero()
            && started.duration_since(self.last_reclaim) <= self.min_reclaim_interval;

        if window_open {
            self.core.stats().record_reclaim_skipped();
            self.emit(JanitorEvent::ReclaimSkipped);
            return;
        }

        // Requests queued by a burst of puts outlive the overflow that sent them
        if !self.core.needs_reclaim() {
            debug!(cache = %self.core.name(), "Store within its limit, reclaim not needed");
            return;
        }

        self.last_reclaim = started;
        let removed = self.core.remove_oldest(count);
        self.core.stats().record_reclaim();
        self.emit(JanitorEvent::ReclaimCompleted {
            duration: started.elapsed(),
            removed,
        });
    }

    fn emit(&self, event: JanitorEvent) {
        self.observer.on_event(self.core.name(), &event);
    }
}
