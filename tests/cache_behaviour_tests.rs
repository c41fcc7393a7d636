//! Behavioural tests for the cache engine
//!
//! Exercises expiry, multi-value storage, fetch, eviction and reclaim
//! throttling through the public `Cache` handle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ttl_cache::{Cache, JanitorEvent, JanitorObserver, Lookup, StoreMode, Verdict};

#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<(String, JanitorEvent)>>,
}

impl EventLog {
    fn reclaims(&self) -> Vec<JanitorEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, event)| *event)
            .filter(|event| !matches!(event, JanitorEvent::SweepCompleted { .. }))
            .collect()
    }
}

impl JanitorObserver for EventLog {
    fn on_event(&self, cache: &str, event: &JanitorEvent) {
        self.events
            .lock()
            .unwrap()
            .push((cache.to_string(), *event));
    }
}

fn cache<V>(mode: StoreMode) -> Cache<String, V>
where
    V: Clone + Send + Sync + 'static,
{
    Cache::builder("behaviour")
        .mode(mode)
        .sweep_interval(Duration::from_secs(60))
        .build()
        .unwrap()
}

fn key(name: &str) -> String {
    name.to_string()
}

#[tokio::test]
async fn ttl_expiry_then_sweep() {
    let cache = cache::<&str>(StoreMode::Single);

    cache.put(key("key"), "value", Some(Duration::from_millis(20)));
    assert_eq!(cache.get(&key("key")), Some(Lookup::One("value")));

    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(cache.get(&key("key")), None);
    assert_eq!(cache.keys(true), vec![key("key")]);

    assert_eq!(cache.remove_expired(), 1);
    assert!(cache.keys(true).is_empty());
}

#[tokio::test]
async fn nil_value_is_cached() {
    let cache = cache::<Option<u32>>(StoreMode::Single);
    let calls = AtomicUsize::new(0);

    cache.put(key("nil"), None, None);

    let found = cache.fetch(key("nil"), None, |_| -> Result<_, ()> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Verdict::Commit(Some(1)))
    });
    assert_eq!(found, Ok(Lookup::One(None)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let found = cache.fetch(key("absent"), None, |_| -> Result<_, ()> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Verdict::Commit(Some(1)))
    });
    assert_eq!(found, Ok(Lookup::One(Some(1))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn multi_value_semantics() {
    let cache = cache::<&str>(StoreMode::Multi);

    cache.put(key("key"), "v1", None);
    cache.put(key("key"), "v2", None);

    assert_eq!(cache.get(&key("key")), Some(Lookup::Many(vec!["v1", "v2"])));
    assert_eq!(cache.keys(true), vec![key("key"), key("key")]);

    assert!(cache.delete(&key("key")));
    assert_eq!(cache.get(&key("key")), None);
    assert!(cache.keys(true).is_empty());
}

#[tokio::test]
async fn touch_extends_lifetime() {
    let cache = cache::<&str>(StoreMode::Single);

    cache.put(key("key"), "v", Some(Duration::from_millis(500)));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(cache.touch(&key("key")));
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(cache.get(&key("key")), Some(Lookup::One("v")));
}

#[tokio::test]
async fn size_limited_eviction_keeps_newest() {
    let cache: Cache<String, usize> = Cache::builder("limited")
        .sweep_interval(Duration::from_secs(60))
        .limit(10, 0.5)
        .build()
        .unwrap();

    for i in 0..11 {
        cache.put(format!("key{:02}", i), i, None);
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(cache.len(), 6);
    let mut keys = cache.keys(true);
    keys.sort();
    let expected: Vec<String> = (5..11).map(|i| format!("key{:02}", i)).collect();
    assert_eq!(keys, expected);
}

#[tokio::test]
async fn burst_of_puts_reclaims_back_to_limit() {
    let cache: Cache<String, usize> = Cache::builder("burst")
        .sweep_interval(Duration::from_secs(60))
        .limit(10, 0.5)
        .build()
        .unwrap();

    for i in 0..20 {
        cache.put(format!("key{:02}", i), i, None);
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    let len = cache.len();
    assert!((5..=10).contains(&len), "store holds {} entries", len);
    let mut keys = cache.keys(true);
    keys.sort();
    let expected: Vec<String> = (20 - len..20).map(|i| format!("key{:02}", i)).collect();
    assert_eq!(keys, expected);
}

#[tokio::test]
async fn reclaim_throttling() {
    let log = Arc::new(EventLog::default());
    let cache: Cache<String, usize> = Cache::builder("throttled")
        .sweep_interval(Duration::from_secs(60))
        .limit(4, 0.25)
        .min_reclaim_interval(Duration::from_millis(30))
        .observer(log.clone())
        .build()
        .unwrap();

    for i in 0..4 {
        cache.put(format!("key{}", i), i, None);
    }
    // Let the first throttle window, which opens when the janitor starts, pass
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Two overflows inside one window: only the first reclaims
    cache.put(key("over1"), 4, None);
    cache.put(key("over2"), 5, None);
    tokio::time::sleep(Duration::from_millis(10)).await;

    let events = log.reclaims();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        events[0],
        JanitorEvent::ReclaimCompleted { removed: 1, .. }
    ));
    assert_eq!(events[1], JanitorEvent::ReclaimSkipped);
    assert_eq!(cache.len(), 5);

    // After the window another overflow reclaims again
    tokio::time::sleep(Duration::from_millis(50)).await;
    cache.put(key("over3"), 6, None);
    tokio::time::sleep(Duration::from_millis(10)).await;

    let events = log.reclaims();
    assert_eq!(events.len(), 3);
    assert!(matches!(events[2], JanitorEvent::ReclaimCompleted { .. }));
    assert_eq!(cache.len(), 5);

    let names = log.events.lock().unwrap();
    assert!(names.iter().all(|(name, _)| name == "throttled"));
}

#[tokio::test]
async fn delete_absent_key_is_stable() {
    let cache = cache::<u32>(StoreMode::Single);

    for _ in 0..3 {
        assert!(!cache.delete(&key("missing")));
    }

    cache.put(key("present"), 1, None);
    assert!(cache.delete(&key("present")));
    assert!(!cache.delete(&key("present")));
}

#[tokio::test]
async fn concurrent_fetches_last_commit_wins() {
    let cache = cache::<usize>(StoreMode::Single);
    let produced = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let cache = cache.clone();
            let produced = produced.clone();
            tokio::spawn(async move {
                cache
                    .fetch_async(key("shared"), None, |_| async move {
                        produced.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Ok::<_, ()>(Verdict::Commit(i))
                    })
                    .await
            })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }

    // Producers are not deduplicated, and exactly one value remains
    assert!(produced.load(Ordering::SeqCst) >= 1);
    assert_eq!(cache.len(), 1);
    assert!(matches!(cache.get(&key("shared")), Some(Lookup::One(i)) if i < 8));
}

#[tokio::test]
async fn concurrent_writers_with_janitor() {
    let cache: Cache<usize, usize> = Cache::builder("stress")
        .sweep_interval(Duration::from_millis(5))
        .limit(200, 0.5)
        .default_ttl(Duration::from_millis(15))
        .build()
        .unwrap();

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let cache = cache.clone();
            tokio::task::spawn_blocking(move || {
                for i in 0..1000 {
                    let k = t * 10_000 + i;
                    cache.put(k, i, None);
                    cache.get(&k);
                    if i % 7 == 0 {
                        cache.delete(&k);
                    }
                }
            })
        })
        .collect();

    for writer in writers {
        writer.await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(cache.len(), cache.keys(true).len());
    assert!(cache.keys(false).is_empty());
}
