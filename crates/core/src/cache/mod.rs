//! Bounded, TTL-based associative caches.
//!
//! Process-wide, best-effort and rebuildable - never the source of truth.
//! Keys are composite strings built from provider + logical query. Eviction
//! is least-recently-stored, not least-recently-used: when the ceiling is
//! hit, the oldest-stored half of the entries is dropped before insertion.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::metrics;

/// One cached value with its storage time and lifetime.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) < self.ttl
    }
}

/// A bounded TTL cache safe to share across concurrently-running requests.
///
/// Critical sections are O(1) map operations, eviction excepted, behind a
/// single mutex.
pub struct TtlCache<V> {
    name: &'static str,
    default_ttl: Duration,
    max_entries: usize,
    inner: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(name: &'static str, max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            name,
            default_ttl,
            max_entries,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a key, returning the value only while its TTL is fresh.
    pub fn get(&self, key: &str) -> Option<V> {
        let inner = self.inner.lock().expect("cache lock poisoned");
        let hit = inner
            .get(key)
            .filter(|e| e.is_fresh(Instant::now()))
            .map(|e| e.value.clone());

        if hit.is_some() {
            metrics::CACHE_HITS.with_label_values(&[self.name]).inc();
        } else {
            metrics::CACHE_MISSES.with_label_values(&[self.name]).inc();
        }
        hit
    }

    /// Insert with the cache-wide default TTL.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    /// Insert with an explicit TTL, evicting the oldest-stored half first if
    /// the ceiling is reached.
    pub fn insert_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let mut inner = self.inner.lock().expect("cache lock poisoned");

        if inner.len() >= self.max_entries && !inner.contains_key(&key) {
            let dropped = evict_oldest_half(&mut inner);
            debug!(cache = self.name, dropped, "Cache ceiling hit, evicted oldest entries");
            metrics::CACHE_EVICTIONS
                .with_label_values(&[self.name])
                .inc_by(dropped as u64);
        }

        inner.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Remove a single key.
    pub fn remove(&self, key: &str) {
        self.inner.lock().expect("cache lock poisoned").remove(key);
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry whose TTL has lapsed.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.inner
            .lock()
            .expect("cache lock poisoned")
            .retain(|_, e| e.is_fresh(now));
    }

    pub fn clear(&self) {
        self.inner.lock().expect("cache lock poisoned").clear();
    }
}

/// Drop the oldest-stored half of the map. Returns how many entries went.
fn evict_oldest_half<V>(map: &mut HashMap<String, CacheEntry<V>>) -> usize {
    let mut by_age: Vec<(String, Instant)> = map
        .iter()
        .map(|(k, e)| (k.clone(), e.stored_at))
        .collect();
    by_age.sort_by_key(|(_, stored_at)| *stored_at);

    let to_drop = (by_age.len() / 2).max(1);
    for (key, _) in by_age.into_iter().take(to_drop) {
        map.remove(&key);
    }
    to_drop
}

/// Composite cache key: provider + logical query parts.
pub fn cache_key(parts: &[&str]) -> String {
    parts.join("::")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_fresh_entry() {
        let cache: TtlCache<String> = TtlCache::new("test", 10, Duration::from_secs(60));
        cache.insert("k", "v".to_string());
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn test_get_missing_entry() {
        let cache: TtlCache<String> = TtlCache::new("test", 10, Duration::from_secs(60));
        assert_eq!(cache.get("nope"), None);
    }

    #[test]
    fn test_expired_entry_not_returned() {
        let cache: TtlCache<u32> = TtlCache::new("test", 10, Duration::from_secs(60));
        cache.insert_with_ttl("k", 1, Duration::from_nanos(1));
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(cache.get("k"), None);
        // The stale entry still occupies a slot until purged.
        assert_eq!(cache.len(), 1);
        cache.purge_expired();
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_eviction_drops_oldest_half() {
        let cache: TtlCache<u32> = TtlCache::new("test", 4, Duration::from_secs(60));
        for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
            cache.insert(*key, i as u32);
            // Distinct storage instants so age ordering is deterministic.
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(cache.len(), 4);

        cache.insert("e", 5);
        // Oldest half (a, b) dropped, newest survive.
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("d"), Some(3));
        assert_eq!(cache.get("e"), Some(5));
    }

    #[test]
    fn test_overwrite_existing_key_never_evicts() {
        let cache: TtlCache<u32> = TtlCache::new("test", 2, Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("a", 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(3));
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_cache_key_composition() {
        assert_eq!(
            cache_key(&["realdebrid", "abc123", "5"]),
            "realdebrid::abc123::5"
        );
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;

        let cache: Arc<TtlCache<u32>> = Arc::new(TtlCache::new("test", 100, Duration::from_secs(60)));
        let mut handles = Vec::new();
        for t in 0..8u32 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for i in 0..50u32 {
                    cache.insert(format!("{t}-{i}"), i);
                    let _ = cache.get(&format!("{t}-{i}"));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert!(!cache.is_empty());
    }
}
