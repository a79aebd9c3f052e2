//! TTL-bounded response storage.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use logfolio_types::SharedClock;
use tokio::time::Instant;

/// A cached value and the instant it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Whether the entry is still within `ttl` at `now`.
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

/// Map of entries that expire `ttl` after being stored.
///
/// Expired entries are evicted lazily when they are looked up; there is no
/// background sweep.
pub struct TtlCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    ttl: Duration,
    clock: SharedClock,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: SharedClock) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            clock,
        }
    }

    /// Live value for `key`. An expired entry is removed and reported absent.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let fresh = self.entries.get(key)?.is_fresh(now, self.ttl);
        if fresh {
            self.entries.get(key).map(|entry| entry.value.clone())
        } else {
            self.entries.remove(key);
            tracing::debug!("evicted expired cache entry");
            None
        }
    }

    /// Store `value`, stamped with the current instant.
    pub fn insert(&mut self, key: K, value: V) {
        let stored_at = self.clock.now();
        self.entries.insert(key, CacheEntry { value, stored_at });
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Keep only the entries whose key satisfies `keep`. Returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| keep(key));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included until next touched.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
