use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use tokio::sync::RwLock;
use tokio::time::Instant;

// ==============================================================================
// Cache Entry
// ==============================================================================

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

// ==============================================================================
// Cache
// ==============================================================================

/// Bounded in-memory key/value cache with per-entry expiry.
///
/// An expired entry is a miss on read and is dropped there. Every write
/// first drops all expired entries, then stores the new one; at capacity
/// the least recently used live entry is evicted. Entries are replaced
/// whole, so concurrent writers of one key leave the last writer's value.
///
/// Shared by reference (typically inside an `Arc`ed service). Reads take
/// the write lock because an LRU hit updates recency. Uses
/// `tokio::time::Instant` so paused-time tests control expiry.
pub struct TtlCache<K, V> {
    entries: RwLock<LruCache<K, Entry<V>>>,
    default_ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(default_ttl: Duration, capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// The cached value, if present and not expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let live = entries
            .get(key)
            .map(|entry| entry.is_live(now).then(|| entry.value.clone()));
        match live {
            Some(Some(value)) => Some(value),
            Some(None) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl).await;
    }

    pub async fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        drop_expired(&mut entries, now);
        entries.put(
            key,
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    pub async fn remove(&self, key: &K) -> Option<V> {
        self.entries.write().await.pop(key).map(|entry| entry.value)
    }

    /// Drop every expired entry and return how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        drop_expired(&mut entries, Instant::now())
    }

    /// Number of stored entries, expired ones included until dropped.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn drop_expired<K, V>(entries: &mut LruCache<K, Entry<V>>, now: Instant) -> usize
where
    K: Eq + Hash + Clone,
{
    let expired: Vec<K> = entries
        .iter()
        .filter(|(_, entry)| !entry.is_live(now))
        .map(|(key, _)| key.clone())
        .collect();
    for key in &expired {
        entries.pop(key);
    }
    expired.len()
}
