//! In-memory object cache with TTL expiry and LRU eviction
//!
//! Every component that wants to avoid redundant work shares one
//! `ObjectCache`. It is constructed once at startup and handed out as an
//! `Arc`, so it stays injectable in tests instead of living in a global.
//!
//! Recency is refreshed by both `set` and `get`, which makes this an LRU+TTL
//! hybrid rather than plain FIFO.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::domain::models::{CacheEntry, CacheStats, ObjectCacheConfig, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};

/// Internal cache state
struct CacheState<V> {
    /// Map from key to entry
    entries: HashMap<String, CacheEntry<V>>,

    /// LRU queue (most recently used at back, least recently used at front)
    lru_queue: VecDeque<String>,

    /// Maximum number of entries
    max_entries: usize,

    /// Statistics
    stats: CacheStats,
}

impl<V> CacheState<V> {
    fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru_queue: VecDeque::new(),
            max_entries,
            stats: CacheStats {
                max_entries,
                ..Default::default()
            },
        }
    }

    /// Move a key to the back of the LRU queue (mark as most recently used)
    fn touch(&mut self, key: &str) {
        self.lru_queue.retain(|k| k != key);
        self.lru_queue.push_back(key.to_string());
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.lru_queue.retain(|k| k != key);
        Some(entry)
    }

    /// Drop every entry whose TTL has elapsed
    fn purge_expired(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in expired {
            self.remove(&key);
            self.stats.expirations += 1;
            trace!(key = %key, "purged expired cache entry");
        }
    }

    /// Evict the least recently used entry
    fn evict_lru(&mut self) -> Option<String> {
        let key = self.lru_queue.pop_front()?;
        self.entries.remove(&key);
        self.stats.evictions += 1;
        Some(key)
    }

    fn sync_len(&mut self) {
        self.stats.entries = self.entries.len();
    }
}

/// Shared key/value cache with per-entry expiry and a bounded entry count.
///
/// Values are cloned out on read; callers never hold a live binding into
/// the cache. Use cheaply clonable values (`Bytes`, `Arc<T>`).
///
/// # Example
///
/// ```
/// use cacheway::services::ObjectCache;
/// use std::time::Duration;
///
/// let cache: ObjectCache<String> = ObjectCache::new(2);
/// cache.set("a", "1".to_string());
/// cache.set_with_ttl("b", "2".to_string(), Duration::from_secs(60));
///
/// assert_eq!(cache.get("a").as_deref(), Some("1"));
/// cache.set("c", "3".to_string()); // evicts "b", "a" was read more recently
/// assert!(!cache.has("b"));
/// ```
pub struct ObjectCache<V = Bytes> {
    state: Mutex<CacheState<V>>,
    default_ttl: Duration,
}

impl<V: Clone> ObjectCache<V> {
    /// Create a cache holding at most `max_entries` entries (minimum 1)
    pub fn new(max_entries: usize) -> Self {
        Self::with_default_ttl(max_entries, DEFAULT_TTL)
    }

    /// Create a cache with an explicit default TTL.
    pub fn with_default_ttl(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState::new(max_entries.max(1))),
            default_ttl,
        }
    }

    /// Create a cache sized and timed from configuration.
    pub fn from_config(config: &ObjectCacheConfig) -> Self {
        Self::with_default_ttl(
            config.max_entries,
            Duration::from_millis(config.default_ttl_ms),
        )
    }

    // A panic while holding the lock cannot leave the maps half-updated in a
    // way that breaks later calls, so a poisoned lock is recovered.
    fn lock(&self) -> MutexGuard<'_, CacheState<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a value with the default TTL
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store a value with an explicit TTL
    ///
    /// Expired entries across the whole cache are purged first. If the cache
    /// is still full, the least recently used entry is evicted. Overwriting
    /// an existing key never evicts another entry.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let mut state = self.lock();

        state.purge_expired(Instant::now());

        if state.remove(&key).is_none() && state.entries.len() >= state.max_entries {
            if let Some(evicted) = state.evict_lru() {
                debug!(evicted = %evicted, incoming = %key, "evicted least recently used entry");
            }
        }

        state.entries.insert(key.clone(), CacheEntry::new(value, ttl));
        state.touch(&key);
        state.sync_len();
    }

    /// Look up a value
    ///
    /// An expired entry is deleted and reported as a miss. A hit moves the
    /// entry to the most recently used position.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut state = self.lock();
        let now = Instant::now();

        let Some(expired) = state.entries.get(key).map(|entry| entry.is_expired_at(now)) else {
            state.stats.misses += 1;
            return None;
        };

        if expired {
            state.remove(key);
            state.stats.expirations += 1;
            state.stats.misses += 1;
            state.sync_len();
            return None;
        }

        state.touch(key);
        state.stats.hits += 1;
        state.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Whether `get` would hit.
    ///
    /// Delegates to `get`, so a positive answer also refreshes the entry's
    /// recency and an expired entry is deleted, exactly as a read would.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.lru_queue.clear();
        state.sync_len();
    }

    /// Number of entries currently held, expired or not
    pub fn size(&self) -> usize {
        self.lock().entries.len()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.lock().max_entries
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }
}

impl<V: Clone> Default for ObjectCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_set_get() {
        let cache: ObjectCache<u32> = ObjectCache::default();
        cache.set("a", 1);

        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.capacity(), 50);
    }

    #[test]
    fn test_cache_miss() {
        let cache: ObjectCache<u32> = ObjectCache::default();
        assert_eq!(cache.get("missing"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry_removes_entry() {
        let cache: ObjectCache<&str> = ObjectCache::default();
        cache.set_with_ttl("k", "v", Duration::from_millis(100));
        cache.set("other", "w");

        assert_eq!(cache.get("k"), Some("v"));

        tokio::time::advance(Duration::from_millis(101)).await;

        let before = cache.size();
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.size(), before - 1);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_valid_at_exact_ttl() {
        let cache: ObjectCache<&str> = ObjectCache::default();
        cache.set_with_ttl("k", "v", Duration::from_millis(100));

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(cache.get("k"), Some("v"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_purges_all_expired_entries() {
        let cache: ObjectCache<u32> = ObjectCache::new(10);
        cache.set_with_ttl("short-1", 1, Duration::from_millis(10));
        cache.set_with_ttl("short-2", 2, Duration::from_millis(10));
        cache.set_with_ttl("long", 3, Duration::from_secs(60));

        tokio::time::advance(Duration::from_millis(20)).await;
        cache.set("new", 4);

        assert_eq!(cache.size(), 2);
        assert_eq!(cache.stats().expirations, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_makes_room_without_eviction() {
        let cache: ObjectCache<u32> = ObjectCache::new(2);
        cache.set_with_ttl("stale", 1, Duration::from_millis(10));
        cache.set("fresh", 2);

        tokio::time::advance(Duration::from_millis(20)).await;
        cache.set("incoming", 3);

        assert!(cache.has("fresh"));
        assert!(cache.has("incoming"));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_lru_eviction() {
        let cache: ObjectCache<u32> = ObjectCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);

        assert_eq!(cache.size(), 2);
        assert!(!cache.has("a"));
        assert!(cache.has("b"));
        assert!(cache.has("c"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_read_promotes_recency() {
        let cache: ObjectCache<u32> = ObjectCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);

        // Reading A makes B the least recently used
        assert_eq!(cache.get("a"), Some(1));
        cache.set("d", 4);

        assert!(cache.has("a"));
        assert!(!cache.has("b"));
        assert!(cache.has("d"));
    }

    #[test]
    fn test_has_refreshes_recency_like_get() {
        let cache: ObjectCache<u32> = ObjectCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);

        assert!(cache.has("a"));
        cache.set("c", 3);

        assert!(cache.has("a"));
        assert!(!cache.has("b"));
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache: ObjectCache<u32> = ObjectCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 10);

        assert_eq!(cache.size(), 2);
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_write_refreshes_recency() {
        let cache: ObjectCache<u32> = ObjectCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 3);
        cache.set("c", 4);

        assert!(cache.has("a"));
        assert!(!cache.has("b"));
    }

    #[test]
    fn test_clear() {
        let cache: ObjectCache<u32> = ObjectCache::default();
        cache.set("a", 1);
        cache.set("b", 2);
        cache.clear();

        assert_eq!(cache.size(), 0);
        assert!(!cache.has("a"));
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache: ObjectCache<u32> = ObjectCache::new(0);
        cache.set("a", 1);
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.get("a"), Some(1));
    }

    #[test]
    fn test_stats() {
        let cache: ObjectCache<u32> = ObjectCache::new(1);
        cache.set("a", 1);
        cache.get("a");
        cache.get("nope");
        cache.set("b", 2);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.max_entries, 1);
    }

    #[test]
    fn test_from_config() {
        let config = ObjectCacheConfig {
            max_entries: 3,
            default_ttl_ms: 1_000,
            image_ttl_ms: 2_000,
        };
        let cache: ObjectCache<u32> = ObjectCache::from_config(&config);
        assert_eq!(cache.capacity(), 3);
    }
}
