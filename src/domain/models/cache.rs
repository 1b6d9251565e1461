//! Object cache entries and counters.

use std::time::Duration;
use tokio::time::Instant;

/// Default time-to-live for object cache entries (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_millis(300_000);

/// Default maximum number of object cache entries.
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// A value held by the object cache together with its expiry data.
///
/// Entries are owned by the cache; callers only ever receive clones of
/// `value`.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached payload
    pub value: V,
    /// When the entry was stored
    pub stored_at: Instant,
    /// How long the entry stays valid after `stored_at`
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// Create an entry stored now.
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            ttl,
        }
    }

    /// An entry expires once strictly more than `ttl` has elapsed.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > self.ttl
    }

    /// Whether the entry has expired as of now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

/// Statistics about object cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries currently held
    pub entries: usize,

    /// Maximum number of entries allowed
    pub max_entries: usize,

    /// Number of lookups that returned a value
    pub hits: u64,

    /// Number of lookups that returned nothing (absent or expired)
    pub misses: u64,

    /// Number of entries evicted to make room
    pub evictions: u64,

    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_strictly_after_ttl() {
        let entry = CacheEntry::new("v", Duration::from_millis(100));
        let stored = entry.stored_at;

        assert!(!entry.is_expired_at(stored + Duration::from_millis(100)));
        assert!(entry.is_expired_at(stored + Duration::from_millis(101)));
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert!(CacheStats::default().hit_rate().abs() < f64::EPSILON);
    }
}
