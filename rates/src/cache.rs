//! Keyed rate caching with TTL and invalidation tags.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::rate::Rate;

/// A cached rate entry.
///
/// Created or overwritten only by a successful fetch; superseded, never
/// destroyed in place.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached rate.
    pub rate: Rate,
    /// When the entry was written.
    pub cached_at: DateTime<Utc>,
    /// How long the entry is considered fresh.
    pub ttl: Duration,
    /// Invalidation tag; `invalidate` drops every entry carrying the tag.
    pub tag: String,
}

impl CacheEntry {
    fn new(rate: Rate, ttl: Duration, tag: String) -> Self {
        Self {
            rate,
            cached_at: Utc::now(),
            ttl,
            tag,
        }
    }

    /// Whether the entry is still within its TTL.
    pub fn is_fresh(&self) -> bool {
        Utc::now().signed_duration_since(self.cached_at) < self.ttl
    }
}

/// Thread-safe keyed cache. Reads are concurrent and lock-free; expired
/// entries are evicted on read.
pub struct RateCache {
    entries: DashMap<String, CacheEntry>,
}

impl RateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Get a fresh entry, evicting it if expired.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_fresh() {
                debug!(key, "cache hit");
                return Some(entry.clone());
            }
            drop(entry);
            self.entries.remove(key);
            debug!(key, "cache entry expired");
            return None;
        }

        debug!(key, "cache miss");
        None
    }

    /// Insert or overwrite an entry.
    pub fn set(&self, key: impl Into<String>, rate: Rate, ttl: Duration, tag: impl Into<String>) {
        self.entries
            .insert(key.into(), CacheEntry::new(rate, ttl, tag.into()));
    }

    /// Drop every entry carrying the given tag.
    pub fn invalidate(&self, tag: &str) {
        self.entries.retain(|_, entry| entry.tag != tag);
    }

    /// Number of entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration as StdDuration;

    fn make_rate(value: f64) -> Rate {
        Rate::new(value, "test").unwrap()
    }

    #[test]
    fn set_and_get() {
        let cache = RateCache::new();
        cache.set("usd", make_rate(36.5), Duration::hours(6), "api");

        let entry = cache.get("usd").unwrap();
        assert_eq!(entry.rate.value, 36.5);
        assert_eq!(entry.tag, "api");
    }

    #[test]
    fn miss_on_unknown_key() {
        let cache = RateCache::new();
        assert!(cache.get("usd").is_none());
    }

    #[test]
    fn expired_entry_is_evicted_on_read() {
        let cache = RateCache::new();
        cache.set("usd", make_rate(36.5), Duration::milliseconds(50), "api");

        assert!(cache.get("usd").is_some());

        sleep(StdDuration::from_millis(60));

        assert!(cache.get("usd").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn overwrite_supersedes() {
        let cache = RateCache::new();
        cache.set("usd", make_rate(36.5), Duration::hours(6), "api");
        cache.set("usd", make_rate(40.12), Duration::hours(6), "scrape");

        let entry = cache.get("usd").unwrap();
        assert_eq!(entry.rate.value, 40.12);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_drops_only_matching_tag() {
        let cache = RateCache::new();
        cache.set("usd", make_rate(36.5), Duration::hours(6), "api");
        cache.set("eur", make_rate(39.8), Duration::hours(6), "manual");

        cache.invalidate("api");

        assert!(cache.get("usd").is_none());
        assert!(cache.get("eur").is_some());
    }
}
