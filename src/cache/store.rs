//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with FIFO eviction and TTL
//! expiration. The store is single-threaded; `TimedCache` shares it behind a
//! lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::{expiry, CacheEntry, CacheStats, EntryInfo, InsertionOrder, KeyPattern};
use crate::config::CacheConfig;
use crate::error::Result;

/// Estimates the size in bytes of a payload.
pub type Weigher<V> = Arc<dyn Fn(&V) -> usize + Send + Sync>;

// == Lookup ==
/// Outcome of reading a key.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<V> {
    /// Live entry younger than `stale_after`
    Fresh(V),
    /// Live entry older than `stale_after`
    Stale(V),
    /// No live entry
    Miss,
}

impl<V> Lookup<V> {
    pub fn into_value(self) -> Option<V> {
        match self {
            Lookup::Fresh(value) | Lookup::Stale(value) => Some(value),
            Lookup::Miss => None,
        }
    }
}

// == Cache Store ==
/// Cache storage with FIFO eviction and TTL support.
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Insertion order for eviction
    order: InsertionOrder,
    /// Performance statistics
    stats: CacheStats,
    /// Summed `size` of stored entries
    total_bytes: usize,
    config: CacheConfig,
    weigher: Option<Weigher<V>>,
}

impl<V> fmt::Debug for CacheStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.entries.len())
            .field("total_bytes", &self.total_bytes)
            .field("config", &self.config)
            .field("weighted", &self.weigher.is_some())
            .finish()
    }
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store after validating `config`.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            stats: CacheStats::new(),
            total_bytes: 0,
            config,
            weigher: None,
        })
    }

    /// Installs the function used to weigh payloads against `max_bytes`.
    pub fn with_weigher(mut self, weigher: Weigher<V>) -> Self {
        self.weigher = Some(weigher);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Lookup ==
    /// Reads a key, classifying it as fresh, stale or missing.
    ///
    /// Expired entries are removed and reported as a miss. Reads never touch
    /// timestamps; they only bump the entry's hit counter.
    pub fn lookup(&mut self, key: &str) -> Lookup<V> {
        let now = Instant::now();
        let stale_after = self.config.stale_after;

        let expired = match self.entries.get_mut(key) {
            None => {
                self.stats.record_miss();
                return Lookup::Miss;
            }
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => {
                entry.hits += 1;
                self.stats.record_hit();
                let value = entry.value.clone();
                return if entry.is_stale(now, stale_after) {
                    Lookup::Stale(value)
                } else {
                    Lookup::Fresh(value)
                };
            }
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            debug!(key = %key, "Expired entry removed on read");
        }
        Lookup::Miss
    }

    // == Get ==
    /// Returns the payload if present and not expired.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.lookup(key).into_value()
    }

    // == Is Stale ==
    /// True if the key has no live entry or its entry is older than
    /// `stale_after`. Never mutates the store.
    pub fn is_stale(&self, key: &str) -> bool {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.is_stale(now, self.config.stale_after)
            }
            _ => true,
        }
    }

    // == Set ==
    /// Stores a payload, replacing any previous entry for `key`.
    ///
    /// The replaced key becomes the newest entry. When a new key would exceed
    /// `max_entries`, expired entries are purged first and then the oldest
    /// live entry is evicted. With a byte budget, the oldest entries are
    /// evicted until the new payload fits or the store is empty.
    ///
    /// A zero TTL, or one too large to represent, is rejected before the
    /// store is touched.
    pub fn set(&mut self, key: String, value: V, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let expires_at = expiry(&key, now, ttl)?;

        let size = self.weigher.as_ref().map_or(0, |weigh| weigh(&value));

        // Overwrite: the old entry disappears as a whole
        self.remove_entry(&key);

        if self.entries.len() >= self.config.max_entries {
            self.purge_expired(now);
        }
        while self.entries.len() >= self.config.max_entries {
            if !self.evict_oldest() {
                break;
            }
        }

        if let Some(max_bytes) = self.config.max_bytes {
            while self.total_bytes + size > max_bytes && !self.entries.is_empty() {
                if !self.evict_oldest() {
                    break;
                }
            }
        }

        let seq = self.order.push(&key);
        self.total_bytes += size;
        self.entries.insert(key, CacheEntry::new(value, now, expires_at, size, seq));
        Ok(())
    }

    // == Invalidate ==
    /// Removes a key. Returns whether an entry was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let removed = self.remove_entry(key).is_some();
        if removed {
            self.stats.record_invalidations(1);
        }
        removed
    }

    // == Invalidate Matching ==
    /// Removes every live key matching `pattern`. Returns the number removed.
    ///
    /// Matching keys are collected first and removed afterwards, so the scan
    /// sees each key exactly once. Expired matches are dropped as well but
    /// counted as expirations, not invalidations.
    pub fn invalidate_matching(&mut self, pattern: &KeyPattern) -> usize {
        let now = Instant::now();
        let (expired, live): (Vec<(String, bool)>, Vec<(String, bool)>) = self
            .entries
            .iter()
            .filter(|(key, _)| pattern.is_match(key))
            .map(|(key, entry)| (key.clone(), entry.is_expired(now)))
            .partition(|(_, is_expired)| *is_expired);

        for (key, _) in expired.iter().chain(live.iter()) {
            self.remove_entry(key);
        }
        self.stats.record_expirations(expired.len());
        self.stats.record_invalidations(live.len());
        live.len()
    }

    // == Clear ==
    /// Removes every entry. Returns the number removed.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.order.clear();
        self.total_bytes = 0;
        self.stats.record_invalidations(count);
        count
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        self.purge_expired(Instant::now())
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.live_len();
        stats.total_bytes = self.total_bytes;
        stats
    }

    /// Metadata of every live entry, oldest first.
    pub fn entries(&self) -> Vec<EntryInfo> {
        let now = Instant::now();
        let mut live: Vec<(&String, &CacheEntry<V>)> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .collect();
        live.sort_by_key(|(_, entry)| entry.seq);
        live.into_iter()
            .map(|(key, entry)| entry.info(key, now, self.config.stale_after))
            .collect()
    }

    // == Length ==
    /// Number of live entries; expired entries awaiting removal are excluded.
    pub fn live_len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.order.remove(entry.seq);
        self.total_bytes -= entry.size;
        Some(entry)
    }

    fn evict_oldest(&mut self) -> bool {
        match self.order.pop_oldest() {
            Some(key) => {
                if let Some(entry) = self.entries.remove(&key) {
                    self.total_bytes -= entry.size;
                }
                self.stats.record_eviction();
                debug!(key = %key, "Evicted oldest entry");
                true
            }
            None => false,
        }
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
        }
        self.stats.record_expirations(expired.len());
        expired.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use tokio::time::advance;

    fn config(max_entries: usize) -> CacheConfig {
        CacheConfig::server()
            .with_default_ttl(Duration::from_secs(90))
            .with_stale_after(Duration::from_secs(30))
            .with_max_entries(max_entries)
    }

    fn store(max_entries: usize) -> CacheStore<String> {
        CacheStore::new(config(max_entries)).unwrap()
    }

    const TTL: Duration = Duration::from_secs(90);

    #[test]
    fn test_store_new() {
        let store = store(100);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_rejects_invalid_config() {
        let result = CacheStore::<String>::new(config(0));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), TTL).unwrap();

        assert_eq!(store.get("key1"), Some("value1".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = store(100);
        assert_eq!(store.get("nonexistent"), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_store_zero_ttl_fails_fast() {
        let mut store = store(100);

        let result = store.set("key1".to_string(), "value1".to_string(), Duration::ZERO);

        assert!(matches!(result, Err(CacheError::InvalidTtl(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_unrepresentable_ttl_leaves_store_intact() {
        let config = config(100).with_max_bytes(Some(100));
        let mut store = CacheStore::new(config)
            .unwrap()
            .with_weigher(Arc::new(|value: &String| value.len()));
        store.set("key1".to_string(), "value1".to_string(), TTL).unwrap();

        let result = store.set("key1".to_string(), "forever".to_string(), Duration::MAX);

        assert!(matches!(result, Err(CacheError::InvalidTtl(_))));
        assert_eq!(store.get("key1"), Some("value1".to_string()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.order.len(), 1);
        assert_eq!(store.total_bytes(), 6);

        store.set("key2".to_string(), "v".to_string(), TTL).unwrap();
        assert_eq!(store.order.len(), 2);
        assert_eq!(store.total_bytes(), 7);
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), TTL).unwrap();
        store.set("key1".to_string(), "value2".to_string(), TTL).unwrap();

        assert_eq!(store.get("key1"), Some("value2".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_invalidate() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), TTL).unwrap();

        assert!(store.invalidate("key1"));
        assert!(!store.invalidate("key1"));
        assert!(store.is_empty());
        assert_eq!(store.stats().invalidations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_ttl_boundary() {
        let mut store = store(100);
        store
            .set("key1".to_string(), "value1".to_string(), Duration::from_millis(500))
            .unwrap();

        advance(Duration::from_millis(499)).await;
        assert_eq!(store.get("key1"), Some("value1".to_string()));

        advance(Duration::from_millis(1)).await;
        assert_eq!(store.get("key1"), None);

        // Removed eagerly on read
        assert_eq!(store.len(), 0);
        assert_eq!(store.stats().expirations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_lookup_classifies_staleness() {
        let mut store = store(100);
        store.set("key1".to_string(), "value1".to_string(), TTL).unwrap();

        assert_eq!(store.lookup("key1"), Lookup::Fresh("value1".to_string()));
        assert!(!store.is_stale("key1"));

        advance(Duration::from_secs(31)).await;
        assert_eq!(store.lookup("key1"), Lookup::Stale("value1".to_string()));
        assert!(store.is_stale("key1"));

        advance(Duration::from_secs(60)).await;
        assert_eq!(store.lookup("key1"), Lookup::Miss);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_is_stale_does_not_mutate() {
        let mut store = store(100);
        store
            .set("key1".to_string(), "value1".to_string(), Duration::from_secs(1))
            .unwrap();

        advance(Duration::from_secs(2)).await;

        assert!(store.is_stale("key1"));
        assert!(store.is_stale("missing"));
        assert_eq!(store.len(), 1, "is_stale must not remove expired entries");
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_get_does_not_refresh_timestamps() {
        let mut store = store(100);
        store.set("key1".to_string(), "value1".to_string(), TTL).unwrap();

        advance(Duration::from_secs(60)).await;
        assert!(store.get("key1").is_some());

        advance(Duration::from_secs(30)).await;
        assert_eq!(store.get("key1"), None);
    }

    #[test]
    fn test_store_fifo_eviction() {
        let mut store = store(3);

        store.set("key1".to_string(), "value1".to_string(), TTL).unwrap();
        store.set("key2".to_string(), "value2".to_string(), TTL).unwrap();
        store.set("key3".to_string(), "value3".to_string(), TTL).unwrap();

        // Reading key1 does not protect it: eviction is by insertion
        store.get("key1").unwrap();
        store.set("key4".to_string(), "value4".to_string(), TTL).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("key1"), None);
        assert!(store.get("key2").is_some());
        assert!(store.get("key3").is_some());
        assert!(store.get("key4").is_some());
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_overwrite_moves_key_to_newest() {
        let mut store = store(2);

        store.set("a".to_string(), "1".to_string(), TTL).unwrap();
        store.set("b".to_string(), "1".to_string(), TTL).unwrap();
        store.set("a".to_string(), "2".to_string(), TTL).unwrap();
        store.set("c".to_string(), "1".to_string(), TTL).unwrap();

        assert_eq!(store.get("a"), Some("2".to_string()));
        assert_eq!(store.get("b"), None);
        assert!(store.get("c").is_some());
    }

    #[test]
    fn test_store_overwrite_at_capacity_does_not_evict() {
        let mut store = store(2);

        store.set("a".to_string(), "1".to_string(), TTL).unwrap();
        store.set("b".to_string(), "1".to_string(), TTL).unwrap();
        store.set("b".to_string(), "2".to_string(), TTL).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().evictions, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_purges_expired_before_evicting_live() {
        let mut store = store(2);

        store
            .set("short".to_string(), "1".to_string(), Duration::from_secs(1))
            .unwrap();
        store.set("long".to_string(), "1".to_string(), TTL).unwrap();

        advance(Duration::from_secs(2)).await;
        assert_eq!(store.live_len(), 1);

        store.set("new".to_string(), "1".to_string(), TTL).unwrap();

        assert!(store.get("long").is_some());
        assert!(store.get("new").is_some());
        assert_eq!(store.stats().evictions, 0);
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_store_invalidate_matching() {
        let mut store = store(100);
        for key in ["a:1", "a:2", "b:1"] {
            store.set(key.to_string(), key.to_string(), TTL).unwrap();
        }

        let removed = store.invalidate_matching(&KeyPattern::new("^a:").unwrap());

        assert_eq!(removed, 2);
        assert_eq!(store.get("a:1"), None);
        assert_eq!(store.get("a:2"), None);
        assert_eq!(store.get("b:1"), Some("b:1".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_invalidate_matching_ignores_expired() {
        let mut store = store(100);
        store
            .set("a:1".to_string(), "1".to_string(), Duration::from_secs(1))
            .unwrap();
        store.set("a:2".to_string(), "2".to_string(), TTL).unwrap();

        advance(Duration::from_secs(2)).await;
        assert_eq!(store.live_len(), 1);

        let removed = store.invalidate_matching(&KeyPattern::new("^a:").unwrap());

        assert_eq!(removed, 1);
        assert!(store.is_empty());
        assert_eq!(store.order.len(), 0);
        let stats = store.stats();
        assert_eq!(stats.invalidations, 1);
        assert_eq!(stats.expirations, 1);
    }

    #[test]
    fn test_store_clear() {
        let mut store = store(100);
        store.set("a".to_string(), "1".to_string(), TTL).unwrap();
        store.set("b".to_string(), "1".to_string(), TTL).unwrap();

        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
        assert_eq!(store.total_bytes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_cleanup_expired() {
        let mut store = store(100);

        store
            .set("key1".to_string(), "value1".to_string(), Duration::from_secs(1))
            .unwrap();
        store
            .set("key2".to_string(), "value2".to_string(), Duration::from_secs(10))
            .unwrap();

        advance(Duration::from_millis(1100)).await;

        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("key2").is_some());
    }

    #[test]
    fn test_store_byte_budget() {
        let config = config(100).with_max_bytes(Some(10));
        let mut store = CacheStore::new(config)
            .unwrap()
            .with_weigher(Arc::new(|value: &String| value.len()));

        store.set("a".to_string(), "aaaa".to_string(), TTL).unwrap();
        store.set("b".to_string(), "bbbb".to_string(), TTL).unwrap();
        assert_eq!(store.total_bytes(), 8);

        store.set("c".to_string(), "cccc".to_string(), TTL).unwrap();

        assert_eq!(store.get("a"), None);
        assert_eq!(store.total_bytes(), 8);

        // Overwrite releases the old payload's bytes
        store.set("c".to_string(), "cc".to_string(), TTL).unwrap();
        assert_eq!(store.total_bytes(), 6);
    }

    #[test]
    fn test_store_oversized_payload_is_sole_entry() {
        let config = config(100).with_max_bytes(Some(4));
        let mut store = CacheStore::new(config)
            .unwrap()
            .with_weigher(Arc::new(|value: &String| value.len()));

        store.set("a".to_string(), "aa".to_string(), TTL).unwrap();
        store.set("big".to_string(), "bbbbbbbb".to_string(), TTL).unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.get("big").is_some());
    }

    #[test]
    fn test_store_stats_and_entries() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), TTL).unwrap();
        store.set("key2".to_string(), "value2".to_string(), TTL).unwrap();
        store.get("key1").unwrap();
        let _ = store.get("nonexistent");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 2);

        let entries = store.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "key1");
        assert_eq!(entries[0].hits, 1);
        assert_eq!(entries[1].key, "key2");
    }
}
