//! Shared cache handle.
//!
//! `TimedCache` is the unit other components hold on to: cheap to clone,
//! safe to use from many tasks at once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::store::{CacheStore, Lookup, Weigher};
use crate::cache::{CacheStats, EntryInfo, KeyPattern, RefreshCounters};
use crate::config::CacheConfig;
use crate::error::Result;

// == Timed Cache ==
/// Thread-safe TTL cache with stale detection and FIFO eviction.
///
/// Operations that may remove entries or bump counters (`get`, `set`,
/// invalidation, `clear`) take the write lock; pure queries take the read
/// lock. An entry is always replaced as a whole, so readers never observe a
/// half-written one.
pub struct TimedCache<V> {
    store: Arc<RwLock<CacheStore<V>>>,
    pub(crate) counters: Arc<RefreshCounters>,
    config: Arc<CacheConfig>,
}

impl<V> Clone for TimedCache<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            counters: Arc::clone(&self.counters),
            config: Arc::clone(&self.config),
        }
    }
}

impl<V> std::fmt::Debug for TimedCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedCache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<V> TimedCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache from a validated configuration.
    pub fn new(config: CacheConfig) -> Result<Self> {
        let store = CacheStore::new(config.clone())?;
        Ok(Self::from_store(store, config))
    }

    /// Creates a cache whose payloads are weighed against `max_bytes`.
    pub fn with_weigher<F>(config: CacheConfig, weigher: F) -> Result<Self>
    where
        F: Fn(&V) -> usize + Send + Sync + 'static,
    {
        let weigher: Weigher<V> = Arc::new(weigher);
        let store = CacheStore::new(config.clone())?.with_weigher(weigher);
        Ok(Self::from_store(store, config))
    }

    fn from_store(store: CacheStore<V>, config: CacheConfig) -> Self {
        info!(
            tier = ?config.tier,
            max_entries = config.max_entries,
            default_ttl_ms = config.default_ttl.as_millis() as u64,
            stale_after_ms = config.stale_after.as_millis() as u64,
            "Cache initialized"
        );
        Self {
            store: Arc::new(RwLock::new(store)),
            counters: Arc::new(RefreshCounters::default()),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Get ==
    /// Returns the payload of a live entry.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.store.write().await.get(key)
    }

    // == Lookup ==
    /// Reads a key and reports whether the entry is fresh or stale.
    pub async fn lookup(&self, key: &str) -> Lookup<V> {
        self.store.write().await.lookup(key)
    }

    // == Is Stale ==
    /// True if the key is absent or older than `stale_after`.
    pub async fn is_stale(&self, key: &str) -> bool {
        self.store.read().await.is_stale(key)
    }

    // == Set ==
    /// Stores a payload for `ttl`. A zero TTL is rejected.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) -> Result<()> {
        self.store.write().await.set(key.into(), value, ttl)
    }

    /// Stores a payload for the configured default TTL.
    pub async fn set_default(&self, key: impl Into<String>, value: V) -> Result<()> {
        self.set(key, value, self.config.default_ttl).await
    }

    // == Invalidate ==
    /// Removes a key; missing keys are not an error.
    pub async fn invalidate(&self, key: &str) -> bool {
        let removed = self.store.write().await.invalidate(key);
        if removed {
            debug!(key = %key, "Cache entry invalidated");
        }
        removed
    }

    // == Invalidate Pattern ==
    /// Removes every key matching the regular expression `pattern`.
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<usize> {
        let pattern = KeyPattern::new(pattern)?;
        Ok(self.invalidate_matching(&pattern).await)
    }

    /// Removes every key matching a precompiled pattern.
    pub async fn invalidate_matching(&self, pattern: &KeyPattern) -> usize {
        let count = self.store.write().await.invalidate_matching(pattern);
        info!(pattern = %pattern, count = count, "Cache entries invalidated by pattern");
        count
    }

    // == Clear ==
    pub async fn clear(&self) -> usize {
        let count = self.store.write().await.clear();
        info!(count = count, "Cache cleared");
        count
    }

    // == Size ==
    /// Number of live entries.
    pub async fn size(&self) -> usize {
        self.store.read().await.live_len()
    }

    // == Stats ==
    pub async fn stats(&self) -> CacheStats {
        let mut stats = self.store.read().await.stats();
        self.counters.merge_into(&mut stats);
        stats
    }

    /// Metadata of every live entry, oldest first.
    pub async fn entries(&self) -> Vec<EntryInfo> {
        self.store.read().await.entries()
    }

    // == Cleanup Expired ==
    /// Removes every expired entry and returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }
}
