//! Stale-while-revalidate fetching on top of `TimedCache`.
//!
//! Concurrent stale hits on one key may each start a refresh. Refreshes are
//! at-least-once; no in-flight marker deduplicates them.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::store::Lookup;
use crate::cache::{expiry, TimedCache};
use crate::error::CacheError;

// == Fetch Status ==
/// Where a fetched value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Served from a fresh entry
    Fresh,
    /// Served from a stale entry; a background refresh was started
    Stale,
    /// Produced synchronously and stored
    Miss,
}

/// Result of [`TimedCache::fetch`].
#[derive(Debug)]
pub struct Fetched<V> {
    pub value: V,
    pub status: FetchStatus,
    /// Handle of the background refresh started by a stale hit. Dropping it
    /// does not cancel the refresh.
    pub refresh: Option<JoinHandle<()>>,
}

impl<V> TimedCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Cached Fetch ==
    /// Returns the cached value for `key`, calling `producer` when needed.
    ///
    /// - fresh hit: returned as is, `producer` is not called
    /// - stale hit: returned as is, `producer` runs in a detached task and
    ///   its value replaces the entry; its failure is only logged
    /// - miss: `producer` is awaited, its value stored and returned; its
    ///   error is returned unchanged and nothing is stored
    ///
    /// A zero `ttl`, or one too large to represent, fails with
    /// [`CacheError::InvalidTtl`] before anything else happens. Must be
    /// called from within a tokio runtime.
    pub async fn cached_fetch<F, Fut, E>(&self, key: &str, producer: F, ttl: Duration) -> Result<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: From<CacheError> + Display + Send + 'static,
    {
        self.fetch(key, producer, ttl).await.map(|fetched| fetched.value)
    }

    /// Same as [`cached_fetch`](Self::cached_fetch), also reporting the
    /// cache status and the background refresh handle.
    pub async fn fetch<F, Fut, E>(&self, key: &str, producer: F, ttl: Duration) -> Result<Fetched<V>, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: From<CacheError> + Display + Send + 'static,
    {
        expiry(key, Instant::now(), ttl)?;

        match self.lookup(key).await {
            Lookup::Fresh(value) => {
                debug!(key = %key, "Cache hit");
                Ok(Fetched {
                    value,
                    status: FetchStatus::Fresh,
                    refresh: None,
                })
            }
            Lookup::Stale(value) => {
                debug!(key = %key, "Stale cache hit, refreshing in background");
                self.counters.record_stale_hit();
                let refresh = self.spawn_refresh(key.to_string(), producer, ttl);
                Ok(Fetched {
                    value,
                    status: FetchStatus::Stale,
                    refresh: Some(refresh),
                })
            }
            Lookup::Miss => {
                debug!(key = %key, "Cache miss, fetching");
                let value = producer().await?;
                self.set(key, value.clone(), ttl).await?;
                Ok(Fetched {
                    value,
                    status: FetchStatus::Miss,
                    refresh: None,
                })
            }
        }
    }

    // == Spawn Refresh ==
    /// Runs `producer` in a detached task that owns its own cache handle.
    ///
    /// The task outlives the caller; failures leave the stale entry in place.
    fn spawn_refresh<F, Fut, E>(&self, key: String, producer: F, ttl: Duration) -> JoinHandle<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let cache = self.clone();
        tokio::spawn(async move {
            match producer().await {
                Ok(value) => match cache.set(key.as_str(), value, ttl).await {
                    Ok(()) => {
                        cache.counters.record_refresh();
                        debug!(key = %key, "Background refresh stored new value");
                    }
                    Err(e) => {
                        cache.counters.record_refresh_failure();
                        warn!(key = %key, error = %e, "Background refresh could not store value");
                    }
                },
                Err(e) => {
                    cache.counters.record_refresh_failure();
                    warn!(key = %key, error = %e, "Background refresh failed, keeping stale entry");
                }
            }
        })
    }
}
