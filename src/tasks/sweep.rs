//! Expiry Sweep Task
//!
//! Background task that periodically removes expired entries nobody reads
//! again. Reads already drop expired entries lazily, so the sweep only
//! bounds memory.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::TimedCache;

/// Spawns a background task that purges expired entries every `interval`.
///
/// Each pass holds the write lock only for one purge, so concurrent `get`
/// and `set` calls are delayed at most by that pass.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = TimedCache::new(CacheConfig::server())?;
/// let sweep_handle = spawn_sweep_task(cache.clone(), Duration::from_secs(180));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<V>(cache: TimedCache<V>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting expiry sweep task with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup_expired().await;

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}

/// Starts the sweep configured for `cache`, if any.
pub fn spawn_configured_sweep<V>(cache: &TimedCache<V>) -> Option<JoinHandle<()>>
where
    V: Clone + Send + Sync + 'static,
{
    cache
        .config()
        .sweep_interval
        .map(|interval| spawn_sweep_task(cache.clone(), interval))
}
