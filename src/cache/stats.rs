//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and
//! background refresh outcomes.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key absent or expired)
    pub misses: u64,
    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
    /// Number of entries evicted to honour a capacity bound
    pub evictions: u64,
    /// Number of entries removed by invalidate, pattern invalidation or clear
    pub invalidations: u64,
    /// Number of hits served from a stale entry
    pub stale_hits: u64,
    /// Number of background refreshes that stored a new value
    pub refreshes: u64,
    /// Number of background refreshes whose producer failed
    pub refresh_failures: u64,
    /// Current number of live entries
    pub total_entries: usize,
    /// Summed estimated size of live entries
    pub total_bytes: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_invalidations(&mut self, count: usize) {
        self.invalidations += count as u64;
    }
}

// == Refresh Counters ==
/// Lock-free counters for events that happen outside the store lock.
#[derive(Debug, Default)]
pub struct RefreshCounters {
    stale_hits: AtomicU64,
    refreshes: AtomicU64,
    refresh_failures: AtomicU64,
}

impl RefreshCounters {
    pub fn record_stale_hit(&self) {
        self.stale_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_failure(&self) {
        self.refresh_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the counters into a stats snapshot.
    pub fn merge_into(&self, stats: &mut CacheStats) {
        stats.stale_hits = self.stale_hits.load(Ordering::Relaxed);
        stats.refreshes = self.refreshes.load(Ordering::Relaxed);
        stats.refresh_failures = self.refresh_failures.load(Ordering::Relaxed);
    }
}
