//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use crate::error::{CacheError, Result};

// == Cache Entry ==
/// Represents a single cache entry with its payload and timing metadata.
///
/// `created_at` and `expires_at` use the tokio clock so that tests can pause
/// and advance time.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored payload, returned unmodified
    pub value: V,
    /// Monotonic insertion time
    pub created_at: Instant,
    /// Monotonic expiry time, always after `created_at`
    pub expires_at: Instant,
    /// Wall-clock insertion time, for reporting only
    pub stored_at: DateTime<Utc>,
    /// Estimated payload size in bytes
    pub size: usize,
    /// Number of reads served by this entry
    pub hits: u64,
    /// Insertion sequence number used for FIFO eviction
    pub(crate) seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry stored at `created_at`.
    ///
    /// `expires_at` comes from [`expiry`] and is always after `created_at`.
    pub fn new(value: V, created_at: Instant, expires_at: Instant, size: usize, seq: u64) -> Self {
        Self {
            value,
            created_at,
            expires_at,
            stored_at: Utc::now(),
            size,
            hits: 0,
            seq,
        }
    }

    // == Is Expired ==
    /// An entry is expired once `now >= expires_at`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Is Stale ==
    /// True once the entry is strictly older than `stale_after`.
    pub fn is_stale(&self, now: Instant, stale_after: Duration) -> bool {
        self.age(now) > stale_after
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    /// Remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }

    // == Info ==
    /// Metadata snapshot without the payload.
    pub fn info(&self, key: &str, now: Instant, stale_after: Duration) -> EntryInfo {
        EntryInfo {
            key: key.to_string(),
            stored_at: self.stored_at,
            age_ms: self.age(now).as_millis() as u64,
            ttl_remaining_ms: self.ttl_remaining(now).as_millis() as u64,
            stale: self.is_stale(now, stale_after),
            hits: self.hits,
            size_bytes: self.size,
        }
    }
}

// == Expiry ==
/// Instant at which an entry stored at `now` for `ttl` expires.
///
/// Fails with [`CacheError::InvalidTtl`] for a zero TTL and for one that
/// cannot be represented as an instant.
pub(crate) fn expiry(key: &str, now: Instant, ttl: Duration) -> Result<Instant> {
    if ttl.is_zero() {
        return Err(CacheError::InvalidTtl(format!(
            "TTL for key '{}' must be greater than zero",
            key
        )));
    }
    now.checked_add(ttl).ok_or_else(|| {
        CacheError::InvalidTtl(format!("TTL for key '{}' is too large: {:?}", key, ttl))
    })
}

// == Entry Info ==
/// Serializable description of a live entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub key: String,
    pub stored_at: DateTime<Utc>,
    pub age_ms: u64,
    pub ttl_remaining_ms: u64,
    pub stale: bool,
    pub hits: u64,
    pub size_bytes: usize,
}
