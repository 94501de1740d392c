//! Cache Module
//!
//! One engine for both cache tiers: TTL expiration, stale detection,
//! FIFO eviction, pattern invalidation and stale-while-revalidate fetching.

mod entry;
mod fetch;
mod keys;
mod order;
mod pattern;
mod stats;
mod store;
mod timed;


// Re-export public types
pub use entry::{CacheEntry, EntryInfo};
pub(crate) use entry::expiry;
pub use fetch::{FetchStatus, Fetched};
pub use keys::{generate_key, key_for, KeyParam};
pub use order::InsertionOrder;
pub use pattern::KeyPattern;
pub use stats::{CacheStats, RefreshCounters};
pub use store::{CacheStore, Lookup, Weigher};
pub use timed::TimedCache;
