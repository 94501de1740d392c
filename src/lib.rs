//! Query Cache - request-result caching for a CRUD web application
//!
//! One TTL cache engine with stale-while-revalidate fetching, pattern
//! invalidation and FIFO eviction, used by two tiers: the server's
//! in-process query cache and an API client's response cache.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{generate_key, key_for, FetchStatus, Fetched, KeyParam, KeyPattern, TimedCache};
pub use client::{RequestOptions, ResponseCache};
pub use config::{CacheConfig, CacheTier, Config};
pub use error::{CacheError, ClientError};
pub use tasks::{spawn_configured_sweep, spawn_sweep_task};
