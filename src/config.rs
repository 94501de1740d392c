//! Configuration Module
//!
//! Cache tunables are compile-time constants grouped per tier. Only the admin
//! server port is read from the environment.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

// == Server Tier Constants ==
/// Default TTL for query results cached in the server process
pub const SERVER_DEFAULT_TTL: Duration = Duration::from_secs(90);
/// Age after which a server-tier entry is refreshed in the background
pub const SERVER_STALE_AFTER: Duration = Duration::from_secs(30);
/// Maximum number of server-tier entries
pub const SERVER_MAX_ENTRIES: usize = 1000;
/// Interval of the server-tier expiry sweep
pub const SERVER_SWEEP_INTERVAL: Duration = Duration::from_secs(3 * 60);

// == Client Tier Constants ==
/// Default TTL for cached API responses
pub const CLIENT_DEFAULT_TTL: Duration = Duration::from_secs(3 * 60);
/// Age after which a cached response is revalidated in the background
pub const CLIENT_STALE_AFTER: Duration = Duration::from_secs(15);
/// Maximum number of cached responses
pub const CLIENT_MAX_ENTRIES: usize = 100;
/// Byte budget for cached responses (10 MB)
pub const CLIENT_MAX_BYTES: usize = 10 * 1024 * 1024;
/// Interval of the client-tier expiry sweep
pub const CLIENT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Default port of the admin HTTP server
pub const DEFAULT_SERVER_PORT: u16 = 3000;

// == Cache Tier ==
/// Where a cache instance runs. Both tiers share one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    /// In-process query cache of the server
    Server,
    /// Response cache held by an API client
    Client,
}

// == Cache Config ==
/// Tunables of one cache instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub tier: CacheTier,
    /// TTL used by `set_default`
    pub default_ttl: Duration,
    /// Entries older than this are stale but still served
    pub stale_after: Duration,
    /// Upper bound on live entries
    pub max_entries: usize,
    /// Optional upper bound on the summed payload weight
    pub max_bytes: Option<usize>,
    /// Optional period of the background expiry sweep
    pub sweep_interval: Option<Duration>,
}

impl CacheConfig {
    /// Server query tier defaults.
    pub fn server() -> Self {
        Self {
            tier: CacheTier::Server,
            default_ttl: SERVER_DEFAULT_TTL,
            stale_after: SERVER_STALE_AFTER,
            max_entries: SERVER_MAX_ENTRIES,
            max_bytes: None,
            sweep_interval: Some(SERVER_SWEEP_INTERVAL),
        }
    }

    /// Client response tier defaults.
    pub fn client() -> Self {
        Self {
            tier: CacheTier::Client,
            default_ttl: CLIENT_DEFAULT_TTL,
            stale_after: CLIENT_STALE_AFTER,
            max_entries: CLIENT_MAX_ENTRIES,
            max_bytes: Some(CLIENT_MAX_BYTES),
            sweep_interval: Some(CLIENT_SWEEP_INTERVAL),
        }
    }

    pub fn for_tier(tier: CacheTier) -> Self {
        match tier {
            CacheTier::Server => Self::server(),
            CacheTier::Client => Self::client(),
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: Option<usize>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Option<Duration>) -> Self {
        self.sweep_interval = interval;
        self
    }

    // == Validate ==
    /// Checks the invariants every cache instance relies on.
    ///
    /// An entry must turn stale strictly before it expires, so
    /// `stale_after < default_ttl` is required.
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl.is_zero() {
            return Err(CacheError::InvalidConfig(
                "default_ttl must be greater than zero".to_string(),
            ));
        }
        if self.stale_after >= self.default_ttl {
            return Err(CacheError::InvalidConfig(format!(
                "stale_after ({:?}) must be shorter than default_ttl ({:?})",
                self.stale_after, self.default_ttl
            )));
        }
        if self.max_entries == 0 {
            return Err(CacheError::InvalidConfig(
                "max_entries must be at least 1".to_string(),
            ));
        }
        if self.max_bytes == Some(0) {
            return Err(CacheError::InvalidConfig(
                "max_bytes must be greater than zero when set".to_string(),
            ));
        }
        if self.sweep_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(CacheError::InvalidConfig(
                "sweep_interval must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::server()
    }
}

// == Server Config ==
/// Configuration of the admin server binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Server-tier cache tunables
    pub cache: CacheConfig,
}

impl Config {
    /// Loads the configuration.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            cache: CacheConfig::server(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_SERVER_PORT,
            cache: CacheConfig::server(),
        }
    }
}
