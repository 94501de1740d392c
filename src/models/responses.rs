//! Response DTOs for the cache admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStats, EntryInfo};

/// Response body for reading an entry (GET /cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Value,
    /// Whether the entry is past its stale boundary
    pub stale: bool,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value, stale: bool) -> Self {
        Self {
            key: key.into(),
            value,
            stale,
        }
    }
}

/// Response body for storing an entry (PUT /cache)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    pub key: String,
    pub ttl_ms: u64,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, ttl_ms: u64) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' cached", key),
            key,
            ttl_ms,
        }
    }
}

/// Response body for invalidating one key (DELETE /cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub key: String,
    /// False when the key was not cached
    pub removed: bool,
}

/// Response body for bulk removals (POST /invalidate, DELETE /cache)
#[derive(Debug, Clone, Serialize)]
pub struct RemovedResponse {
    /// Pattern applied, absent for a full clear
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub removed: usize,
}

/// Response body for listing entries (GET /cache)
#[derive(Debug, Clone, Serialize)]
pub struct EntriesResponse {
    pub count: usize,
    pub entries: Vec<EntryInfo>,
}

impl EntriesResponse {
    pub fn new(entries: Vec<EntryInfo>) -> Self {
        Self {
            count: entries.len(),
            entries,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Total size in megabytes, two decimals
    pub size_mb: String,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        let hit_rate = stats.hit_rate();
        let size_mb = format!("{:.2}", stats.total_bytes as f64 / (1024.0 * 1024.0));
        Self {
            stats,
            hit_rate,
            size_mb,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("students:p1", serde_json::json!([1]), true);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["key"], "students:p1");
        assert_eq!(json["stale"], true);
    }

    #[test]
    fn test_set_response_serialize() {
        let resp = SetResponse::new("my_key", 90_000);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("my_key"));
        assert!(json.contains("90000"));
    }

    #[test]
    fn test_removed_response_omits_missing_pattern() {
        let clear = RemovedResponse { pattern: None, removed: 3 };
        let json = serde_json::to_value(&clear).unwrap();
        assert!(json.get("pattern").is_none());
        assert_eq!(json["removed"], 3);
    }

    #[test]
    fn test_stats_response_flattens_counters() {
        let mut stats = CacheStats::new();
        stats.hits = 80;
        stats.misses = 20;
        stats.total_bytes = 2 * 1024 * 1024;

        let json = serde_json::to_value(StatsResponse::from(stats)).unwrap();

        assert_eq!(json["hits"], 80);
        assert!((json["hit_rate"].as_f64().unwrap() - 0.8).abs() < 0.001);
        assert_eq!(json["size_mb"], "2.00");
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
