//! Request DTOs for the cache admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

/// Request body for storing an entry (PUT /cache)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON document
/// - `ttl_ms`: Optional TTL in milliseconds (uses the default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.ttl_ms == Some(0) {
            return Some("ttl_ms must be greater than zero".to_string());
        }
        None
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_ms.map(Duration::from_millis)
    }
}

/// Request body for pattern invalidation (POST /invalidate)
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidatePatternRequest {
    /// Regular expression matched against every key
    pub pattern: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "students:p1", "value": [1, 2]}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "students:p1");
        assert_eq!(req.value, serde_json::json!([1, 2]));
        assert!(req.ttl().is_none());
    }

    #[test]
    fn test_set_request_with_ttl() {
        let json = r#"{"key": "test", "value": "hello", "ttl_ms": 90000}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_validate_rejects_empty_key_and_zero_ttl() {
        let empty_key = SetRequest {
            key: "".to_string(),
            value: Value::Null,
            ttl_ms: None,
        };
        assert!(empty_key.validate().is_some());

        let zero_ttl = SetRequest {
            key: "k".to_string(),
            value: Value::Null,
            ttl_ms: Some(0),
        };
        assert!(zero_ttl.validate().is_some());
    }

    #[test]
    fn test_validate_valid_request() {
        let req = SetRequest {
            key: "valid_key".to_string(),
            value: Value::from("test"),
            ttl_ms: Some(60_000),
        };
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_invalidate_pattern_request() {
        let req: InvalidatePatternRequest =
            serde_json::from_str(r#"{"pattern": "^students:"}"#).unwrap();
        assert_eq!(req.pattern, "^students:");
    }
}
