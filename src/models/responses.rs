//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: Value,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// Whether the key already existed
    pub updated: bool,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>, updated: bool) -> Self {
        let key = key.into();
        let verb = if updated { "updated" } else { "set" };
        Self {
            message: format!("Key '{}' {} successfully", key, verb),
            key,
            updated,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for the membership check (GET /has/:key)
#[derive(Debug, Clone, Serialize)]
pub struct HasResponse {
    pub key: String,
    pub exists: bool,
}

impl HasResponse {
    pub fn new(key: impl Into<String>, exists: bool) -> Self {
        Self {
            key: key.into(),
            exists,
        }
    }
}

/// Response body for the CLEAR operation (DELETE /clear)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
    /// Number of entries discarded
    pub removed: usize,
}

impl ClearResponse {
    pub fn new(removed: usize) -> Self {
        Self {
            message: format!("Cleared {} entries", removed),
            removed,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Number of oversized values that were dropped
    pub rejections: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Current estimated memory usage in bytes
    pub memory_usage: usize,
    /// Configured item limit, if any
    pub max_items: Option<usize>,
    /// Configured memory limit in bytes
    pub max_memory_bytes: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics and limits
    pub fn new(stats: &CacheStats, max_items: Option<usize>, max_memory_bytes: usize) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            rejections: stats.rejections,
            total_entries: stats.total_entries,
            memory_usage: stats.memory_usage,
            max_items,
            max_memory_bytes,
            hit_rate: stats.hit_rate(),
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

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("test_key", json!({"nested": [1, 2]}));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["key"], "test_key");
        assert_eq!(json["value"]["nested"][1], 2);
    }

    #[test]
    fn test_set_response_messages() {
        let resp = SetResponse::new("my_key", false);
        assert!(resp.message.contains("my_key"));
        assert!(resp.message.contains("set successfully"));

        let resp = SetResponse::new("my_key", true);
        assert!(resp.message.contains("updated"));
        assert!(resp.updated);
    }

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse::new("deleted_key");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("deleted_key"));
        assert!(json.contains("deleted"));
    }

    #[test]
    fn test_has_and_clear_responses() {
        let json = serde_json::to_value(HasResponse::new("k", true)).unwrap();
        assert_eq!(json, json!({"key": "k", "exists": true}));

        let resp = ClearResponse::new(3);
        assert_eq!(resp.removed, 3);
        assert!(resp.message.contains('3'));
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let mut stats = CacheStats::new();
        for _ in 0..4 {
            stats.record_hit();
        }
        stats.record_miss();
        stats.set_occupancy(2, 40);

        let resp = StatsResponse::new(&stats, Some(10), 1024);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.total_entries, 2);
        assert_eq!(resp.memory_usage, 40);
        assert_eq!(resp.max_items, Some(10));
        assert_eq!(resp.max_memory_bytes, 1024);
    }

    #[test]
    fn test_stats_response_zero_requests() {
        let resp = StatsResponse::new(&CacheStats::new(), None, 20);
        assert_eq!(resp.hit_rate, 0.0);
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json["max_items"].is_null());
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
