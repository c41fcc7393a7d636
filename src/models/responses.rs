//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStats, Lookup};

/// Response body for the GET operation (GET /get/:key)
///
/// Single-value caches fill `value`, multi-value caches fill `values`.
/// A cached `null` serializes as `"value": null`.
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// The stored values, oldest first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
}

impl GetResponse {
    /// Creates a new GetResponse from a lookup result
    pub fn new(key: impl Into<String>, found: Lookup<Value>) -> Self {
        let (value, values) = match found {
            Lookup::One(value) => (Some(value), None),
            Lookup::Many(values) => (None, Some(values)),
        };
        Self {
            key: key.into(),
            value,
            values,
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
    /// The value as stored
    pub value: Value,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            value,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// The key that was deleted
    pub key: String,
    /// Whether anything was removed
    pub deleted: bool,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>, deleted: bool) -> Self {
        Self {
            key: key.into(),
            deleted,
        }
    }
}

/// Response body for POST /touch/:key
#[derive(Debug, Clone, Serialize)]
pub struct TouchResponse {
    /// The touched key
    pub key: String,
    /// Whether a live entry was refreshed
    pub touched: bool,
}

impl TouchResponse {
    pub fn new(key: impl Into<String>, touched: bool) -> Self {
        Self {
            key: key.into(),
            touched,
        }
    }
}

/// Response body for GET /keys
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    /// One key per physical entry
    pub keys: Vec<String>,
    /// Number of keys listed
    pub count: usize,
}

impl KeysResponse {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            count: keys.len(),
            keys,
        }
    }
}

/// Response body for bulk removals (purge, expire, evict)
#[derive(Debug, Clone, Serialize)]
pub struct RemovedResponse {
    /// Number of entries removed
    pub removed: usize,
}

impl RemovedResponse {
    pub fn new(removed: usize) -> Self {
        Self { removed }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Counter snapshot
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Name of the served cache
    pub cache: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(cache: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            cache: cache.into(),
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
