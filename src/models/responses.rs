//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheStats, TTL_MISSING};

/// Response body for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" when the backend answers, "degraded" otherwise
    pub status: String,
    /// Backend identifier ("file" or "redis")
    pub backend: String,
    pub ready: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(backend: impl Into<String>, ready: bool) -> Self {
        let status = if ready { "healthy" } else { "degraded" };
        Self {
            status: status.to_string(),
            backend: backend.into(),
            ready,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub backend: String,
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    pub entries: u64,
    /// Bytes on disk, or null when the backend cannot tell
    pub bytes: Option<u64>,
}

impl StatsResponse {
    pub fn new(backend: impl Into<String>, stats: &CacheStats) -> Self {
        Self {
            backend: backend.into(),
            hits: stats.hits,
            misses: stats.misses,
            writes: stats.writes,
            hit_rate: stats.hit_rate(),
            entries: stats.entries,
            bytes: stats.bytes,
        }
    }
}

/// Response body for GET /ttl/:key
#[derive(Debug, Clone, Serialize)]
pub struct TtlResponse {
    pub key: String,
    /// Remaining seconds, -1 without expiry, -2 when absent
    pub ttl: i64,
    pub exists: bool,
}

impl TtlResponse {
    pub fn new(key: impl Into<String>, ttl: i64) -> Self {
        Self {
            key: key.into(),
            ttl,
            exists: ttl != TTL_MISSING,
        }
    }
}

/// Response body for DELETE /del/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted", key),
            key,
        }
    }
}

/// Response body for DELETE /keys?pattern=...
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub pattern: String,
    /// Number of keys removed
    pub deleted: usize,
}

/// Response body for POST /flush
#[derive(Debug, Clone, Serialize)]
pub struct FlushResponse {
    pub message: String,
}

impl FlushResponse {
    pub fn flushed(backend: &str) -> Self {
        Self {
            message: format!("Cache flushed ({backend})"),
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
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
