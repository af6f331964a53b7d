//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror. Backend internals propagate
//! these with `?`; the cache facade turns I/O-flavoured variants into misses and
//! no-ops, so only caller mistakes ever reach a collaborator.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Malformed invalidation pattern
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Key cannot be stored by the selected backend
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Backend has no notion of unbounded entries and no TTL was given
    #[error("TTL required for key: {0}")]
    MissingTtl(String),

    /// Filesystem failure in the durable local store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored payload or envelope could not be (de)serialized
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Remote store failure
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Remote operation exceeded its time bound
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Backend could not be constructed from configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// True for errors caused by the caller rather than by the backend.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            CacheError::InvalidPattern(_) | CacheError::InvalidKey(_) | CacheError::MissingTtl(_)
        )
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = if self.is_caller_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
