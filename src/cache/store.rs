//! Cache Store Module
//!
//! The capability contract every backend implements, and the closed set of
//! backends the selector can hand out.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::cache::{FileCache, KeyPattern, RedisCache};
use crate::error::Result;

/// Size of what a backend currently holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreUsage {
    /// Number of stored entries
    pub entries: u64,
    /// Bytes on disk, when the backend can tell
    pub bytes: Option<u64>,
}

// == Cache Store ==
/// Raw key-value contract over opaque string payloads.
///
/// Reads never fail: a missing, expired or unreadable entry is a miss. Writes
/// and deletes swallow backend failures after logging them. Only caller
/// mistakes (see [`crate::error::CacheError::is_caller_error`]) surface as `Err`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short backend identifier for logs and health output.
    fn name(&self) -> &'static str;

    /// Returns the payload of a live entry.
    async fn get(&self, key: &str) -> Option<String>;

    /// Stores a payload. `None` means no expiry, if the backend supports it.
    ///
    /// `Ok(false)` means the backend failed and logged it; nothing was stored.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<bool>;

    /// Removes a key; absent keys are a no-op.
    async fn del(&self, key: &str);

    /// Removes every key matching the pattern and returns how many went.
    async fn del_pattern(&self, pattern: &KeyPattern) -> usize;

    /// True iff a live entry exists.
    async fn exists(&self, key: &str) -> bool;

    /// Remaining seconds, or [`TTL_NO_EXPIRY`](crate::cache::TTL_NO_EXPIRY) /
    /// [`TTL_MISSING`](crate::cache::TTL_MISSING).
    async fn ttl(&self, key: &str) -> i64;

    /// Removes everything this backend holds.
    async fn flush(&self);

    /// Readiness check for health reporting.
    async fn is_ready(&self) -> bool;

    async fn usage(&self) -> StoreUsage;

    /// Releases background tasks and connections.
    async fn shutdown(&self);
}

// == Backend ==
/// The backends the selector can choose from.
pub enum Backend {
    File(FileCache),
    Redis(RedisCache),
}

#[async_trait]
impl CacheStore for Backend {
    fn name(&self) -> &'static str {
        match self {
            Backend::File(store) => store.name(),
            Backend::Redis(store) => store.name(),
        }
    }

    async fn get(&self, key: &str) -> Option<String> {
        match self {
            Backend::File(store) => store.get(key).await,
            Backend::Redis(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<bool> {
        match self {
            Backend::File(store) => store.set(key, value, ttl).await,
            Backend::Redis(store) => store.set(key, value, ttl).await,
        }
    }

    async fn del(&self, key: &str) {
        match self {
            Backend::File(store) => store.del(key).await,
            Backend::Redis(store) => store.del(key).await,
        }
    }

    async fn del_pattern(&self, pattern: &KeyPattern) -> usize {
        match self {
            Backend::File(store) => store.del_pattern(pattern).await,
            Backend::Redis(store) => store.del_pattern(pattern).await,
        }
    }

    async fn exists(&self, key: &str) -> bool {
        match self {
            Backend::File(store) => store.exists(key).await,
            Backend::Redis(store) => store.exists(key).await,
        }
    }

    async fn ttl(&self, key: &str) -> i64 {
        match self {
            Backend::File(store) => store.ttl(key).await,
            Backend::Redis(store) => store.ttl(key).await,
        }
    }

    async fn flush(&self) {
        match self {
            Backend::File(store) => store.flush().await,
            Backend::Redis(store) => store.flush().await,
        }
    }

    async fn is_ready(&self) -> bool {
        match self {
            Backend::File(store) => store.is_ready().await,
            Backend::Redis(store) => store.is_ready().await,
        }
    }

    async fn usage(&self) -> StoreUsage {
        match self {
            Backend::File(store) => store.usage().await,
            Backend::Redis(store) => store.usage().await,
        }
    }

    async fn shutdown(&self) {
        match self {
            Backend::File(store) => store.shutdown().await,
            Backend::Redis(store) => store.shutdown().await,
        }
    }
}
