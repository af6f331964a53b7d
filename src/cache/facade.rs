//! Cache Facade
//!
//! `Cache` is the handle collaborators receive at construction time. It puts
//! a serde layer over the selected backend, so callers store and load their
//! own types while backends only ever see opaque payload strings.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::cache::{
    select_backend, Backend, CacheStats, CacheStore, KeyPattern, StatsRecorder, TtlClass,
};
use crate::config::Config;
use crate::error::Result;

// == Cache ==
/// Shared, cheaply cloneable cache handle.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<Backend>,
    stats: Arc<StatsRecorder>,
}

impl Cache {
    // == Constructor ==
    pub fn new(backend: Backend) -> Self {
        Self {
            backend: Arc::new(backend),
            stats: Arc::new(StatsRecorder::new()),
        }
    }

    /// Selects and opens the configured backend.
    ///
    /// Fails only if the durable local store cannot be opened.
    pub async fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(select_backend(config).await?))
    }

    /// Identifier of the backend in use.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    // == Get ==
    /// Returns the cached value, or `None` on a miss.
    ///
    /// A payload that no longer deserializes into `T` counts as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let Some(payload) = self.backend.get(key).await else {
            self.stats.record_miss();
            debug!(key, "Cache miss");
            return None;
        };

        match serde_json::from_str(&payload) {
            Ok(value) => {
                self.stats.record_hit();
                Some(value)
            }
            Err(e) => {
                self.stats.record_miss();
                warn!(key, error = %e, "Cached payload did not decode, treating as miss");
                None
            }
        }
    }

    // == Set ==
    /// Stores a value. Backend failures are logged, not returned.
    ///
    /// Returns `Err` only when the request itself is invalid for the backend,
    /// e.g. `ttl: None` on the file store.
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                error!(key, error = %e, "Failed to serialize value for cache");
                return Ok(());
            }
        };

        if self.backend.set(key, payload, ttl).await? {
            self.stats.record_write();
        }
        Ok(())
    }

    // == Delete ==
    pub async fn del(&self, key: &str) {
        self.backend.del(key).await;
    }

    /// Deletes every key matching a `*` wildcard pattern.
    ///
    /// A malformed pattern is a caller bug and is returned as
    /// `CacheError::InvalidPattern`.
    pub async fn del_pattern(&self, pattern: &str) -> Result<usize> {
        let pattern = KeyPattern::parse(pattern)?;
        Ok(self.backend.del_pattern(&pattern).await)
    }

    /// Deletes every key matching an already compiled pattern.
    pub async fn del_matching(&self, pattern: &KeyPattern) -> usize {
        self.backend.del_pattern(pattern).await
    }

    // == Lookups ==
    pub async fn exists(&self, key: &str) -> bool {
        self.backend.exists(key).await
    }

    /// Remaining seconds, or `TTL_NO_EXPIRY` / `TTL_MISSING`.
    pub async fn ttl(&self, key: &str) -> i64 {
        self.backend.ttl(key).await
    }

    pub async fn flush(&self) {
        self.backend.flush().await;
    }

    pub async fn is_ready(&self) -> bool {
        self.backend.is_ready().await
    }

    pub async fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.backend.usage().await)
    }

    /// Stops background work and drops connections.
    pub async fn shutdown(&self) {
        self.backend.shutdown().await;
    }

    // == Read-through ==
    /// Cache-first read with compute-on-miss and best-effort write-back.
    ///
    /// Errors from `compute` are returned unchanged and never cached. The
    /// freshly computed value is returned whether or not the write-back
    /// succeeded.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: TtlClass,
        compute: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(hit) = self.get(key).await {
            return Ok(hit);
        }

        let fresh = compute().await?;

        if let Err(e) = self.set(key, &fresh, Some(ttl.duration())).await {
            warn!(key, error = %e, "Cache write-back skipped");
        }

        Ok(fresh)
    }
}
