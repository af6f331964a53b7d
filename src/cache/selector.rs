//! Backend Selector
//!
//! One-time startup choice of the cache backend. Caching is an optimization,
//! so a Redis backend that cannot be built falls back to the durable local
//! store instead of blocking boot.

use tracing::{error, info, warn};

use crate::cache::{Backend, FileCache, RedisCache};
use crate::config::{CacheProvider, Config};
use crate::error::Result;

/// Builds the backend named by `config.cache_provider`.
///
/// Returns `Err` only if the durable local store itself cannot be opened.
pub async fn select_backend(config: &Config) -> Result<Backend> {
    match &config.cache_provider {
        CacheProvider::Redis => {
            info!("Initializing Redis cache");
            match RedisCache::new(config.redis.clone()) {
                Ok(cache) => return Ok(Backend::Redis(cache)),
                Err(e) => {
                    warn!(error = %e, "Failed to initialize Redis, falling back to file cache");
                }
            }
        }
        CacheProvider::File => info!("Initializing file cache"),
        CacheProvider::Unknown(name) => {
            warn!(provider = %name, "Unknown cache provider, using file cache");
        }
    }

    match FileCache::open(&config.file).await {
        Ok(cache) => Ok(Backend::File(cache)),
        Err(e) => {
            error!(dir = %config.file.dir.display(), error = %e, "Failed to initialize file cache");
            Err(e)
        }
    }
}
