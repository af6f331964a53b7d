//! Remote Store
//!
//! Redis-backed cache store. Expiry is delegated to Redis itself (`PSETEX`,
//! `PTTL`), so payloads carry no envelope. The client connects lazily and
//! keeps one multiplexed connection, rebuilding it after connection-level
//! failures. Every operation runs under a bounded retry policy and degrades to
//! a miss or no-op when Redis cannot be reached.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{
    AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo, RedisError,
    RedisResult,
};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::cache::pattern::escape_glob;
use crate::cache::{CacheStore, KeyPattern, StoreUsage, TTL_MISSING, TTL_NO_EXPIRY};
use crate::config::RedisConfig;
use crate::error::{CacheError, Result};

// == Redis Cache ==
/// Redis-backed cache store.
pub struct RedisCache {
    client: Client,
    config: RedisConfig,
    connection: Mutex<Option<MultiplexedConnection>>,
}

impl RedisCache {
    // == Constructor ==
    /// Builds the client from configuration without connecting.
    ///
    /// Fails only when the configuration cannot describe a Redis endpoint
    /// (malformed URL, empty host).
    pub fn new(config: RedisConfig) -> Result<Self> {
        let client = match &config.url {
            Some(url) => Client::open(url.as_str())?,
            None => {
                if config.host.trim().is_empty() {
                    return Err(CacheError::Config("Redis host cannot be empty".to_string()));
                }
                Client::open(ConnectionInfo {
                    addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
                    redis: RedisConnectionInfo {
                        db: config.db,
                        password: config.password.clone(),
                        ..Default::default()
                    },
                })?
            }
        };

        info!(
            endpoint = %endpoint(&config),
            key_prefix = %config.key_prefix,
            "Redis cache client created"
        );

        Ok(Self {
            client,
            config,
            connection: Mutex::new(None),
        })
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    /// Glob matching every key in this cache's namespace.
    fn namespace_glob(&self) -> String {
        format!("{}*", escape_glob(&self.config.key_prefix, false))
    }

    /// Returns the shared connection, establishing it if needed.
    ///
    /// The slot lock is not held while connecting: concurrent callers each
    /// wait at most `connect_timeout`.
    async fn connection(&self) -> Result<MultiplexedConnection> {
        {
            let slot = self.connection.lock().await;
            if let Some(conn) = slot.as_ref() {
                return Ok(conn.clone());
            }
        }

        let conn = timeout(
            self.config.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| {
            CacheError::Timeout(format!(
                "connect exceeded {}ms",
                self.config.connect_timeout.as_millis()
            ))
        })??;

        // Another caller may have connected meanwhile; keep the first one.
        let mut slot = self.connection.lock().await;
        if let Some(existing) = slot.as_ref() {
            return Ok(existing.clone());
        }

        info!(endpoint = %endpoint(&self.config), "Redis connected");
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn reset_connection(&self) {
        if self.connection.lock().await.take().is_some() {
            warn!(endpoint = %endpoint(&self.config), "Redis connection dropped");
        }
    }

    /// Runs a command with bounded retries.
    ///
    /// Connection, I/O and timeout failures drop the cached connection and are
    /// retried up to `max_retries` times with linear backoff; any other
    /// Redis error is returned immediately.
    async fn execute<T, F, Fut>(&self, op: &'static str, mut command: F) -> Result<T>
    where
        F: FnMut(MultiplexedConnection) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let mut attempt: u32 = 0;

        loop {
            let failure = match self.connection().await {
                Ok(conn) => match timeout(self.config.command_timeout, command(conn)).await {
                    Ok(Ok(value)) => return Ok(value),
                    Ok(Err(e)) if !is_transient(&e) => return Err(e.into()),
                    Ok(Err(e)) => CacheError::Redis(e),
                    Err(_) => CacheError::Timeout(format!(
                        "{op} exceeded {}ms",
                        self.config.command_timeout.as_millis()
                    )),
                },
                Err(e) => e,
            };

            self.reset_connection().await;

            if attempt >= self.config.max_retries {
                return Err(failure);
            }
            attempt += 1;
            debug!(op, attempt, error = %failure, "Retrying Redis operation");
            tokio::time::sleep(self.config.retry_delay(attempt)).await;
        }
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        let key = self.prefixed(key);
        self.execute("GET", |mut conn| {
            let key = key.clone();
            async move { conn.get::<_, Option<String>>(key).await }
        })
        .await
    }

    async fn write(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let key = self.prefixed(key);

        match ttl {
            // An entry that expires immediately is an absent entry.
            Some(ttl) if ttl.is_zero() => {
                self.execute("DEL", |mut conn| {
                    let key = key.clone();
                    async move { conn.del::<_, ()>(key).await }
                })
                .await
            }
            Some(ttl) => {
                let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
                self.execute("PSETEX", |mut conn| {
                    let key = key.clone();
                    let value = value.clone();
                    async move { conn.pset_ex::<_, _, ()>(key, value, millis).await }
                })
                .await
            }
            None => {
                self.execute("SET", |mut conn| {
                    let key = key.clone();
                    let value = value.clone();
                    async move { conn.set::<_, _, ()>(key, value).await }
                })
                .await
            }
        }
    }

    async fn remove(&self, key: &str) -> Result<usize> {
        let key = self.prefixed(key);
        self.execute("DEL", |mut conn| {
            let key = key.clone();
            async move { conn.del::<_, usize>(key).await }
        })
        .await
    }

    async fn remove_glob(&self, glob: String) -> Result<usize> {
        let keys = self
            .execute("KEYS", |mut conn| {
                let glob = glob.clone();
                async move { conn.keys::<_, Vec<String>>(glob).await }
            })
            .await?;

        if keys.is_empty() {
            return Ok(0);
        }

        self.execute("DEL", |mut conn| {
            let keys = keys.clone();
            async move { conn.del::<_, usize>(keys).await }
        })
        .await
    }

    async fn count_glob(&self, glob: String) -> Result<usize> {
        let keys = self
            .execute("KEYS", |mut conn| {
                let glob = glob.clone();
                async move { conn.keys::<_, Vec<String>>(glob).await }
            })
            .await?;
        Ok(keys.len())
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        let key = self.prefixed(key);
        self.execute("EXISTS", |mut conn| {
            let key = key.clone();
            async move { conn.exists::<_, bool>(key).await }
        })
        .await
    }

    async fn remaining_ms(&self, key: &str) -> Result<i64> {
        let key = self.prefixed(key);
        self.execute("PTTL", |mut conn| {
            let key = key.clone();
            async move { conn.pttl::<_, i64>(key).await }
        })
        .await
    }

    async fn flush_namespace(&self) -> Result<usize> {
        if self.config.key_prefix.is_empty() {
            self.execute("FLUSHDB", |mut conn| async move {
                let cmd = redis::cmd("FLUSHDB");
                let reply: RedisResult<()> = cmd.query_async(&mut conn).await;
                reply
            })
            .await?;
            return Ok(0);
        }

        self.remove_glob(self.namespace_glob()).await
    }

    /// Sends a single `PING`, without retries.
    pub async fn ping(&self) -> bool {
        let Ok(mut conn) = self.connection().await else {
            return false;
        };

        let reply = timeout(self.config.command_timeout, async move {
            let cmd = redis::cmd("PING");
            let pong: RedisResult<String> = cmd.query_async(&mut conn).await;
            pong
        })
        .await;

        matches!(reply, Ok(Ok(ref pong)) if pong == "PONG")
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Option<String> {
        match self.read(key).await {
            Ok(Some(value)) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "Redis get failed, treating as miss");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<bool> {
        match self.write(key, value, ttl).await {
            Ok(()) => {
                debug!(key, ttl_ms = ttl.map(|t| t.as_millis() as u64), "Cache set");
                Ok(true)
            }
            Err(e) => {
                error!(key, error = %e, "Redis set failed");
                Ok(false)
            }
        }
    }

    async fn del(&self, key: &str) {
        if let Err(e) = self.remove(key).await {
            error!(key, error = %e, "Redis del failed");
        }
    }

    async fn del_pattern(&self, pattern: &KeyPattern) -> usize {
        let glob = format!(
            "{}{}",
            escape_glob(&self.config.key_prefix, false),
            pattern.to_glob()
        );

        match self.remove_glob(glob).await {
            Ok(deleted) => {
                if deleted > 0 {
                    info!(pattern = pattern.as_str(), deleted, "Cache pattern deleted");
                }
                deleted
            }
            Err(e) => {
                error!(pattern = pattern.as_str(), error = %e, "Redis delPattern failed");
                0
            }
        }
    }

    async fn exists(&self, key: &str) -> bool {
        self.contains(key).await.unwrap_or_else(|e| {
            warn!(key, error = %e, "Redis exists failed");
            false
        })
    }

    async fn ttl(&self, key: &str) -> i64 {
        match self.remaining_ms(key).await {
            Ok(ms) => ttl_from_pttl(ms),
            Err(e) => {
                warn!(key, error = %e, "Redis ttl failed");
                TTL_MISSING
            }
        }
    }

    async fn flush(&self) {
        match self.flush_namespace().await {
            Ok(removed) => info!(removed, "Cache flushed"),
            Err(e) => error!(error = %e, "Redis flush failed"),
        }
    }

    async fn is_ready(&self) -> bool {
        self.ping().await
    }

    async fn usage(&self) -> StoreUsage {
        match self.count_glob(self.namespace_glob()).await {
            Ok(entries) => StoreUsage {
                entries: entries as u64,
                bytes: None,
            },
            Err(e) => {
                warn!(error = %e, "Failed to count Redis keys");
                StoreUsage::default()
            }
        }
    }

    async fn shutdown(&self) {
        if self.connection.lock().await.take().is_some() {
            info!(endpoint = %endpoint(&self.config), "Redis connection closed");
        }
    }
}

// == Helpers ==
fn is_transient(error: &RedisError) -> bool {
    error.is_io_error()
        || error.is_connection_dropped()
        || error.is_connection_refusal()
        || error.is_timeout()
}

/// Maps a `PTTL` reply onto the facade's whole-second contract.
fn ttl_from_pttl(millis: i64) -> i64 {
    match millis {
        ms if ms > 0 => (ms + 999) / 1000,
        -1 => TTL_NO_EXPIRY,
        _ => TTL_MISSING,
    }
}

/// Endpoint description for logs, never including the password.
fn endpoint(config: &RedisConfig) -> String {
    match &config.url {
        Some(_) => "<url>".to_string(),
        None => format!("{}:{}/{}", config.host, config.port, config.db),
    }
}
