//! Configuration Module
//!
//! Handles loading backend selection, backend settings and the admin server
//! port from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Backend requested through `CACHE_PROVIDER`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheProvider {
    /// Durable local store (default)
    File,
    /// Remote Redis store
    Redis,
    /// Anything else; resolved to the file store at selection time
    Unknown(String),
}

impl CacheProvider {
    /// Parses a provider identifier, case-insensitively.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => CacheProvider::File,
            "redis" => CacheProvider::Redis,
            other => CacheProvider::Unknown(other.to_string()),
        }
    }
}

/// Settings for the durable local store.
#[derive(Debug, Clone)]
pub struct FileCacheConfig {
    /// Directory holding one record per key
    pub dir: PathBuf,
    /// Interval between background sweeps of expired records
    pub sweep_interval: Duration,
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".cache"),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Upper bound for `REDIS_MAX_RETRIES`.
pub const MAX_REDIS_RETRIES: u32 = 10;

/// Settings for the remote Redis store.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Full connection URL; takes precedence over host/port/password/db
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
    /// Namespace prepended to every key
    pub key_prefix: String,
    /// Bound on a single connection attempt
    pub connect_timeout: Duration,
    /// Bound on a single command round-trip
    pub command_timeout: Duration,
    /// Retries after the first failed attempt of an operation
    pub max_retries: u32,
}

impl RedisConfig {
    /// Backoff before retry number `attempt` (1-based): 50ms per attempt, capped at 2s.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(u64::from(attempt).saturating_mul(50).min(2000))
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            db: 0,
            key_prefix: "explorer:".to_string(),
            connect_timeout: Duration::from_millis(10_000),
            command_timeout: Duration::from_millis(2_000),
            max_retries: 3,
        }
    }
}

/// Process configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Which backend to try first
    pub cache_provider: CacheProvider,
    pub file: FileCacheConfig,
    pub redis: RedisConfig,
    /// Admin HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_PROVIDER` - `file` or `redis` (default: file)
    /// - `CACHE_DIR` - File store directory (default: .cache)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `REDIS_URL` - Optional connection URL
    /// - `REDIS_HOST` / `REDIS_PORT` / `REDIS_PASSWORD` / `REDIS_DB`
    /// - `REDIS_KEY_PREFIX` - Key namespace (default: explorer:)
    /// - `REDIS_CONNECT_TIMEOUT_MS` (default: 10000)
    /// - `REDIS_COMMAND_TIMEOUT_MS` (default: 2000)
    /// - `REDIS_MAX_RETRIES` (default: 3)
    /// - `SERVER_PORT` - Admin HTTP port (default: 3000)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            cache_provider: lookup("CACHE_PROVIDER")
                .map(|v| CacheProvider::parse(&v))
                .unwrap_or(defaults.cache_provider),
            file: FileCacheConfig {
                dir: non_empty("CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.file.dir),
                sweep_interval: parsed("CACHE_SWEEP_INTERVAL")
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.file.sweep_interval),
            },
            redis: RedisConfig {
                url: non_empty("REDIS_URL"),
                host: non_empty("REDIS_HOST").unwrap_or(defaults.redis.host),
                port: parse_or(&lookup, "REDIS_PORT", defaults.redis.port),
                password: non_empty("REDIS_PASSWORD"),
                db: parse_or(&lookup, "REDIS_DB", defaults.redis.db),
                key_prefix: lookup("REDIS_KEY_PREFIX").unwrap_or(defaults.redis.key_prefix),
                connect_timeout: parsed("REDIS_CONNECT_TIMEOUT_MS")
                    .filter(|ms| *ms > 0)
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.redis.connect_timeout),
                command_timeout: parsed("REDIS_COMMAND_TIMEOUT_MS")
                    .filter(|ms| *ms > 0)
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.redis.command_timeout),
                max_retries: parse_or(&lookup, "REDIS_MAX_RETRIES", defaults.redis.max_retries)
                    .min(MAX_REDIS_RETRIES),
            },
            server_port: parse_or(&lookup, "SERVER_PORT", defaults.server_port),
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_provider: CacheProvider::File,
            file: FileCacheConfig::default(),
            redis: RedisConfig::default(),
            server_port: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_provider, CacheProvider::File);
        assert_eq!(config.file.dir, PathBuf::from(".cache"));
        assert_eq!(config.file.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.redis.port, 6379);
        assert_eq!(config.redis.key_prefix, "explorer:");
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_config_empty_lookup_uses_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.cache_provider, CacheProvider::File);
        assert_eq!(config.redis.host, "localhost");
        assert_eq!(config.redis.max_retries, 3);
        assert!(config.redis.password.is_none());
        assert!(config.redis.url.is_none());
    }

    #[test]
    fn test_config_reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("CACHE_PROVIDER", "Redis"),
            ("CACHE_DIR", "/tmp/explorer-cache"),
            ("CACHE_SWEEP_INTERVAL", "5"),
            ("REDIS_HOST", "cache.internal"),
            ("REDIS_PORT", "6380"),
            ("REDIS_PASSWORD", "secret"),
            ("REDIS_DB", "2"),
            ("REDIS_COMMAND_TIMEOUT_MS", "250"),
            ("SERVER_PORT", "8080"),
        ]));

        assert_eq!(config.cache_provider, CacheProvider::Redis);
        assert_eq!(config.file.dir, PathBuf::from("/tmp/explorer-cache"));
        assert_eq!(config.file.sweep_interval, Duration::from_secs(5));
        assert_eq!(config.redis.host, "cache.internal");
        assert_eq!(config.redis.port, 6380);
        assert_eq!(config.redis.password.as_deref(), Some("secret"));
        assert_eq!(config.redis.db, 2);
        assert_eq!(config.redis.command_timeout, Duration::from_millis(250));
        assert_eq!(config.server_port, 8080);
    }

    #[test]
    fn test_config_ignores_unparseable_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("REDIS_PORT", "not-a-port"),
            ("CACHE_SWEEP_INTERVAL", "0"),
            ("REDIS_PASSWORD", "  "),
        ]));
        assert_eq!(config.redis.port, 6379);
        assert_eq!(config.file.sweep_interval, Duration::from_secs(60));
        assert!(config.redis.password.is_none());
    }

    #[test]
    fn test_redis_tuning_is_clamped() {
        let config = Config::from_lookup(lookup_from(&[
            ("REDIS_MAX_RETRIES", "5000000"),
            ("REDIS_CONNECT_TIMEOUT_MS", "0"),
            ("REDIS_COMMAND_TIMEOUT_MS", "0"),
        ]));
        assert_eq!(config.redis.max_retries, MAX_REDIS_RETRIES);
        assert_eq!(config.redis.connect_timeout, Duration::from_millis(10_000));
        assert_eq!(config.redis.command_timeout, Duration::from_millis(2_000));

        let config = Config::from_lookup(lookup_from(&[("REDIS_MAX_RETRIES", "0")]));
        assert_eq!(config.redis.max_retries, 0);
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(CacheProvider::parse("file"), CacheProvider::File);
        assert_eq!(CacheProvider::parse(" REDIS "), CacheProvider::Redis);
        assert_eq!(
            CacheProvider::parse("memcached"),
            CacheProvider::Unknown("memcached".to_string())
        );
    }

    #[test]
    fn test_retry_delay_is_bounded() {
        let config = RedisConfig::default();
        assert_eq!(config.retry_delay(1), Duration::from_millis(50));
        assert_eq!(config.retry_delay(3), Duration::from_millis(150));
        assert_eq!(config.retry_delay(1000), Duration::from_millis(2000));
    }
}
