//! Integration Tests for the Cache Facade
//!
//! Exercises the public cache contract end to end against the file backend
//! and against a Redis backend whose server cannot be reached.

use std::sync::Arc;
use std::time::Duration;

use explorer_cache::{
    cache::{Backend, Cache, FileCache, RedisCache, TTL_MISSING},
    config::{CacheProvider, Config, FileCacheConfig, RedisConfig},
};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio_test::assert_ok;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FolderListing {
    items: Vec<String>,
    total: u64,
}

fn listing(prefix: &str) -> FolderListing {
    FolderListing {
        items: (0..3).map(|i| format!("{prefix}-{i}")).collect(),
        total: 3,
    }
}

async fn file_cache(dir: &TempDir) -> Cache {
    let store = FileCache::open(&FileCacheConfig {
        dir: dir.path().to_path_buf(),
        sweep_interval: Duration::from_secs(3600),
    })
    .await
    .unwrap();
    Cache::new(Backend::File(store))
}

fn unreachable_redis() -> RedisConfig {
    RedisConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        connect_timeout: Duration::from_millis(200),
        command_timeout: Duration::from_millis(200),
        max_retries: 1,
        ..RedisConfig::default()
    }
}

#[tokio::test]
async fn test_set_then_get_returns_value() {
    let tmp = TempDir::new().unwrap();
    let cache = file_cache(&tmp).await;

    assert_ok!(
        cache
            .set("folder:content:abc:1", &listing("a"), Some(Duration::from_secs(300)))
            .await
    );

    assert_eq!(
        cache.get::<FolderListing>("folder:content:abc:1").await,
        Some(listing("a"))
    );
    assert!(cache.exists("folder:content:abc:1").await);
}

#[tokio::test]
async fn test_entries_expire() {
    let tmp = TempDir::new().unwrap();
    let cache = file_cache(&tmp).await;

    cache
        .set("folder:content:abc:1", &listing("a"), Some(Duration::from_millis(10)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(cache.get::<FolderListing>("folder:content:abc:1").await.is_none());
    assert!(!cache.exists("folder:content:abc:1").await);
    assert_eq!(cache.ttl("folder:content:abc:1").await, TTL_MISSING);
}

#[tokio::test]
async fn test_del_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let cache = file_cache(&tmp).await;

    cache
        .set("file:1", &"x", Some(Duration::from_secs(60)))
        .await
        .unwrap();
    cache.del("file:1").await;
    cache.del("file:1").await;
    cache.del("never-set").await;

    assert!(!cache.exists("file:1").await);
}

#[tokio::test]
async fn test_del_pattern_respects_prefix() {
    let tmp = TempDir::new().unwrap();
    let cache = file_cache(&tmp).await;
    let ttl = Some(Duration::from_secs(60));

    for key in ["search:folder:a:1", "search:file:b:2", "search:"] {
        cache.set(key, &1u8, ttl).await.unwrap();
    }
    for key in ["folder:search:1", "folders:root:1", "xsearch:1"] {
        cache.set(key, &1u8, ttl).await.unwrap();
    }

    assert_eq!(cache.del_pattern("search:*").await.unwrap(), 3);

    assert!(!cache.exists("search:folder:a:1").await);
    assert!(!cache.exists("search:").await);
    assert!(cache.exists("folder:search:1").await);
    assert!(cache.exists("folders:root:1").await);
    assert!(cache.exists("xsearch:1").await);
}

#[tokio::test]
async fn test_ttl_sentinels_and_range() {
    let tmp = TempDir::new().unwrap();
    let cache = file_cache(&tmp).await;

    assert_eq!(cache.ttl("never-set").await, TTL_MISSING);

    cache
        .set("folder:1", &"Documents", Some(Duration::from_secs(60)))
        .await
        .unwrap();
    let ttl = cache.ttl("folder:1").await;
    assert!((1..=60).contains(&ttl), "ttl was {ttl}");
}

#[tokio::test]
async fn test_flush_empties_store() {
    let tmp = TempDir::new().unwrap();
    let cache = file_cache(&tmp).await;
    let keys = ["folder:1", "file:2", "search:folder:x:1"];

    for key in keys {
        cache
            .set(key, &listing(key), Some(Duration::from_secs(60)))
            .await
            .unwrap();
    }
    cache.flush().await;

    for key in keys {
        assert!(!cache.exists(key).await, "{key} survived flush");
    }
}

#[tokio::test]
async fn test_concurrent_sets_leave_one_whole_value() {
    let tmp = TempDir::new().unwrap();
    let cache = file_cache(&tmp).await;
    let first = listing("first");
    let second = listing("second");

    for _ in 0..20 {
        let a = cache.clone();
        let b = cache.clone();
        let (va, vb) = (first.clone(), second.clone());

        let (ra, rb) = tokio::join!(
            tokio::spawn(async move {
                a.set("folder:race", &va, Some(Duration::from_secs(60))).await
            }),
            tokio::spawn(async move {
                b.set("folder:race", &vb, Some(Duration::from_secs(60))).await
            }),
        );
        ra.unwrap().unwrap();
        rb.unwrap().unwrap();

        let stored = cache.get::<FolderListing>("folder:race").await.unwrap();
        assert!(stored == first || stored == second, "corrupt value: {stored:?}");
    }
}

#[tokio::test]
async fn test_concurrent_readers_never_see_partial_writes() {
    let tmp = TempDir::new().unwrap();
    let cache = Arc::new(file_cache(&tmp).await);
    cache
        .set("folder:busy", &listing("seed"), Some(Duration::from_secs(60)))
        .await
        .unwrap();

    let writer = {
        let cache = cache.clone();
        tokio::spawn(async move {
            for i in 0..50 {
                let value = listing(&format!("v{i}"));
                cache
                    .set("folder:busy", &value, Some(Duration::from_secs(60)))
                    .await
                    .unwrap();
            }
        })
    };

    for _ in 0..50 {
        let read = cache.get::<FolderListing>("folder:busy").await;
        let read = read.expect("a live key never reads as absent mid-write");
        assert_eq!(read.total, 3);
    }

    writer.await.unwrap();
    assert_eq!(cache.stats().await.misses, 0);
}

#[tokio::test]
async fn test_unreachable_redis_is_silent() {
    let cache = Cache::new(Backend::Redis(RedisCache::new(unreachable_redis()).unwrap()));

    assert!(cache.get::<FolderListing>("folder:1").await.is_none());
    assert_ok!(
        cache
            .set("folder:1", &listing("a"), Some(Duration::from_secs(60)))
            .await
    );
    cache.del("folder:1").await;
    assert!(!cache.exists("folder:1").await);
    assert_eq!(cache.ttl("folder:1").await, TTL_MISSING);
    assert_eq!(cache.del_pattern("folder:*").await.unwrap(), 0);
    cache.flush().await;
    assert!(!cache.is_ready().await);
    assert_eq!(cache.stats().await.writes, 0);
}

#[tokio::test]
async fn test_selector_keeps_redis_when_host_unreachable() {
    let tmp = TempDir::new().unwrap();
    let config = Config {
        cache_provider: CacheProvider::Redis,
        file: FileCacheConfig {
            dir: tmp.path().to_path_buf(),
            sweep_interval: Duration::from_secs(3600),
        },
        redis: unreachable_redis(),
        ..Config::default()
    };

    let cache = Cache::from_config(&config).await.unwrap();
    assert_eq!(cache.backend_name(), "redis");
    assert!(cache.get::<u32>("anything").await.is_none());
}

#[tokio::test]
async fn test_selector_falls_back_to_file_store() {
    let tmp = TempDir::new().unwrap();
    let config = Config {
        cache_provider: CacheProvider::Redis,
        file: FileCacheConfig {
            dir: tmp.path().join("cache"),
            sweep_interval: Duration::from_secs(3600),
        },
        redis: RedisConfig {
            url: Some("not a redis url".to_string()),
            ..RedisConfig::default()
        },
        ..Config::default()
    };

    let cache = Cache::from_config(&config).await.unwrap();
    assert_eq!(cache.backend_name(), "file");
    assert!(tmp.path().join("cache").is_dir());

    cache
        .set("folder:1", &1u32, Some(Duration::from_secs(60)))
        .await
        .unwrap();
    assert_eq!(cache.get::<u32>("folder:1").await, Some(1));
    cache.shutdown().await;
}
