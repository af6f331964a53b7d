//! Cache Module
//!
//! Provider-agnostic key-value cache with TTL expiry, pattern invalidation and
//! two interchangeable backends: a durable file store and Redis.

mod entry;
mod facade;
mod file;
mod pattern;
mod remote;
mod selector;
mod stats;
mod store;
mod ttl;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use facade::Cache;
pub use file::{decode_key, encode_key, sweep_expired, FileCache, MAX_RECORD_NAME_LEN};
pub use pattern::KeyPattern;
pub use remote::RedisCache;
pub use selector::select_backend;
pub use stats::{CacheStats, StatsRecorder};
pub use store::{Backend, CacheStore, StoreUsage};
pub use ttl::TtlClass;

// == Public Constants ==
/// `ttl` result for a key that exists without expiry.
pub const TTL_NO_EXPIRY: i64 = -1;

/// `ttl` result for a key that is absent, expired or unreadable.
pub const TTL_MISSING: i64 = -2;
