//! Explorer Cache - provider-agnostic caching for the file explorer backend
//!
//! A key-value cache with TTL expiry and wildcard invalidation, backed either
//! by a durable file store or by Redis, plus the read-through layer that puts
//! it in front of folder and file queries.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod explorer;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, TtlClass};
pub use config::Config;
pub use error::{CacheError, Result};
