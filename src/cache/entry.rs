//! Cache Entry Module
//!
//! Defines the envelope the durable local store writes to disk: an opaque
//! payload plus an absolute expiry instant.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// == Cache Entry ==
/// A single stored record with value and expiry metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// The serialized value, never inspected by the cache
    pub value: String,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: i64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    pub fn new(value: String, ttl: Duration) -> Self {
        let now = current_timestamp_ms();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);

        Self {
            value,
            created_at: now,
            expires_at: now.saturating_add(ttl_ms),
        }
    }

    // == Codec ==
    /// Serializes the envelope into its on-disk representation.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses an on-disk representation back into an envelope.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is live only while the current time is strictly before
    /// `expires_at`; at the boundary it is already expired.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        u64::try_from(self.expires_at - current_timestamp_ms()).unwrap_or(0)
    }

    /// Returns remaining TTL in whole seconds, rounded up.
    ///
    /// A live entry always reports at least one second.
    pub fn ttl_remaining_secs(&self) -> u64 {
        self.ttl_remaining_ms().div_ceil(1000)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}
