//! Request DTOs for the admin API
//!
//! Defines the structure of incoming query strings.

use serde::Deserialize;

/// Query string for pattern invalidation (DELETE /keys?pattern=...)
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateQuery {
    /// `*` wildcard pattern over cache keys
    #[serde(default)]
    pub pattern: String,
}
