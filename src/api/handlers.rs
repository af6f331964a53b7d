//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use crate::cache::Cache;
use crate::config::Config;
use crate::error::Result;
use crate::models::{
    DeleteResponse, FlushResponse, HealthResponse, InvalidateQuery, InvalidateResponse,
    StatsResponse, TtlResponse,
};

/// Application state shared across all handlers.
///
/// `Cache` is itself a shared handle, so no extra locking is needed here.
#[derive(Clone)]
pub struct AppState {
    pub cache: Cache,
}

impl AppState {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    /// Selects the backend from configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(Cache::from_config(config).await?))
    }
}

/// Handler for GET /health
///
/// Always 200; a backend that does not answer reports "degraded".
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let ready = state.cache.is_ready().await;
    Json(HealthResponse::new(state.cache.backend_name(), ready))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats().await;
    Json(StatsResponse::new(state.cache.backend_name(), &stats))
}

/// Handler for GET /ttl/:key
pub async fn ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<TtlResponse> {
    let ttl = state.cache.ttl(&key).await;
    Json(TtlResponse::new(key, ttl))
}

/// Handler for DELETE /del/:key
///
/// Deleting an absent key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    state.cache.del(&key).await;
    Json(DeleteResponse::new(key))
}

/// Handler for DELETE /keys?pattern=...
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Query(query): Query<InvalidateQuery>,
) -> Result<Json<InvalidateResponse>> {
    let deleted = state.cache.del_pattern(&query.pattern).await?;
    info!(pattern = %query.pattern, deleted, "Invalidated keys");

    Ok(Json(InvalidateResponse {
        pattern: query.pattern,
        deleted,
    }))
}

/// Handler for POST /flush
pub async fn flush_handler(State(state): State<AppState>) -> Json<FlushResponse> {
    state.cache.flush().await;
    info!(backend = state.cache.backend_name(), "Cache flushed");
    Json(FlushResponse::flushed(state.cache.backend_name()))
}
