//! API Routes
//!
//! Configures the Axum router with the cache admin endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, flush_handler, health_handler, invalidate_handler, stats_handler,
    ttl_handler, AppState,
};

/// Creates the admin router.
///
/// # Endpoints
/// - `GET /health` - Backend readiness
/// - `GET /stats` - Hit/miss counters and backend usage
/// - `GET /ttl/:key` - Remaining lifetime of a key
/// - `DELETE /del/:key` - Delete a key
/// - `DELETE /keys?pattern=` - Delete keys matching a `*` pattern
/// - `POST /flush` - Remove every entry
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/ttl/:key", get(ttl_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/keys", delete(invalidate_handler))
        .route("/flush", post(flush_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
