//! API Module
//!
//! HTTP handlers and routing for the cache admin API.
//!
//! # Endpoints
//! - `GET /health` - Backend readiness
//! - `GET /stats` - Cache statistics
//! - `GET /ttl/:key` - Remaining lifetime of a key
//! - `DELETE /del/:key` - Delete a key
//! - `DELETE /keys?pattern=` - Pattern invalidation
//! - `POST /flush` - Remove every entry

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
