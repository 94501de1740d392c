//! API Routes
//!
//! Configures the Axum router with all cache admin endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, entries_handler, get_handler, health_handler, invalidate_handler,
    invalidate_pattern_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check
/// - `GET /stats` - Cache statistics
/// - `GET /cache` - Metadata of live entries
/// - `PUT /cache` - Store a JSON document
/// - `DELETE /cache` - Clear the cache
/// - `GET /cache/:key` - Read an entry
/// - `DELETE /cache/:key` - Invalidate a key
/// - `POST /invalidate` - Invalidate keys matching a pattern
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route(
            "/cache",
            get(entries_handler).put(set_handler).delete(clear_handler),
        )
        .route("/cache/:key", get(get_handler).delete(invalidate_handler))
        .route("/invalidate", post(invalidate_pattern_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
