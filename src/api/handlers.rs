//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::{Lookup, TimedCache};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::models::{
    EntriesResponse, GetResponse, HealthResponse, InvalidatePatternRequest, InvalidateResponse,
    RemovedResponse, SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// Holds the process-wide server-tier cache. Built once at startup and
/// cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub cache: TimedCache<Value>,
}

impl AppState {
    pub fn new(cache: TimedCache<Value>) -> Self {
        Self { cache }
    }

    /// Creates the state with a fresh cache built from `config`.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Ok(Self::new(TimedCache::new(config.clone())?))
    }
}

/// Handler for PUT /cache
///
/// Stores a JSON document under a key, with an optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl().unwrap_or(state.cache.config().default_ttl);
    state.cache.set(req.key.as_str(), req.value, ttl).await?;

    Ok(Json(SetResponse::new(req.key, ttl.as_millis() as u64)))
}

/// Handler for GET /cache/:key
///
/// Returns a live entry and whether it is stale.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.lookup(&key).await {
        Lookup::Fresh(value) => Ok(Json(GetResponse::new(key, value, false))),
        Lookup::Stale(value) => Ok(Json(GetResponse::new(key, value, true))),
        Lookup::Miss => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /cache/:key
///
/// Invalidating a missing key is not an error.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.cache.invalidate(&key).await;
    Json(InvalidateResponse { key, removed })
}

/// Handler for POST /invalidate
///
/// Removes every key matching a regular expression.
pub async fn invalidate_pattern_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidatePatternRequest>,
) -> Result<Json<RemovedResponse>> {
    let removed = state.cache.invalidate_pattern(&req.pattern).await?;
    Ok(Json(RemovedResponse {
        pattern: Some(req.pattern),
        removed,
    }))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let removed = state.cache.clear().await;
    Json(RemovedResponse {
        pattern: None,
        removed,
    })
}

/// Handler for GET /cache
pub async fn entries_handler(State(state): State<AppState>) -> Json<EntriesResponse> {
    Json(EntriesResponse::new(state.cache.entries().await))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats().await))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
