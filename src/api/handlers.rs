//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::cache::Cache;
use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult, Result};
use crate::models::requests::validate_key;
use crate::models::{
    DeleteResponse, EvictRequest, GetResponse, HealthResponse, KeysQuery, KeysResponse,
    RemovedResponse, SetRequest, SetResponse, StatsResponse, TouchResponse,
};

/// Application state shared across all handlers.
///
/// The cache handle is internally synchronized, so no outer lock is needed.
#[derive(Clone)]
pub struct AppState {
    /// Served cache
    pub cache: Cache<String, Value>,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: Cache<String, Value>) -> Self {
        Self { cache }
    }

    /// Creates the served cache from server configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let cache = Cache::new(config.cache_config())?;
        Ok(Self::new(cache))
    }
}

fn checked_key(key: String) -> ApiResult<String> {
    match validate_key(&key) {
        Some(error_msg) => Err(ApiError::InvalidRequest(error_msg)),
        None => Ok(key),
    }
}

/// Handler for PUT /set
///
/// Stores a value in the cache with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> ApiResult<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl_ms.map(Duration::from_millis);
    let value = state.cache.put(req.key.clone(), req.value, ttl);

    Ok(Json(SetResponse::new(req.key, value)))
}

/// Handler for GET /get/:key
///
/// Retrieves the live value(s) for a key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<GetResponse>> {
    let key = checked_key(key)?;
    match state.cache.get(&key) {
        Some(found) => Ok(Json(GetResponse::new(key, found))),
        None => Err(ApiError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Deleting an absent key succeeds with `deleted: false`.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let key = checked_key(key)?;
    let deleted = state.cache.delete(&key);
    Ok(Json(DeleteResponse::new(key, deleted)))
}

/// Handler for POST /touch/:key
pub async fn touch_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<TouchResponse>> {
    let key = checked_key(key)?;
    let touched = state.cache.touch(&key);
    Ok(Json(TouchResponse::new(key, touched)))
}

/// Handler for GET /keys
pub async fn keys_handler(
    State(state): State<AppState>,
    Query(query): Query<KeysQuery>,
) -> Json<KeysResponse> {
    Json(KeysResponse::new(state.cache.keys(query.include_expired)))
}

/// Handler for DELETE /purge
pub async fn purge_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    Json(RemovedResponse::new(state.cache.purge()))
}

/// Handler for POST /expire
///
/// Runs an expiration sweep immediately.
pub async fn expire_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    Json(RemovedResponse::new(state.cache.remove_expired()))
}

/// Handler for POST /evict
///
/// Evicts the given number of oldest entries immediately.
pub async fn evict_handler(
    State(state): State<AppState>,
    Json(req): Json<EvictRequest>,
) -> Json<RemovedResponse> {
    Json(RemovedResponse::new(state.cache.remove_oldest(req.count)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache.name()))
}
