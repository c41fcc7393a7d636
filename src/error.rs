//! Error types for the cache
//!
//! Provides unified error handling using thiserror.
//!
//! Lookup misses are not errors: `get` returns `None`, `delete` and
//! `touch` return `false`. Only cache construction can fail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Errors raised while creating a cache.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// The cache was given an empty name
    #[error("cache name must not be empty")]
    MissingName,

    /// No sweep interval (or a zero one) was configured
    #[error("sweep interval must be set and greater than zero")]
    MissingSweepInterval,

    /// Size limit with a zero maximum
    #[error("size limit must allow at least one entry")]
    InvalidLimit,

    /// Reclaim fraction outside (0, 1]
    #[error("reclaim fraction must be in (0, 1], got {0}")]
    InvalidReclaimFraction(f64),

    /// Shard amount rejected by the concurrent map
    #[error("shard amount must be a power of two greater than 1, got {0}")]
    InvalidShardAmount(usize),

    /// The janitor could not be spawned outside a tokio runtime
    #[error("cache must be created from within a tokio runtime")]
    NoRuntime,
}

// == Result Type Alias ==
/// Convenience Result type for cache construction.
pub type Result<T> = std::result::Result<T, CacheError>;

// == API Error Enum ==
/// Error type for the HTTP front end.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Result type for HTTP handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
