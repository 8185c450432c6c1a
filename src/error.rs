//! Error types for the cache cluster.
//!
//! All cache-facing failures are expressed as `CacheError`. The type is
//! `Clone` because a single load shared through the in-flight coalescer must
//! deliver the identical error to every waiter. Bootstrap code and origin
//! loaders use `anyhow`; their failures are folded into `CacheError::Loader`
//! at the group boundary.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Unified error type for cache operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The caller passed an empty key.
    #[error("key is required")]
    EmptyKey,

    /// No group registered under the requested name.
    #[error("no such group: {0}")]
    GroupNotFound(String),

    /// The origin loader failed; the message carries the loader's error verbatim.
    #[error("loader failed for key {key}: {message}")]
    Loader { key: String, message: String },

    /// A peer RPC failed (timeout, connection refused, non-success status).
    #[error("peer request failed: {0}")]
    Peer(String),

    /// The leader of an in-flight load was dropped before publishing a result.
    #[error("in-flight load was abandoned before completing")]
    FlightAborted,
}

impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::EmptyKey => StatusCode::BAD_REQUEST,
            CacheError::GroupNotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Loader { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CacheError::Peer(_) => StatusCode::BAD_GATEWAY,
            CacheError::FlightAborted => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));

        (status, body).into_response()
    }
}

/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
