//! Error types for Vitrine
//!
//! `FetchError` is the data-access taxonomy shared by every backend attempt.
//! It is `Clone` so that all callers coalesced onto one fetch observe the
//! identical failure. `AppError` wraps it for the HTTP surface.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Why a single backend attempt did not produce usable data
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// Connection failure, abort, or non-success HTTP status
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Payload missing required top-level fields or not valid JSON
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Backend answered but flagged the operation as failed
    #[error("Backend error: {0}")]
    Backend(String),

    /// The task running the fetch panicked or was cancelled
    #[error("Fetch task failed: {0}")]
    Internal(String),
}

impl FetchError {
    /// Stable label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::Timeout(_) => "timeout",
            FetchError::MalformedResponse(_) => "malformed",
            FetchError::Backend(_) => "backend",
            FetchError::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::MalformedResponse(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::MalformedResponse(err.to_string())
    }
}

/// Result of a data-access operation
pub type FetchResult<T> = Result<T, FetchError>;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] FetchError),

    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                msg.clone(),
            ),
            AppError::Upstream(FetchError::Timeout(_)) => (
                StatusCode::GATEWAY_TIMEOUT,
                "UPSTREAM_TIMEOUT",
                "Connection problem, please retry".to_string(),
            ),
            AppError::Upstream(_) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "Connection problem, please retry".to_string(),
            ),
            AppError::RedisError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MARKER_STORE_ERROR",
                "Marker store error".to_string(),
            ),
            AppError::JsonError(_) => (
                StatusCode::BAD_REQUEST,
                "INVALID_JSON",
                "Invalid JSON in request".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
