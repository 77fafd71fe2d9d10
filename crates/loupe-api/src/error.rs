//! Error types for loupe-api.
//!
//! [`ApiError`] is the handler-facing error: each variant maps to one HTTP
//! status, and the response body carries the hosted service's
//! `{message, status}` error shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::types::ErrorResponse;

/// Result type alias for loupe-api operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced by the HTTP layer.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    /// Index or object absent — 404.
    #[error("{0}")]
    NotFound(String),

    /// Invalid request — 400.
    #[error("{0}")]
    BadRequest(String),

    /// Anything else — 500.
    #[error("{0}")]
    Internal(String),
}

impl From<loupe_core::Error> for ApiError {
    fn from(err: loupe_core::Error) -> Self {
        match err {
            loupe_core::Error::NotFound(msg) => Self::NotFound(msg),
            loupe_core::Error::BadRequest(msg) => Self::BadRequest(msg),
            loupe_core::Error::Parse(msg) => Self::BadRequest(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => {
                tracing::error!("internal failure: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = ErrorResponse {
            message,
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Tests
// ============================================================================
