//! Error types for the gateway request path.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors surfaced to callers of the inference endpoints.
///
/// Cache and auth-store failures never appear here: the gateway degrades
/// (skips caching, falls back to a direct credential check) instead of
/// failing the request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid authentication key")]
    Unauthenticated,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("All backends failed: {0}")]
    AllBackendsFailed(String),

    #[error("Too many concurrent requests")]
    Overloaded,

    #[error("Request timed out")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Error::AllBackendsFailed(_) => (StatusCode::SERVICE_UNAVAILABLE, "all_backends_failed"),
            Error::Overloaded => (StatusCode::SERVICE_UNAVAILABLE, "overloaded"),
            Error::Timeout => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
