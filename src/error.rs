//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache and its HTTP front end.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache limits are missing or non-positive
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Value can never fit under the memory limit
    #[error("Value too large: {size} bytes exceeds limit of {limit} bytes")]
    ValueTooLarge { size: usize, limit: usize },
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::ValueTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            CacheError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CacheError::InvalidConfig("max_items must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: max_items must be positive"
        );

        let err = CacheError::ValueTooLarge { size: 30, limit: 20 };
        assert_eq!(
            err.to_string(),
            "Value too large: 30 bytes exceeds limit of 20 bytes"
        );
    }

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (CacheError::NotFound("k".into()), StatusCode::NOT_FOUND),
            (CacheError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (
                CacheError::ValueTooLarge { size: 2, limit: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                CacheError::InvalidConfig("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
