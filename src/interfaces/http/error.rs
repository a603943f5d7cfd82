//! Mapping of protocol and repository errors onto HTTP responses.

use crate::domain::errors::{ProtocolError, RepositoryError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Query for a name that is absent or stored under another kind
    #[error("metric not found")]
    MetricNotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Protocol(ProtocolError::UnsupportedKind(_)) => StatusCode::NOT_IMPLEMENTED,
            ApiError::Protocol(_) => StatusCode::BAD_REQUEST,
            ApiError::Repository(RepositoryError::NotFound(_)) | ApiError::MetricNotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Repository(e) if status.is_server_error() => {
                warn!(error = %e, "Storage operation failed");
            }
            ApiError::Protocol(e) if e.is_authentication() => {
                warn!(error = %e, "Rejected request with bad signature");
            }
            _ => debug!(error = %self, status = status.as_u16(), "Request rejected"),
        }

        // backend error text is passed through as-is
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::Protocol(ProtocolError::Malformed("x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Protocol(ProtocolError::EmptyId),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Protocol(ProtocolError::BadSignature { id: "a".into() }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Protocol(ProtocolError::UnsupportedKind("x".into())),
                StatusCode::NOT_IMPLEMENTED,
            ),
            (
                ApiError::Repository(RepositoryError::NotFound("a".into())),
                StatusCode::NOT_FOUND,
            ),
            (ApiError::MetricNotFound, StatusCode::NOT_FOUND),
            (
                ApiError::Repository(RepositoryError::NoConnection),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{}", error);
        }
    }
}
