//! Mapping of crate errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::error::Error;

/// An error rendered as `{"detail": ...}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    /// Build an error with an explicit status.
    #[must_use]
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// 500 with the given detail.
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    /// Status code of the response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Detail message of the response.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_not_found() {
            return Self::new(StatusCode::NOT_FOUND, err.to_string());
        }
        error!("Request failed: {}", err);
        Self::internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let api: ApiError = Error::student_not_found("x@example.com").into();
        assert_eq!(api.status(), StatusCode::NOT_FOUND);
        assert_eq!(api.detail(), "Student not found");
    }

    #[test]
    fn test_storage_error_maps_to_500() {
        let api: ApiError = Error::LockPoisoned("students").into();
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(api.detail().contains("students"));
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::new(StatusCode::NOT_FOUND, "Student not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
