//! API error envelope: `{code, message, details?}` where `code` mirrors
//! the HTTP status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_u16(),
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Log the underlying error and hide it behind a generic 500; driver text
/// never reaches a client.
pub fn internal_error<E: std::fmt::Display>(err: E) -> ApiError {
    tracing::error!(error = %err, "internal error");
    ApiError::internal("internal server error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_omits_empty_details() {
        let err = ApiError::bad_request("events array is empty");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], 400);
        assert_eq!(json["message"], "events array is empty");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn internal_error_hides_cause() {
        let err = internal_error("connection refused (password=hunter2)");
        assert_eq!(err.code, 500);
        assert_eq!(err.message, "internal server error");
    }
}
