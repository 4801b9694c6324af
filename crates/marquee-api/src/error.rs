//! API error type and JSON error body.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use marquee_agent::ChatError;
use marquee_core::MarqueeError;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request").
    pub error: String,
    pub message: String,
}

/// Errors surfaced by handlers, mapped to HTTP status codes.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - malformed or empty chat payload.
    BadRequest(String),
    /// 413 Payload Too Large - body over the configured limit.
    PayloadTooLarge(String),
    /// 500 Internal Server Error.
    Internal(String),
    /// 503 Service Unavailable - the turn was aborted before completing.
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyConversation => ApiError::BadRequest(err.to_string()),
            ChatError::Cancelled => ApiError::ServiceUnavailable(err.to_string()),
        }
    }
}

impl From<MarqueeError> for ApiError {
    fn from(err: MarqueeError) -> Self {
        match err {
            MarqueeError::InvalidRole(_) | MarqueeError::Serialization(_) => {
                ApiError::BadRequest(err.to_string())
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let resp = ApiError::BadRequest("x".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = ApiError::from(ChatError::Cancelled).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let resp = ApiError::from(ChatError::EmptyConversation).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_core_error_mapping() {
        let err = ApiError::from(MarqueeError::InvalidRole("bot".into()));
        assert!(matches!(err, ApiError::BadRequest(_)));
        let err = ApiError::from(MarqueeError::Config("bad".into()));
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
