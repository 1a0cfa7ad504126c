use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use newsroom_protocol::RelayErrorBody;
use thiserror::Error;

/// Failures that end a relay request before any streamed byte is sent.
/// Once streaming has started errors can only be logged.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("{var} not configured")]
    MissingApiKey { var: &'static str },

    // ── Upstream errors ──────────────────────────────────────────────────────
    #[error("Gemini API unreachable: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    #[error("Gemini API error: {status}")]
    UpstreamStatus { status: u16 },

    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl AppError {
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::InvalidRequest { .. })
    }

    pub fn status_code(&self) -> StatusCode {
        if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = RelayErrorBody { error: self.to_string() };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_and_upstream_errors_are_500() {
        let missing = AppError::MissingApiKey { var: "GOOGLE_GEMINI_API_KEY" };
        assert_eq!(missing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(missing.to_string(), "GOOGLE_GEMINI_API_KEY not configured");

        let upstream = AppError::UpstreamStatus { status: 503 };
        assert_eq!(upstream.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.to_string(), "Gemini API error: 503");
    }

    #[test]
    fn validation_errors_are_400() {
        let err = AppError::InvalidRequest { message: "missing field `messages`".into() };
        assert!(err.is_validation());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
