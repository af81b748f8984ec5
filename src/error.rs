use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OcrError {
    #[error("No images or direct image links were detected.")]
    NoImageFound,

    #[error("OCR provider responded with HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Operation timed out.")]
    Timeout,

    #[error("API returned error: {message}")]
    Api { message: String },

    #[error("Request to OCR provider failed: {0}")]
    Transport(String),

    #[error("Failed to decode OCR provider response: {0}")]
    Decode(String),

    #[error("Failed to initialize OCR gateway: {0}")]
    Initialization(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl OcrError {
    /// Whether the free chain may move on to the next provider after this error.
    ///
    /// A provider that answered with a status code has spoken; only failures to
    /// get a usable answer at all are recovered from.
    pub fn allows_fallback(&self) -> bool {
        matches!(
            self,
            OcrError::Timeout | OcrError::Transport(_) | OcrError::Decode(_)
        )
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OcrError::Timeout
        } else if err.is_decode() {
            OcrError::Decode(err.to_string())
        } else {
            OcrError::Transport(err.to_string())
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for OcrError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            OcrError::NoImageFound => (StatusCode::UNPROCESSABLE_ENTITY, "NO_IMAGE_FOUND"),
            OcrError::HttpStatus { .. } => (StatusCode::BAD_GATEWAY, "PROVIDER_HTTP_ERROR"),
            OcrError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "PROVIDER_TIMEOUT"),
            OcrError::Api { .. } => (StatusCode::BAD_GATEWAY, "PROVIDER_API_ERROR"),
            OcrError::Transport(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_UNREACHABLE"),
            OcrError::Decode(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_BAD_RESPONSE"),
            OcrError::Initialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INIT_ERROR"),
            OcrError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_only_on_soft_failures() {
        assert!(OcrError::Timeout.allows_fallback());
        assert!(OcrError::Transport("connection refused".into()).allows_fallback());
        assert!(OcrError::Decode("expected value".into()).allows_fallback());

        assert!(!OcrError::HttpStatus { status: 503 }.allows_fallback());
        assert!(!OcrError::Api {
            message: "quota exceeded".into()
        }
        .allows_fallback());
    }

    #[test]
    fn test_status_code_mapping() {
        let response = OcrError::InvalidRequest("missing user_id".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = OcrError::Timeout.into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
