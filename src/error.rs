//! Error handling

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::{error, info};

/// Error definitions for the checkgen service.
#[derive(Debug)]
pub enum CheckgenError {
    /// The client sent something we can't work with
    InvalidInput(String),
    /// The generative model or the path to it failed
    Upstream(String),
    /// Reading or writing local files failed
    Storage(String),
}

impl CheckgenError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            CheckgenError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CheckgenError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CheckgenError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the same request might succeed if sent again later
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckgenError::Upstream(_))
    }

    /// The message that is shown to the caller
    pub fn message(&self) -> &str {
        match self {
            CheckgenError::InvalidInput(message)
            | CheckgenError::Upstream(message)
            | CheckgenError::Storage(message) => message,
        }
    }
}

impl std::fmt::Display for CheckgenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "Invalid input: {message}"),
            Self::Upstream(message) => write!(f, "Upstream error: {message}"),
            Self::Storage(message) => write!(f, "Storage error: {message}"),
        }
    }
}

impl std::error::Error for CheckgenError {}

impl From<std::io::Error> for CheckgenError {
    fn from(err: std::io::Error) -> Self {
        CheckgenError::Storage(err.to_string())
    }
}

impl From<axum::extract::multipart::MultipartError> for CheckgenError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        CheckgenError::InvalidInput(err.body_text())
    }
}

impl From<url::ParseError> for CheckgenError {
    fn from(err: url::ParseError) -> Self {
        CheckgenError::Upstream(err.to_string())
    }
}

impl IntoResponse for CheckgenError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        match &self {
            CheckgenError::InvalidInput(message) => {
                info!("Bad request: {}", message);
            }
            CheckgenError::Upstream(message) => {
                error!("Upstream error: {}", message);
            }
            CheckgenError::Storage(message) => {
                error!("Storage error: {}", message);
            }
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            CheckgenError::InvalidInput("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CheckgenError::Upstream("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            CheckgenError::Storage("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn only_upstream_errors_are_retryable() {
        assert!(CheckgenError::Upstream("timeout".into()).is_retryable());
        assert!(!CheckgenError::InvalidInput("no images".into()).is_retryable());
        assert!(!CheckgenError::Storage("disk full".into()).is_retryable());
    }

    #[test]
    fn io_errors_become_storage_errors() {
        let err: CheckgenError = std::io::Error::other("nope").into();
        assert!(matches!(err, CheckgenError::Storage(ref msg) if msg == "nope"));
    }
}
