use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::auth::SessionError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not logged in")]
    NoSession,

    #[error("Unauthorized - session expired or invalid")]
    Unauthorized,

    #[error("Network error: {0}")]
    Network(#[source] BoxError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request failed with status {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Validation(String),

    #[error("Session storage error: {0}")]
    Session(#[from] SessionError),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(Box::new(err))
    }
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build the error for a non-2xx response. The backend reports failures
    /// as `{"detail": ...}`; other bodies are carried as (truncated) text.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            return ApiError::Unauthorized;
        }

        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.detail)
            .map(|detail| match detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_else(|| Self::truncate_body(body));

        ApiError::Status { status, detail }
    }

    /// True when the caller should send the user back to the login view.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::NoSession | ApiError::Unauthorized)
    }
}
