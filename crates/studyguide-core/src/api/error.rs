use serde::Deserialize;
use thiserror::Error;

use crate::utils::truncate_string;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body returned by the backend: `{ "message": ..., "errors": [...] }`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    path: serde_json::Value,
    message: String,
}

impl ApiError {
    /// Prefer the backend's structured message; otherwise a truncated raw body
    fn describe_body(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) if parsed.errors.is_empty() => parsed.message,
            Ok(parsed) => {
                let details: Vec<String> = parsed
                    .errors
                    .iter()
                    .map(|d| match &d.path {
                        serde_json::Value::String(p) => format!("{}: {}", p, d.message),
                        serde_json::Value::Null => d.message.clone(),
                        other => format!("{}: {}", other, d.message),
                    })
                    .collect();
                format!("{} ({})", parsed.message, details.join("; "))
            }
            Err(_) => truncate_string(body, MAX_ERROR_BODY_LENGTH),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let described = Self::describe_body(body);
        match status.as_u16() {
            400 | 422 => ApiError::BadRequest(described),
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(described),
            404 => ApiError::NotFound(described),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(described),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, described)),
        }
    }

    /// Whether retrying later could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited | ApiError::ServerError(_) | ApiError::NetworkError(_)
        )
    }
}
