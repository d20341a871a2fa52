use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Build a status error from a response, pulling a human-readable
    /// message out of a structured `{"message": ...}` body when the
    /// server sends one, otherwise falling back to a generic message
    /// per status class or the truncated raw body.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .and_then(|m| m.as_str())
                    .map(|m| m.to_string())
            })
            .unwrap_or_else(|| match status.as_u16() {
                401 => "Unauthorized. Please login again.".to_string(),
                404 => "Resource not found.".to_string(),
                429 => "Rate limited - please wait before retrying.".to_string(),
                500..=599 => "Server error. Please try again later.".to_string(),
                _ if body.is_empty() => "An unexpected error occurred.".to_string(),
                _ => Self::truncate_body(body),
            });

        ApiError::Status {
            status: status.as_u16(),
            message,
        }
    }

    /// Normalize into the cloneable shape entries cache.
    pub fn normalized(&self) -> QueryError {
        match self {
            ApiError::Status { status, message } => QueryError {
                status: Some(*status),
                message: message.clone(),
            },
            other => QueryError {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

/// Normalized fetch failure, stored in cache entries and handed to every
/// waiter of a coalesced read. One shape for all endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryError {
    /// HTTP status when the failure was a 4xx/5xx; `None` for transport
    /// or decode failures.
    pub status: Option<u16>,
    pub message: String,
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for QueryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_extracts_structured_message() {
        let err = ApiError::from_status(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"message": "text is required"}"#,
        );
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "text is required");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_from_status_falls_back_per_class() {
        let err = ApiError::from_status(reqwest::StatusCode::NOT_FOUND, "");
        assert_eq!(
            err.to_string(),
            "HTTP 404: Resource not found."
        );

        let err = ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, "upstream died");
        assert_eq!(
            err.to_string(),
            "HTTP 502: Server error. Please try again later."
        );
    }

    #[test]
    fn test_from_status_truncates_long_bodies() {
        let body = "x".repeat(600);
        let err = ApiError::from_status(reqwest::StatusCode::IM_A_TEAPOT, &body);
        match err {
            ApiError::Status { message, .. } => {
                assert!(message.contains("truncated, 600 total bytes"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_normalized_keeps_status() {
        let err = ApiError::Status {
            status: 403,
            message: "forbidden".to_string(),
        };
        let norm = err.normalized();
        assert_eq!(norm.status, Some(403));
        assert_eq!(norm.message, "forbidden");

        let norm = ApiError::Decode("not json".to_string()).normalized();
        assert_eq!(norm.status, None);
    }
}
