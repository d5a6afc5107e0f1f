//! Custom error types for the common library
//!
//! This module defines the error taxonomy shared by every client of the
//! Clover Books REST API: transport failures, non-2xx responses carrying an
//! optional `{error}` body, and local failures (configuration, CSRF,
//! validation) that stop a request before it is sent.

use thiserror::Error;

/// Custom error type for API client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network or transport failure
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("Request failed (HTTP {status}): {}", .message.as_deref().unwrap_or("no details"))]
    Status {
        status: u16,
        message: Option<String>,
    },

    /// Response body could not be decoded
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A state-changing request was attempted without a CSRF token
    #[error("CSRF token unavailable; refusing to send a state-changing request")]
    MissingCsrfToken,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Payload rejected before it reached the server
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ClientError {
    /// Message suitable for surfacing in UI state.
    ///
    /// Prefers the server-provided `{error}` text and falls back to a generic
    /// description of the failure.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ClientError::Status { status, .. } => format!("Request failed (HTTP {status})"),
            ClientError::Validation(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status of the failure, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Type alias for Result with ClientError
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = ClientError::Status {
            status: 400,
            message: Some("Label already in use".to_string()),
        };
        assert_eq!(err.user_message(), "Label already in use");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_user_message_falls_back_to_status() {
        let err = ClientError::Status {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message(), "Request failed (HTTP 500)");

        let blank = ClientError::Status {
            status: 502,
            message: Some("  ".to_string()),
        };
        assert_eq!(blank.user_message(), "Request failed (HTTP 502)");
    }

    #[test]
    fn test_display_includes_message() {
        let err = ClientError::Status {
            status: 404,
            message: Some("Role not found".to_string()),
        };
        assert_eq!(err.to_string(), "Request failed (HTTP 404): Role not found");

        let bare = ClientError::Status {
            status: 503,
            message: None,
        };
        assert_eq!(bare.to_string(), "Request failed (HTTP 503): no details");
    }
}
