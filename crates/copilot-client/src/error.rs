//! Client error types.

use copilot_auth::{AuthError, SendError};
use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The authenticated send failed (token, transport or cancellation).
    #[error(transparent)]
    Send(#[from] SendError),

    /// HTTP request could not be built or read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Settings could not produce a URL or scope.
    #[error("Configuration error: {0}")]
    Config(#[from] copilot_config::ConfigError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The agent service returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, or a status summary when empty.
        message: String,
    },

    /// The agent service refused the bearer token.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Stream error.
    #[error("Stream error: {0}")]
    Stream(String),

    /// A question was asked before a conversation was started.
    #[error("No conversation has been started")]
    NoConversation,
}

impl From<AuthError> for Error {
    fn from(e: AuthError) -> Self {
        Error::Send(SendError::Authentication(e))
    }
}

impl Error {
    /// Check if this is an authentication error (token acquisition or a
    /// 401/403 from the agent).
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_)) || matches!(self, Error::Send(SendError::Authentication(_)))
    }

    /// Check if the send was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Send(SendError::Cancelled))
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_classification() {
        assert!(Error::Auth("forbidden".into()).is_auth_error());
        assert!(Error::from(AuthError::Network("down".into())).is_auth_error());
        assert!(
            !Error::Api {
                status: 500,
                message: "boom".into()
            }
            .is_auth_error()
        );
    }

    #[test]
    fn test_server_error_and_cancelled() {
        assert!(
            Error::Api {
                status: 503,
                message: String::new()
            }
            .is_server_error()
        );
        assert!(Error::Send(SendError::Cancelled).is_cancelled());
        assert!(!Error::NoConversation.is_cancelled());
    }
}
