//! Error types for token acquisition and authenticated sends.

/// Result type alias for token acquisition.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Token acquisition failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Network/HTTP error talking to the token endpoint.
    #[error("Network error: {0}")]
    Network(String),

    /// The token endpoint rejected the grant.
    #[error("Token endpoint error ({status}): {error}: {description}")]
    TokenEndpoint {
        status: u16,
        error: String,
        description: String,
    },

    /// The token endpoint answered with something that is not a token.
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    /// Settings could not produce an authority or scope.
    #[error("Config error: {0}")]
    Config(String),
}

impl AuthError {
    /// Failure class, for logs that must not carry credentials.
    pub fn category(&self) -> &'static str {
        match self {
            AuthError::Network(_) => "network",
            AuthError::TokenEndpoint { .. } => "token_endpoint",
            AuthError::InvalidResponse(_) => "invalid_response",
            AuthError::Config(_) => "config",
        }
    }

    /// OAuth error code, when the token endpoint supplied one.
    pub fn oauth_error(&self) -> Option<&str> {
        match self {
            AuthError::TokenEndpoint { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError::Network(e.to_string())
    }
}

impl From<copilot_config::ConfigError> for AuthError {
    fn from(e: copilot_config::ConfigError) -> Self {
        AuthError::Config(e.to_string())
    }
}

/// Failures of an authenticated send.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// No token could be attached; nothing was sent.
    #[error("Authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// The wrapped transport failed after the token was attached.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The caller cancelled the send.
    #[error("Request cancelled")]
    Cancelled,
}

impl SendError {
    /// Check if this is an authentication failure.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, SendError::Authentication(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(AuthError::Network("x".into()).category(), "network");
        let rejected = AuthError::TokenEndpoint {
            status: 400,
            error: "invalid_grant".into(),
            description: "AADSTS50126".into(),
        };
        assert_eq!(rejected.category(), "token_endpoint");
        assert_eq!(rejected.oauth_error(), Some("invalid_grant"));
        assert_eq!(AuthError::Config("x".into()).oauth_error(), None);
    }

    #[test]
    fn test_send_error_from_auth() {
        let err: SendError = AuthError::InvalidResponse("empty".into()).into();
        assert!(err.is_auth_error());
        assert!(err.to_string().starts_with("Authentication failed"));
        assert!(!SendError::Cancelled.is_auth_error());
    }
}
