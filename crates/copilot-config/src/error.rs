//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while resolving configuration and building settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required setting could not be resolved from any source.
    #[error("{} is required", .keys.join(" or "))]
    MissingSetting { keys: Vec<String> },

    /// The selected authentication flow lacks the credentials it needs.
    #[error("invalid settings combination: {0}")]
    InvalidSettingsCombination(String),

    /// A setting was present but could not be interpreted.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// URL construction failed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ConfigError {
    /// Shorthand for a missing setting known under a single key.
    pub fn missing(key: impl Into<String>) -> Self {
        Self::MissingSetting {
            keys: vec![key.into()],
        }
    }

    /// Shorthand for a missing setting known under several aliases.
    pub fn missing_any(keys: &[&str]) -> Self {
        Self::MissingSetting {
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Shorthand for an unparseable value.
    pub fn invalid(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_message_names_all_keys() {
        let err = ConfigError::missing_any(&["POWER_PLATFORM_TENANT_ID", "ARM_TENANT_ID"]);
        assert_eq!(
            err.to_string(),
            "POWER_PLATFORM_TENANT_ID or ARM_TENANT_ID is required"
        );
    }

    #[test]
    fn test_invalid_value_message() {
        let err = ConfigError::invalid("POWER_PLATFORM_CLOUD", "mars", "unknown cloud");
        assert!(err.to_string().contains("POWER_PLATFORM_CLOUD"));
        assert!(err.to_string().contains("mars"));
    }
}
