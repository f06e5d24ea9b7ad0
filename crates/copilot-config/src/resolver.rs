//! Credential resolution over an environment snapshot and the settings store.
//!
//! Resolution order:
//! 1. Environment variable (non-empty values only)
//! 2. azd settings file found by walking up from the start directory
//! 3. Caller-supplied default
//!
//! The resolver never reads process-global state after construction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::env_file;
use crate::error::{ConfigError, Result};

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Environment variable.
    EnvVar(String),
    /// azd settings file.
    SettingsFile(PathBuf),
    /// Caller-supplied default.
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(var) => write!(f, "env var {}", var),
            ValueSource::SettingsFile(path) => write!(f, "settings file {}", path.display()),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    /// The key that produced the value.
    pub key: String,
    pub value: String,
    pub source: ValueSource,
}

/// Resolves configuration keys from an environment snapshot, then the
/// settings store reachable from a start directory.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    env: HashMap<String, String>,
    start_dir: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create a resolver over an explicit environment and start directory.
    pub fn new<I, K, V>(env: I, start_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            env: env
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            start_dir: Some(start_dir.into()),
        }
    }

    /// Create a resolver over an explicit environment with no settings store.
    pub fn env_only<I, K, V>(env: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            env: env
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            start_dir: None,
        }
    }

    /// Snapshot the process environment and current directory.
    ///
    /// A current directory that cannot be determined disables the settings
    /// store rather than failing.
    pub fn from_process() -> Self {
        let start_dir = match std::env::current_dir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                tracing::debug!(error = %e, "Cannot determine current directory");
                None
            }
        };
        Self {
            env: std::env::vars().collect(),
            start_dir,
        }
    }

    /// Directory the settings store search starts from.
    pub fn start_dir(&self) -> Option<&Path> {
        self.start_dir.as_deref()
    }

    /// Resolve `key` with provenance, without a default.
    pub fn resolve_with_source(&self, key: &str) -> Option<ResolvedValue> {
        if let Some(value) = self.env.get(key)
            && !value.is_empty()
        {
            return Some(ResolvedValue {
                key: key.to_string(),
                value: value.clone(),
                source: ValueSource::EnvVar(key.to_string()),
            });
        }

        let start = self.start_dir.as_deref()?;
        let (value, file) = env_file::lookup(start, key)?;
        tracing::debug!(key, path = %file.display(), "Resolved from settings file");
        Some(ResolvedValue {
            key: key.to_string(),
            value,
            source: ValueSource::SettingsFile(file),
        })
    }

    /// Resolve `key`, falling back to `default`.
    pub fn resolve(&self, key: &str, default: Option<&str>) -> Option<String> {
        self.resolve_with_source(key)
            .map(|r| r.value)
            .or_else(|| default.map(str::to_string))
    }

    /// Resolve `key` with no default.
    pub fn get(&self, key: &str) -> Option<String> {
        self.resolve(key, None)
    }

    /// Resolve `key` with provenance, falling back to `default`.
    pub fn resolve_or(&self, key: &str, default: &str) -> ResolvedValue {
        self.resolve_with_source(key).unwrap_or_else(|| ResolvedValue {
            key: key.to_string(),
            value: default.to_string(),
            source: ValueSource::Default,
        })
    }

    /// Resolve `key`, falling back to `default`.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.resolve_or(key, default).value
    }

    /// Resolve the first key of `keys` that has a value.
    pub fn first_of(&self, keys: &[&str]) -> Option<ResolvedValue> {
        keys.iter().find_map(|key| self.resolve_with_source(key))
    }

    /// Resolve `key` or fail with a missing-setting error.
    pub fn require(&self, key: &str) -> Result<String> {
        self.get(key).ok_or_else(|| ConfigError::missing(key))
    }

    /// Resolve the first of `keys` or fail naming every alias tried.
    pub fn require_any(&self, keys: &[&str]) -> Result<String> {
        self.first_of(keys)
            .map(|r| r.value)
            .ok_or_else(|| ConfigError::missing_any(keys))
    }
}
