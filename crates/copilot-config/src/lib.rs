//! Configuration for Copilot Studio agent clients.
//!
//! Provides:
//! - Credential resolution from an environment snapshot, falling back to the
//!   azd settings store (`.azure/<env>/.env`) found by walking up from a
//!   start directory
//! - Validated [`ConnectionSettings`] with the authentication flow as a
//!   tagged variant
//! - Power Platform cloud addressing: the OAuth scope and the conversation
//!   URLs for an agent

pub mod cloud;
pub mod env_file;
pub mod environment;
pub mod error;
pub mod keys;
pub mod resolver;
pub mod settings;

pub use cloud::{AgentType, PowerPlatformCloud};
pub use environment::{API_VERSION, connection_url, scope_from_settings};
pub use error::{ConfigError, Result};
pub use resolver::{ConfigResolver, ResolvedValue, ValueSource};
pub use settings::{AuthFlow, ConnectionSettings, SettingsBuilder};
