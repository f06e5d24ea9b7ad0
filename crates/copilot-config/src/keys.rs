//! Well-known configuration keys.
//!
//! Alias lists are ordered by priority: the first key that resolves wins.

/// Tenant identifier aliases.
pub const TENANT_ID: &[&str] = &[
    "POWER_PLATFORM_TENANT_ID",
    "ARM_TENANT_ID",
    "AZURE_TENANT_ID",
];

/// Application (client) identifier aliases.
pub const APP_CLIENT_ID: &[&str] = &["TEST_CLIENT_ID", "AZURE_CLIENT_ID", "ARM_CLIENT_ID"];

/// Client secret aliases, used by the service-to-service flow.
pub const APP_CLIENT_SECRET: &[&str] = &["AZURE_CLIENT_SECRET", "ARM_CLIENT_SECRET"];

pub const USERNAME: &str = "POWER_PLATFORM_USERNAME";
pub const PASSWORD: &str = "POWER_PLATFORM_PASSWORD";
pub const ENVIRONMENT_ID: &str = "POWER_PLATFORM_ENVIRONMENT_ID";
pub const AGENT_ID: &str = "COPILOT_STUDIO_AGENT_ID";
pub const ENDPOINT: &str = "COPILOT_STUDIO_ENDPOINT";
pub const CLOUD: &str = "POWER_PLATFORM_CLOUD";
pub const USE_S2S: &str = "COPILOT_STUDIO_USE_S2S";
pub const AGENT_TYPE: &str = "COPILOT_STUDIO_AGENT_TYPE";
pub const DIRECT_CONNECT_URL: &str = "COPILOT_STUDIO_DIRECT_CONNECT_URL";
pub const AUTHORITY_HOST: &str = "AZURE_AUTHORITY_HOST";

/// Agent schema name used when none is configured.
pub const DEFAULT_AGENT_ID: &str = "crf6d_aiSearchConnectionExample";

/// Service endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.copilotstudio.microsoft.com";

/// Public client id of the Power Platform CLI, used for the interactive flow
/// when no application id is configured.
pub const POWER_PLATFORM_CLI_CLIENT_ID: &str = "51f81489-12ee-4a9e-aaae-a2591f45987d";
