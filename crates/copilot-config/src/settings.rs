//! Connection settings for a Copilot Studio agent.
//!
//! Settings are validated once at construction and never mutated. The
//! authentication flow is a tagged variant, so the service-to-service flow
//! cannot exist without a client secret and the interactive flow cannot exist
//! without a username and password.

use url::Url;

use crate::cloud::{AgentType, PowerPlatformCloud};
use crate::error::{ConfigError, Result};
use crate::keys;
use crate::resolver::ConfigResolver;

/// How the pipeline obtains tokens.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthFlow {
    /// OAuth2 client-credentials grant (service-to-service).
    ClientCredentials { client_secret: String },
    /// OAuth2 resource-owner-password grant (interactive user).
    UsernamePassword { username: String, password: String },
}

impl AuthFlow {
    /// Whether this is the service-to-service flow.
    pub fn is_s2s(&self) -> bool {
        matches!(self, AuthFlow::ClientCredentials { .. })
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            AuthFlow::ClientCredentials { .. } => "client_credentials",
            AuthFlow::UsernamePassword { .. } => "password",
        }
    }
}

impl std::fmt::Debug for AuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthFlow::ClientCredentials { .. } => f
                .debug_struct("ClientCredentials")
                .field("client_secret", &"<redacted>")
                .finish(),
            AuthFlow::UsernamePassword { username, .. } => f
                .debug_struct("UsernamePassword")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Everything needed to authenticate and address one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub environment_id: String,
    /// Agent schema name.
    pub schema_name: String,
    pub tenant_id: String,
    pub app_client_id: String,
    pub auth: AuthFlow,
    pub cloud: PowerPlatformCloud,
    pub agent_type: AgentType,
    /// Bypasses environment-based addressing when set.
    pub direct_connect_url: Option<Url>,
    /// Service endpoint; supplies the API host for [`PowerPlatformCloud::Other`].
    pub endpoint: Url,
    /// Overrides the cloud's Entra ID authority host.
    pub authority_host: Option<Url>,
}

impl ConnectionSettings {
    /// Start building settings.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Whether the service-to-service flow is selected.
    pub fn use_s2s_connection(&self) -> bool {
        self.auth.is_s2s()
    }

    /// Effective authority host (override or cloud default).
    pub fn authority_host(&self) -> Result<Url> {
        match &self.authority_host {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse(self.cloud.authority_host())?),
        }
    }

    /// Build settings from well-known keys.
    ///
    /// Required keys fail with [`ConfigError::MissingSetting`] before any
    /// network activity; a service-to-service flow without a client secret
    /// fails with [`ConfigError::InvalidSettingsCombination`]. The flow comes
    /// from `COPILOT_STUDIO_USE_S2S` (interactive when unset).
    pub fn from_resolver(resolver: &ConfigResolver) -> Result<Self> {
        let use_s2s = match resolver.get(keys::USE_S2S) {
            Some(raw) => parse_bool(keys::USE_S2S, &raw)?,
            None => false,
        };
        Self::from_resolver_with_flow(resolver, use_s2s)
    }

    /// Build settings from well-known keys with an explicit flow choice.
    pub fn from_resolver_with_flow(resolver: &ConfigResolver, use_s2s: bool) -> Result<Self> {
        let tenant_id = resolver.require_any(keys::TENANT_ID)?;

        let mut builder = Self::builder().tenant_id(tenant_id).use_s2s(use_s2s);

        if let Some(client_id) = resolver.first_of(keys::APP_CLIENT_ID) {
            tracing::debug!(source = %client_id.source, "Resolved application id");
            builder = builder.app_client_id(client_id.value);
        }

        if use_s2s {
            if let Some(secret) = resolver.first_of(keys::APP_CLIENT_SECRET) {
                builder = builder.client_secret(secret.value);
            }
        } else {
            builder = builder
                .username(resolver.require(keys::USERNAME)?)
                .password(resolver.require(keys::PASSWORD)?);
        }

        let environment_id = resolver.require(keys::ENVIRONMENT_ID)?;
        let agent = resolver.resolve_or(keys::AGENT_ID, keys::DEFAULT_AGENT_ID);
        tracing::debug!(schema_name = %agent.value, source = %agent.source, "Resolved agent");

        builder = builder
            .environment_id(environment_id)
            .schema_name(agent.value)
            .endpoint(resolver.get_or(keys::ENDPOINT, keys::DEFAULT_ENDPOINT));

        if let Some(raw) = resolver.get(keys::CLOUD) {
            let cloud = raw
                .parse::<PowerPlatformCloud>()
                .map_err(|reason| ConfigError::invalid(keys::CLOUD, &raw, reason))?;
            builder = builder.cloud(cloud);
        }

        if let Some(raw) = resolver.get(keys::AGENT_TYPE) {
            let agent_type = raw
                .parse::<AgentType>()
                .map_err(|reason| ConfigError::invalid(keys::AGENT_TYPE, &raw, reason))?;
            builder = builder.agent_type(agent_type);
        }

        if let Some(url) = resolver.get(keys::DIRECT_CONNECT_URL) {
            builder = builder.direct_connect_url(url);
        }

        if let Some(url) = resolver.get(keys::AUTHORITY_HOST) {
            builder = builder.authority_host(url);
        }

        builder.build()
    }
}

/// Builder for [`ConnectionSettings`].
///
/// Mirrors the flat shape of the usual configuration sources (a boolean flow
/// flag plus optional credentials); [`SettingsBuilder::build`] turns it into
/// the validated, tagged form.
#[derive(Debug, Default, Clone)]
pub struct SettingsBuilder {
    environment_id: Option<String>,
    schema_name: Option<String>,
    tenant_id: Option<String>,
    app_client_id: Option<String>,
    use_s2s: bool,
    client_secret: Option<String>,
    username: Option<String>,
    password: Option<String>,
    cloud: PowerPlatformCloud,
    agent_type: AgentType,
    direct_connect_url: Option<String>,
    endpoint: Option<String>,
    authority_host: Option<String>,
}

impl SettingsBuilder {
    pub fn environment_id(mut self, id: impl Into<String>) -> Self {
        self.environment_id = Some(id.into());
        self
    }

    pub fn schema_name(mut self, name: impl Into<String>) -> Self {
        self.schema_name = Some(name.into());
        self
    }

    pub fn tenant_id(mut self, id: impl Into<String>) -> Self {
        self.tenant_id = Some(id.into());
        self
    }

    pub fn app_client_id(mut self, id: impl Into<String>) -> Self {
        self.app_client_id = Some(id.into());
        self
    }

    /// Select the service-to-service flow (`true`) or the interactive flow.
    pub fn use_s2s(mut self, use_s2s: bool) -> Self {
        self.use_s2s = use_s2s;
        self
    }

    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn cloud(mut self, cloud: PowerPlatformCloud) -> Self {
        self.cloud = cloud;
        self
    }

    pub fn agent_type(mut self, agent_type: AgentType) -> Self {
        self.agent_type = agent_type;
        self
    }

    pub fn direct_connect_url(mut self, url: impl Into<String>) -> Self {
        self.direct_connect_url = Some(url.into());
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    pub fn authority_host(mut self, url: impl Into<String>) -> Self {
        self.authority_host = Some(url.into());
        self
    }

    /// Validate and build the settings.
    pub fn build(self) -> Result<ConnectionSettings> {
        let auth = if self.use_s2s {
            match non_empty(self.client_secret) {
                Some(client_secret) => AuthFlow::ClientCredentials { client_secret },
                None => {
                    return Err(ConfigError::InvalidSettingsCombination(format!(
                        "service-to-service connection requires a client secret ({})",
                        keys::APP_CLIENT_SECRET.join(" or ")
                    )));
                }
            }
        } else {
            match (non_empty(self.username), non_empty(self.password)) {
                (Some(username), Some(password)) => AuthFlow::UsernamePassword { username, password },
                _ => {
                    return Err(ConfigError::InvalidSettingsCombination(
                        "username/password connection requires both a username and a password"
                            .to_string(),
                    ));
                }
            }
        };

        let tenant_id = non_empty(self.tenant_id).ok_or_else(|| ConfigError::missing("tenant_id"))?;
        let environment_id = non_empty(self.environment_id)
            .ok_or_else(|| ConfigError::missing("environment_id"))?;
        let schema_name =
            non_empty(self.schema_name).ok_or_else(|| ConfigError::missing("schema_name"))?;

        let app_client_id = match non_empty(self.app_client_id) {
            Some(id) => id,
            None if !auth.is_s2s() => keys::POWER_PLATFORM_CLI_CLIENT_ID.to_string(),
            None => return Err(ConfigError::missing_any(keys::APP_CLIENT_ID)),
        };

        let endpoint = parse_url(
            keys::ENDPOINT,
            self.endpoint.as_deref().unwrap_or(keys::DEFAULT_ENDPOINT),
        )?;
        let direct_connect_url = non_empty(self.direct_connect_url)
            .map(|u| parse_url(keys::DIRECT_CONNECT_URL, &u))
            .transpose()?;
        let authority_host = non_empty(self.authority_host)
            .map(|u| parse_url(keys::AUTHORITY_HOST, &u))
            .transpose()?;

        Ok(ConnectionSettings {
            environment_id,
            schema_name,
            tenant_id,
            app_client_id,
            auth,
            cloud: self.cloud,
            agent_type: self.agent_type,
            direct_connect_url,
            endpoint,
            authority_host,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_url(key: &str, raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::invalid(key, raw, e.to_string()))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, raw, "expected true or false")),
    }
}
