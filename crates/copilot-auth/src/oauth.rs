//! OAuth 2.0 token endpoint calls for Entra ID.
//!
//! Two grants are supported, both against the v2.0 endpoint
//! `<authority-host>/<tenant>/oauth2/v2.0/token`:
//! - `client_credentials` (confidential client, service-to-service)
//! - `password` (public client, resource-owner password credentials)

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::{AuthError, Result};

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// An Entra ID authority: host plus tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authority {
    host: Url,
    tenant: String,
}

impl Authority {
    pub fn new(host: Url, tenant: impl Into<String>) -> Self {
        Self {
            host,
            tenant: tenant.into(),
        }
    }

    /// Authority for the tenant and cloud in `settings`.
    pub fn from_settings(settings: &copilot_config::ConnectionSettings) -> Result<Self> {
        Ok(Self::new(settings.authority_host()?, settings.tenant_id.clone()))
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// The v2.0 token endpoint.
    pub fn token_endpoint(&self) -> Result<Url> {
        let mut url = self.host.clone();
        url.path_segments_mut()
            .map_err(|_| AuthError::Config(format!("authority host '{}' cannot be a base", self.host)))?
            .pop_if_empty()
            .extend([self.tenant.as_str(), "oauth2", "v2.0", "token"]);
        Ok(url)
    }
}

/// The grant to present to the token endpoint.
#[derive(Clone, Copy)]
pub enum Grant<'a> {
    ClientCredentials { client_secret: &'a str },
    Password { username: &'a str, password: &'a str },
}

impl Grant<'_> {
    pub fn grant_type(&self) -> &'static str {
        match self {
            Grant::ClientCredentials { .. } => "client_credentials",
            Grant::Password { .. } => "password",
        }
    }
}

/// An acquired access token.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
    expires_at: DateTime<Utc>,
    scope: String,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_at: DateTime<Utc>, scope: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
            scope: scope.into(),
        }
    }

    /// The raw token.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Whether the token expires within `buffer` from now.
    pub fn expires_within(&self, buffer: std::time::Duration) -> bool {
        let buffer = chrono::Duration::from_std(buffer).unwrap_or(chrono::Duration::MAX);
        match Utc::now().checked_add_signed(buffer) {
            Some(deadline) => deadline >= self.expires_at,
            None => true,
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Successful token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default, deserialize_with = "seconds")]
    expires_in: Option<u64>,
}

/// Error body returned by the token endpoint.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Accepts `expires_in` as a number or a numeric string.
fn seconds<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Request a token for `scope` from `endpoint`.
pub async fn request_token(
    http: &Client,
    endpoint: &Url,
    client_id: &str,
    grant: Grant<'_>,
    scope: &str,
) -> Result<AccessToken> {
    let mut form: Vec<(&str, &str)> = vec![
        ("grant_type", grant.grant_type()),
        ("client_id", client_id),
        ("scope", scope),
    ];
    match grant {
        Grant::ClientCredentials { client_secret } => {
            form.push(("client_secret", client_secret));
        }
        Grant::Password { username, password } => {
            form.push(("username", username));
            form.push(("password", password));
        }
    }

    tracing::debug!(
        endpoint = %endpoint,
        grant_type = grant.grant_type(),
        scope,
        "Requesting access token"
    );

    let response = http
        .post(endpoint.clone())
        .form(&form)
        .send()
        .await
        .map_err(|e| AuthError::Network(format!("Token request failed: {}", e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AuthError::Network(format!("Failed to read token response: {}", e)))?;

    if !status.is_success() {
        return Err(match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(err) => AuthError::TokenEndpoint {
                status: status.as_u16(),
                error: err.error,
                description: err.error_description.unwrap_or_default(),
            },
            Err(_) => AuthError::TokenEndpoint {
                status: status.as_u16(),
                error: "unknown_error".to_string(),
                description: body,
            },
        });
    }

    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| AuthError::InvalidResponse(format!("Failed to parse token response: {}", e)))?;

    if token.access_token.is_empty() {
        return Err(AuthError::InvalidResponse("No access token in response".to_string()));
    }
    if let Some(kind) = &token.token_type
        && !kind.eq_ignore_ascii_case("bearer")
    {
        return Err(AuthError::InvalidResponse(format!(
            "Unsupported token type '{}'",
            kind
        )));
    }

    let expires_in = token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
    let lifetime = i64::try_from(expires_in)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX);
    let expires_at = Utc::now()
        .checked_add_signed(lifetime)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    tracing::debug!(expires_in, "Access token obtained");
    Ok(AccessToken::new(token.access_token, expires_at, scope))
}
