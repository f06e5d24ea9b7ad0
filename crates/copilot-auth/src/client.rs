//! Authentication clients and the [`TokenProvider`] seam.

use std::sync::Arc;

use async_trait::async_trait;
use copilot_config::{AuthFlow, ConnectionSettings};
use reqwest::Client;
use url::Url;

use crate::error::Result;
use crate::oauth::{AccessToken, Authority, Grant, request_token};

// ============================================================================
// TokenProvider Trait
// ============================================================================

/// Source of access tokens for a scope.
#[async_trait]
pub trait TokenProvider: Send + Sync + std::fmt::Debug {
    /// Get an access token for `scope`.
    async fn access_token(&self, scope: &str) -> Result<AccessToken>;
}

/// Shared token provider reference.
pub type SharedTokenProvider = Arc<dyn TokenProvider>;

#[async_trait]
impl<T: TokenProvider + ?Sized> TokenProvider for Arc<T> {
    async fn access_token(&self, scope: &str) -> Result<AccessToken> {
        (**self).access_token(scope).await
    }
}

// ============================================================================
// ConfidentialClient
// ============================================================================

/// Application identity holding a client secret.
#[derive(Clone)]
pub struct ConfidentialClient {
    client_id: String,
    client_secret: String,
    token_endpoint: Url,
    http: Client,
}

impl ConfidentialClient {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        authority: &Authority,
        http: Client,
    ) -> Result<Self> {
        Ok(Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_endpoint: authority.token_endpoint()?,
            http,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Acquire an app-only token with the client-credentials grant.
    pub async fn acquire_token_for_client(&self, scope: &str) -> Result<AccessToken> {
        request_token(
            &self.http,
            &self.token_endpoint,
            &self.client_id,
            Grant::ClientCredentials {
                client_secret: &self.client_secret,
            },
            scope,
        )
        .await
    }
}

impl std::fmt::Debug for ConfidentialClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfidentialClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_endpoint", &self.token_endpoint.as_str())
            .finish()
    }
}

// ============================================================================
// PublicClient
// ============================================================================

/// Application identity without a secret, acting for a user.
#[derive(Debug, Clone)]
pub struct PublicClient {
    client_id: String,
    token_endpoint: Url,
    http: Client,
}

impl PublicClient {
    pub fn new(client_id: impl Into<String>, authority: &Authority, http: Client) -> Result<Self> {
        Ok(Self {
            client_id: client_id.into(),
            token_endpoint: authority.token_endpoint()?,
            http,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Acquire a delegated token with the resource-owner password grant.
    pub async fn acquire_token_by_username_password(
        &self,
        scope: &str,
        username: &str,
        password: &str,
    ) -> Result<AccessToken> {
        request_token(
            &self.http,
            &self.token_endpoint,
            &self.client_id,
            Grant::Password { username, password },
            scope,
        )
        .await
    }
}

// ============================================================================
// AuthClient
// ============================================================================

/// The client for the configured flow, built once from settings.
#[derive(Clone)]
pub enum AuthClient {
    Confidential(ConfidentialClient),
    Public {
        client: PublicClient,
        username: String,
        password: String,
    },
}

impl AuthClient {
    /// Build the client matching `settings.auth`.
    pub fn from_settings(settings: &ConnectionSettings, http: Client) -> Result<Self> {
        let authority = Authority::from_settings(settings)?;
        let client = match &settings.auth {
            AuthFlow::ClientCredentials { client_secret } => AuthClient::Confidential(
                ConfidentialClient::new(&settings.app_client_id, client_secret, &authority, http)?,
            ),
            AuthFlow::UsernamePassword { username, password } => AuthClient::Public {
                client: PublicClient::new(&settings.app_client_id, &authority, http)?,
                username: username.clone(),
                password: password.clone(),
            },
        };

        tracing::debug!(
            flow = client.flow_name(),
            tenant = authority.tenant(),
            client_id = client.client_id(),
            "Authentication client created"
        );
        Ok(client)
    }

    pub fn flow_name(&self) -> &'static str {
        match self {
            AuthClient::Confidential(_) => "client_credentials",
            AuthClient::Public { .. } => "password",
        }
    }

    pub fn client_id(&self) -> &str {
        match self {
            AuthClient::Confidential(c) => c.client_id(),
            AuthClient::Public { client, .. } => client.client_id(),
        }
    }
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthClient::Confidential(c) => f.debug_tuple("Confidential").field(c).finish(),
            AuthClient::Public {
                client, username, ..
            } => f
                .debug_struct("Public")
                .field("client", client)
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[async_trait]
impl TokenProvider for AuthClient {
    async fn access_token(&self, scope: &str) -> Result<AccessToken> {
        match self {
            AuthClient::Confidential(client) => client.acquire_token_for_client(scope).await,
            AuthClient::Public {
                client,
                username,
                password,
            } => {
                client
                    .acquire_token_by_username_password(scope, username, password)
                    .await
            }
        }
    }
}
