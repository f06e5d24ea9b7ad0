//! Authenticating request pipeline.
//!
//! Every request passing through [`AuthenticatingTransport`] gets a fresh
//! `Authorization: Bearer <token>` header for the agent scope before it is
//! forwarded to the wrapped transport. When no token can be acquired the
//! request is never forwarded.

use std::sync::Arc;

use async_trait::async_trait;
use copilot_config::ConnectionSettings;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Request, Response};
use tokio_util::sync::CancellationToken;

use crate::client::{AuthClient, SharedTokenProvider};
use crate::error::{AuthError, SendError};
use crate::oauth::AccessToken;
use crate::token_cache::CachingTokenProvider;
use crate::transport::{SharedTransport, Transport};

/// Transport that attaches a bearer token to each request.
#[derive(Debug, Clone)]
pub struct AuthenticatingTransport {
    provider: SharedTokenProvider,
    inner: SharedTransport,
    scope: String,
}

impl AuthenticatingTransport {
    pub fn new(provider: SharedTokenProvider, inner: SharedTransport, scope: impl Into<String>) -> Self {
        Self {
            provider,
            inner,
            scope: scope.into(),
        }
    }

    /// Build the standard pipeline for `settings`: a cached client for the
    /// configured flow in front of a plain reqwest client.
    pub fn from_settings(settings: &ConnectionSettings) -> Result<Self, AuthError> {
        let http = reqwest::Client::new();
        let scope = copilot_config::scope_from_settings(settings)?;
        let client = AuthClient::from_settings(settings, http.clone())?;

        tracing::info!(
            flow = client.flow_name(),
            scope = %scope,
            "Authenticating pipeline ready"
        );

        Ok(Self::new(
            Arc::new(CachingTokenProvider::new(client)),
            Arc::new(http),
            scope,
        ))
    }

    /// The scope requested for every send.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Attach a token to `request` and forward it.
    pub async fn send(&self, mut request: Request, cancel: &CancellationToken) -> Result<Response, SendError> {
        let token = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SendError::Cancelled),
            result = self.provider.access_token(&self.scope) => match result {
                Ok(token) => token,
                Err(e) => {
                    tracing::error!(category = e.category(), error = %e, "Failed to acquire access token");
                    return Err(SendError::Authentication(e));
                }
            },
        };

        request.headers_mut().insert(AUTHORIZATION, bearer(&token)?);

        tracing::debug!(method = %request.method(), url = %request.url(), "Sending authenticated request");
        self.inner.execute(request, cancel).await
    }
}

fn bearer(token: &AccessToken) -> Result<HeaderValue, SendError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.secret())).map_err(|_| {
        let e = AuthError::InvalidResponse("access token is not a valid header value".to_string());
        tracing::error!(category = e.category(), "Failed to attach access token");
        SendError::Authentication(e)
    })?;
    value.set_sensitive(true);
    Ok(value)
}

#[async_trait]
impl Transport for AuthenticatingTransport {
    async fn execute(&self, request: Request, cancel: &CancellationToken) -> Result<Response, SendError> {
        self.send(request, cancel).await
    }
}
