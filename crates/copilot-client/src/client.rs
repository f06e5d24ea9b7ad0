//! Main client implementation.

use std::sync::Arc;

use copilot_auth::{AuthenticatingTransport, SharedTransport, Transport};
use copilot_config::{ConfigError, ConnectionSettings};
use parking_lot::Mutex;
use reqwest::header::{ACCEPT, HeaderValue};
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::conversation::{activity_stream, collect_answer};
use crate::error::{Error, Result};
use crate::types::{Activity, ExecuteTurnRequest, StartRequest};

/// Response header carrying the conversation id.
pub const CONVERSATION_ID_HEADER: &str = "x-ms-conversationid";

/// Copilot Studio agent client.
///
/// Every request goes through the configured [`copilot_auth::Transport`],
/// normally an [`AuthenticatingTransport`] that attaches the bearer token.
///
/// # Example
///
/// ```no_run
/// use copilot_client::{CopilotClient, collect_answer};
/// use copilot_config::{ConfigResolver, ConnectionSettings};
///
/// # async fn example() -> copilot_client::Result<()> {
/// let settings = ConnectionSettings::from_resolver(&ConfigResolver::from_process())?;
/// let client = CopilotClient::connect(settings)?;
///
/// collect_answer(client.start_conversation().await?).await?;
/// let answer = collect_answer(client.ask_question("How much is the Adventure Dining Table?").await?).await?;
/// println!("{answer}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CopilotClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
pub(crate) struct ClientInner {
    settings: ConnectionSettings,
    transport: SharedTransport,
    /// Builds requests only; sending goes through `transport`.
    http: reqwest::Client,
    cancel: CancellationToken,
    conversation_id: Mutex<Option<String>>,
}

impl ClientInner {
    /// Remember `id` unless a conversation id is already known.
    pub(crate) fn remember_conversation(&self, id: &str) {
        let mut current = self.conversation_id.lock();
        if current.is_none() {
            tracing::debug!(conversation_id = id, "Conversation started");
            *current = Some(id.to_string());
        }
    }
}

impl CopilotClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Client for `settings` behind the default authenticating pipeline.
    pub fn connect(settings: ConnectionSettings) -> Result<Self> {
        Self::builder().settings(settings).build()
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.inner.settings
    }

    /// Id of the current conversation, once started.
    pub fn conversation_id(&self) -> Option<String> {
        self.inner.conversation_id.lock().clone()
    }

    /// Token that cancels in-flight sends and streams.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Conversation
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a conversation and stream the agent's greeting activities.
    ///
    /// Any previously remembered conversation id is replaced.
    pub async fn start_conversation(
        &self,
    ) -> Result<impl Stream<Item = Result<Activity>> + Send + 'static> {
        let url = copilot_config::connection_url(&self.inner.settings, None)?;
        tracing::info!(agent = %self.inner.settings.schema_name, "Starting conversation");

        let response = self.post_stream(url, &StartRequest::default()).await?;
        *self.inner.conversation_id.lock() = None;
        if let Some(id) = response
            .headers()
            .get(CONVERSATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|id| !id.is_empty())
        {
            self.inner.remember_conversation(id);
        }

        Ok(activity_stream(response, Arc::clone(&self.inner), self.inner.cancel.clone()))
    }

    /// Ask `question` in the current conversation and stream the reply.
    pub async fn ask_question(
        &self,
        question: impl Into<String>,
    ) -> Result<impl Stream<Item = Result<Activity>> + Send + 'static> {
        let conversation_id = self.conversation_id().ok_or(Error::NoConversation)?;
        let url = copilot_config::connection_url(&self.inner.settings, Some(&conversation_id))?;

        let body = ExecuteTurnRequest {
            activity: Activity::message(question, conversation_id.as_str()),
        };
        tracing::debug!(conversation_id = %conversation_id, "Asking question");

        let response = self.post_stream(url, &body).await?;
        Ok(activity_stream(response, Arc::clone(&self.inner), self.inner.cancel.clone()))
    }

    /// Ask `question` and return the joined answer text, starting a
    /// conversation first when none is open.
    pub async fn ask(&self, question: impl Into<String>) -> Result<String> {
        if self.conversation_id().is_none() {
            let greeting = collect_answer(self.start_conversation().await?).await?;
            tracing::debug!(greeting = %greeting, "Conversation greeting");
        }
        collect_answer(self.ask_question(question).await?).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// POST `body` expecting an event stream (returns the response directly).
    async fn post_stream<B>(&self, url: Url, body: &B) -> Result<reqwest::Response>
    where
        B: serde::Serialize + ?Sized,
    {
        let request = self
            .inner
            .http
            .post(url)
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .json(body)
            .build()?;

        let response = self.inner.transport.execute(request, &self.inner.cancel).await?;

        if !response.status().is_success() {
            return Err(extract_error(response).await);
        }

        Ok(response)
    }
}

/// Extract an error from a failed response.
async fn extract_error(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        format!("HTTP {}", status)
    } else {
        body
    };

    tracing::warn!(status, "Agent request failed");
    match status {
        401 | 403 => Error::Auth(message),
        _ => Error::Api { status, message },
    }
}

/// Builder for creating a CopilotClient.
#[derive(Debug, Default)]
pub struct ClientBuilder {
    settings: Option<ConnectionSettings>,
    transport: Option<SharedTransport>,
    cancel: Option<CancellationToken>,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection settings.
    pub fn settings(mut self, settings: ConnectionSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Send through `transport` instead of the default authenticating pipeline.
    pub fn transport(mut self, transport: SharedTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Share a cancellation token with the caller.
    pub fn cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<CopilotClient> {
        let settings = self
            .settings
            .ok_or_else(|| Error::Config(ConfigError::missing("settings")))?;

        let transport: SharedTransport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(AuthenticatingTransport::from_settings(&settings)?),
        };

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("copilot-client/{}", env!("CARGO_PKG_VERSION")));
        let http = reqwest::Client::builder().user_agent(user_agent).build()?;

        Ok(CopilotClient {
            inner: Arc::new(ClientInner {
                settings,
                transport,
                http,
                cancel: self.cancel.unwrap_or_default(),
                conversation_id: Mutex::new(None),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ConnectionSettings {
        ConnectionSettings::builder()
            .environment_id("00000000-0000-0000-0000-000000000001")
            .schema_name("agent")
            .tenant_id("contoso")
            .username("u")
            .password("p")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_settings() {
        assert!(ClientBuilder::new().build().is_err());
    }

    #[test]
    fn test_connect_builds_default_pipeline() {
        let client = CopilotClient::connect(settings()).unwrap();
        assert_eq!(client.settings().schema_name, "agent");
        assert_eq!(client.conversation_id(), None);
    }

    #[tokio::test]
    async fn test_ask_without_conversation() {
        let client = CopilotClient::connect(settings()).unwrap();
        let err = client.ask_question("hello").await.err().unwrap();
        assert!(matches!(err, Error::NoConversation));
    }

    #[test]
    fn test_remember_conversation_keeps_first() {
        let client = CopilotClient::connect(settings()).unwrap();
        client.inner.remember_conversation("first");
        client.inner.remember_conversation("second");
        assert_eq!(client.conversation_id().as_deref(), Some("first"));
    }
}
