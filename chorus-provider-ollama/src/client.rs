//! Ollama API client struct and builder.

use std::future::Future;
use std::time::Duration;

use chorus_types::{
    ChatBackend, ChatError, ChatMessage, ChatStream, ModelInfo, PullStream,
};
use tokio::time::Instant;

use crate::error::{map_http_status, map_reqwest_error};
use crate::ndjson::decode_stream;
use crate::pull::pull_progress;
use crate::streaming::chat_chunks;
use crate::timeout::timeout_for_model;
use crate::types::{ChatRecord, ChatRequest, PullRecord, PullRequest, TagsResponse};

/// Default Ollama API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Client for a local Ollama server.
///
/// Implements [`ChatBackend`] for use by the chorus orchestrator.
///
/// # Example
///
/// ```no_run
/// use chorus_provider_ollama::Ollama;
///
/// let client = Ollama::new().base_url("http://localhost:11434");
/// ```
#[derive(Debug, Clone)]
pub struct Ollama {
    /// API base URL (override for testing or remote Ollama instances).
    pub(crate) base_url: String,
    /// Fixed chat deadline. `None` picks one per model from its name.
    pub(crate) chat_timeout: Option<Duration>,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl Ollama {
    /// Create a new client pointed at `http://localhost:11434`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            chat_timeout: None,
            client: reqwest::Client::new(),
        }
    }

    /// Override the API base URL.
    ///
    /// A trailing slash is ignored.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Use one chat deadline for every model instead of the size classifier.
    #[must_use]
    pub fn chat_timeout(mut self, timeout: Duration) -> Self {
        self.chat_timeout = Some(timeout);
        self
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots, ...).
    #[must_use]
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Deadline applied to a chat request for `model`.
    #[must_use]
    pub fn timeout_for(&self, model: &str) -> Duration {
        self.chat_timeout.unwrap_or_else(|| timeout_for_model(model))
    }

    pub(crate) fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    pub(crate) fn pull_url(&self) -> String {
        format!("{}/api/pull", self.base_url)
    }

    pub(crate) fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url)
    }

    /// Whether the server answers the listing endpoint with a 2xx.
    pub async fn check_connection(&self) -> bool {
        match self.client.get(self.tags_url()).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::debug!(error = %err, "chorus.ollama.unreachable");
                false
            }
        }
    }

    async fn post_streaming(
        &self,
        url: String,
        body: &impl serde::Serialize,
    ) -> Result<reqwest::Response, ChatError> {
        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.map_err(map_reqwest_error)?;
            return Err(map_http_status(status, &body_text));
        }
        Ok(response)
    }
}

impl Default for Ollama {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatBackend for Ollama {
    /// Send a streaming chat request.
    ///
    /// The deadline starts now and covers connecting as well as streaming.
    fn chat_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> impl Future<Output = Result<ChatStream, ChatError>> + Send {
        let model = model.to_string();
        let body_messages: Vec<_> = messages.iter().map(ChatMessage::to_wire).collect();
        let bound = self.timeout_for(&model);
        let url = self.chat_url();
        let this = self.clone();

        async move {
            let deadline = Instant::now() + bound;
            let sent = {
                let body = ChatRequest {
                    model: &model,
                    messages: body_messages,
                    stream: true,
                };
                tracing::debug!(
                    url = %url,
                    model = %model,
                    messages = body.messages.len(),
                    timeout_secs = bound.as_secs(),
                    "chorus.chat.start"
                );
                tokio::time::timeout_at(deadline, this.post_streaming(url, &body)).await
            };

            let response = match sent {
                Ok(response) => response?,
                Err(_) => {
                    return Err(ChatError::Timeout {
                        model,
                        secs: bound.as_secs(),
                    });
                }
            };

            let records = decode_stream::<ChatRecord, _>(response.bytes_stream());
            Ok(chat_chunks(model, records, deadline, bound))
        }
    }

    fn pull(&self, model: &str) -> impl Future<Output = Result<PullStream, ChatError>> + Send {
        let model = model.to_string();
        let url = self.pull_url();
        let this = self.clone();

        async move {
            tracing::debug!(url = %url, model = %model, "chorus.pull.start");
            let response = {
                let body = PullRequest {
                    name: &model,
                    stream: true,
                };
                this.post_streaming(url, &body).await?
            };
            let records = decode_stream::<PullRecord, _>(response.bytes_stream());
            Ok(pull_progress(model, records))
        }
    }

    fn list_models(&self) -> impl Future<Output = Result<Vec<ModelInfo>, ChatError>> + Send {
        let url = self.tags_url();
        let client = self.client.clone();

        async move {
            let response = client.get(&url).send().await.map_err(map_reqwest_error)?;
            let status = response.status();
            let text = response.text().await.map_err(map_reqwest_error)?;
            if !status.is_success() {
                return Err(map_http_status(status, &text));
            }
            let tags: TagsResponse = serde_json::from_str(&text)
                .map_err(|e| ChatError::StreamParse(format!("invalid model listing: {e}")))?;
            Ok(tags.models)
        }
    }
}
