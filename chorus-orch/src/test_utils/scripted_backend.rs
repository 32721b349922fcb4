//! ScriptedBackend: replays canned chat and pull streams.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use chorus_types::{
    ChatBackend, ChatError, ChatMessage, ChatStream, InstallProgress, InstallStatus, ModelInfo,
    PullStream, StreamChunk,
};
use futures::{StreamExt, future, stream};

/// One scripted event in a chat stream.
#[derive(Debug, Clone)]
pub enum Step {
    /// A non-terminal chunk.
    Delta(String),
    /// The terminal chunk, with its own delta.
    Done(String),
    /// An upstream error record.
    Fail(String),
    /// Wait before the next step.
    Delay(Duration),
    /// Never produce anything again.
    Hang,
}

impl Step {
    /// A non-terminal chunk.
    pub fn delta(text: impl Into<String>) -> Self {
        Self::Delta(text.into())
    }

    /// The terminal chunk.
    pub fn done(text: impl Into<String>) -> Self {
        Self::Done(text.into())
    }

    /// An upstream error record.
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }

    /// Wait before the next step.
    pub fn delay(duration: Duration) -> Self {
        Self::Delay(duration)
    }

    /// Stall forever.
    pub fn hang() -> Self {
        Self::Hang
    }
}

/// One scripted event in a pull stream.
#[derive(Debug, Clone)]
pub enum PullStep {
    /// A progress record.
    Progress(InstallStatus, u8),
    /// An upstream error record.
    Fail(String),
    /// Wait before the next step.
    Delay(Duration),
}

impl PullStep {
    /// A progress record.
    pub fn progress(status: InstallStatus, percent: u8) -> Self {
        Self::Progress(status, percent)
    }

    /// An upstream error record.
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }

    /// Wait before the next step.
    pub fn delay(duration: Duration) -> Self {
        Self::Delay(duration)
    }
}

/// A [`ChatBackend`] that replays scripts instead of talking to a server.
///
/// Each call to [`ScriptedBackend::chat`] queues the script for one turn of
/// that model. A model with no script left answers with HTTP 404. Use
/// [`ScriptedBackend::chat_requests`] to inspect what was sent.
#[derive(Default)]
pub struct ScriptedBackend {
    chats: Mutex<HashMap<String, VecDeque<Vec<Step>>>>,
    pulls: Mutex<HashMap<String, VecDeque<Vec<PullStep>>>>,
    installed: Vec<ModelInfo>,
    listing_fails: bool,
    requests: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl ScriptedBackend {
    /// Create a backend with no scripts and no installed models.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the script for the next turn of `model`.
    pub fn chat(mut self, model: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.chats
            .get_mut()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(steps.into_iter().collect());
        self
    }

    /// Queue the script for the next pull of `model`.
    pub fn pull(mut self, model: &str, steps: impl IntoIterator<Item = PullStep>) -> Self {
        self.pulls
            .get_mut()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(steps.into_iter().collect());
        self
    }

    /// Models returned by the listing call.
    pub fn installed<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.installed = names
            .into_iter()
            .map(|name| ModelInfo {
                name: name.into(),
                size: 0,
                digest: String::new(),
                modified_at: String::new(),
                details: None,
            })
            .collect();
        self
    }

    /// Make the listing call fail with a connection error.
    pub fn listing_fails(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    /// Every chat request received, as `(model, messages)`.
    pub fn chat_requests(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.requests.lock().unwrap().clone()
    }
}

fn not_scripted(model: &str) -> ChatError {
    ChatError::Http {
        status: 404,
        body: format!("model '{model}' not found"),
    }
}

impl ChatBackend for ScriptedBackend {
    fn chat_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> impl Future<Output = Result<ChatStream, ChatError>> + Send {
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), messages.to_vec()));
        let script = self
            .chats
            .lock()
            .unwrap()
            .get_mut(model)
            .and_then(VecDeque::pop_front);

        let result = match script {
            None => Err(not_scripted(model)),
            Some(steps) => {
                let model = model.to_string();
                let chunks = stream::iter(steps)
                    .then(move |step| {
                        let model = model.clone();
                        async move {
                            match step {
                                Step::Delta(text) => Some(Ok(StreamChunk {
                                    model,
                                    content_delta: text,
                                    done: false,
                                })),
                                Step::Done(text) => Some(Ok(StreamChunk {
                                    model,
                                    content_delta: text,
                                    done: true,
                                })),
                                Step::Fail(message) => Some(Err(ChatError::Model { model, message })),
                                Step::Delay(duration) => {
                                    tokio::time::sleep(duration).await;
                                    None
                                }
                                Step::Hang => future::pending().await,
                            }
                        }
                    })
                    .filter_map(future::ready);
                Ok(Box::pin(chunks) as ChatStream)
            }
        };
        future::ready(result)
    }

    fn pull(&self, model: &str) -> impl Future<Output = Result<PullStream, ChatError>> + Send {
        let script = self
            .pulls
            .lock()
            .unwrap()
            .get_mut(model)
            .and_then(VecDeque::pop_front);

        let result = match script {
            None => Err(not_scripted(model)),
            Some(steps) => {
                let model = model.to_string();
                let progress = stream::iter(steps)
                    .then(move |step| {
                        let model = model.clone();
                        async move {
                            match step {
                                PullStep::Progress(status, percent) => {
                                    Some(Ok(InstallProgress::new(model, status, percent)))
                                }
                                PullStep::Fail(message) => {
                                    Some(Err(ChatError::Model { model, message }))
                                }
                                PullStep::Delay(duration) => {
                                    tokio::time::sleep(duration).await;
                                    None
                                }
                            }
                        }
                    })
                    .filter_map(future::ready);
                Ok(Box::pin(progress) as PullStream)
            }
        };
        future::ready(result)
    }

    fn list_models(&self) -> impl Future<Output = Result<Vec<ModelInfo>, ChatError>> + Send {
        let result = if self.listing_fails {
            Err(ChatError::Connection("connection refused".into()))
        } else {
            Ok(self.installed.clone())
        };
        future::ready(result)
    }
}
