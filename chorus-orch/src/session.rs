//! Multi-model chat session: one user turn fanned out to every selected model.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chorus_types::{
    ChatBackend, ChatError, ChatEvent, ChatExport, ChatMessage, ChatObserver, ModelStatus,
    NoopObserver, Profile, Template,
};
use futures::StreamExt;
use futures::future::join_all;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::aggregator::Aggregator;
use crate::status::StatusMachine;
use crate::throttle::DEFAULT_THROTTLE_INTERVAL;

/// How one model's part of a turn ended.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Model the outcome belongs to.
    pub model: String,
    /// The appended assistant message, or the error that ended the stream.
    pub result: Result<ChatMessage, ChatError>,
}

struct ModelSlot {
    machine: StatusMachine,
    history: Vec<ChatMessage>,
}

impl ModelSlot {
    fn append(&mut self, message: ChatMessage, observer: &dyn ChatObserver) {
        observer.on_event(&ChatEvent::MessageAppended {
            model: self.machine.name().to_string(),
            message: message.clone(),
        });
        self.history.push(message);
    }
}

/// A conversation with several models at once.
///
/// Each selected model keeps its own append-only history. [`Session::submit`]
/// appends the user's message to every history before any stream opens, then
/// runs one pipeline per model concurrently on the current task. After that
/// point each pipeline is the only writer to its model's history, so no
/// locking is involved.
///
/// A failure in one model's pipeline ends only that model's turn.
///
/// # Example
///
/// ```no_run
/// use chorus_orch::{Session, TracingObserver};
/// use chorus_provider_ollama::Ollama;
///
/// # async fn run() {
/// let mut session = Session::new(Ollama::new(), ["llama3.2:3b", "phi3:mini"])
///     .observer(TracingObserver::new());
/// for outcome in session.submit("Why is the sky blue?").await {
///     println!("{}: {:?}", outcome.model, outcome.result.map(|m| m.content));
/// }
/// # }
/// ```
pub struct Session<B> {
    backend: B,
    observer: Arc<dyn ChatObserver>,
    slots: Vec<ModelSlot>,
    profile: Option<Profile>,
    template: Option<Template>,
    throttle_interval: Duration,
}

impl<B: ChatBackend> Session<B> {
    /// Start a session with the given models, in panel order.
    ///
    /// Repeated names are selected once.
    pub fn new<I, S>(backend: B, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut slots: Vec<ModelSlot> = Vec::new();
        for name in models {
            let name = name.into();
            if slots.iter().any(|s| s.machine.name() == name) {
                continue;
            }
            slots.push(ModelSlot {
                machine: StatusMachine::new(name),
                history: Vec::new(),
            });
        }
        Self {
            backend,
            observer: Arc::new(NoopObserver),
            slots,
            profile: None,
            template: None,
            throttle_interval: DEFAULT_THROTTLE_INTERVAL,
        }
    }

    /// Resume a saved conversation.
    ///
    /// Every model of the export is selected again, in its saved order,
    /// with its saved history. The saved profile and template become active.
    /// All models start idle.
    pub fn from_export(backend: B, export: ChatExport) -> Self {
        let ChatExport {
            id,
            profile,
            template,
            models,
            mut messages,
            ..
        } = export;
        let mut session = Self::new(backend, models);
        for slot in &mut session.slots {
            if let Some(history) = messages.remove(slot.machine.name()) {
                slot.history = history;
            }
        }
        session.profile = profile;
        session.template = template;
        tracing::debug!(export = %id, models = session.slots.len(), "chorus.session.restored");
        session
    }

    /// Send state-change events to `observer`.
    #[must_use]
    pub fn observer(mut self, observer: impl ChatObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Share an observer that is also used elsewhere (e.g. by an installer).
    #[must_use]
    pub fn shared_observer(mut self, observer: Arc<dyn ChatObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Prefix each new conversation with the profile's system prompt.
    #[must_use]
    pub fn profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Record the template the models were selected from.
    #[must_use]
    pub fn template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }

    /// Minimum spacing between streaming display updates per model.
    #[must_use]
    pub fn throttle_interval(mut self, interval: Duration) -> Self {
        self.throttle_interval = interval;
        self
    }

    /// The backend every model is served by.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Selected model names, in panel order.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.machine.name())
    }

    /// Current status of `model`.
    pub fn status(&self, model: &str) -> Option<&ModelStatus> {
        self.slot(model).map(|s| s.machine.status())
    }

    /// Current status of every model, in panel order.
    pub fn statuses(&self) -> Vec<ModelStatus> {
        self.slots
            .iter()
            .map(|s| s.machine.status().clone())
            .collect()
    }

    /// Conversation history of `model`.
    pub fn history(&self, model: &str) -> Option<&[ChatMessage]> {
        self.slot(model).map(|s| s.history.as_slice())
    }

    /// Active profile.
    pub fn active_profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Snapshot the conversation for saving.
    pub fn export(&self, name: impl Into<String>) -> ChatExport {
        ChatExport {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            timestamp: chrono::Utc::now(),
            profile: self.profile.clone(),
            template: self.template.clone(),
            models: self.models().map(str::to_string).collect(),
            messages: self
                .slots
                .iter()
                .map(|s| (s.machine.name().to_string(), s.history.clone()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    /// Send `text` to every selected model and wait for all replies.
    ///
    /// Blank input is ignored and yields no outcomes.
    pub async fn submit(&mut self, text: &str) -> Vec<TurnOutcome> {
        self.submit_cancellable(text, &CancellationToken::new()).await
    }

    /// Like [`Session::submit`], but every open stream is dropped as soon as
    /// `cancel` fires.
    ///
    /// Cancelled models end in [`chorus_types::Status::Error`] and gain no
    /// assistant message.
    pub async fn submit_cancellable(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Vec<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        let observer = self.observer.as_ref();

        for slot in &mut self.slots {
            if slot.history.is_empty() {
                if let Some(profile) = &self.profile {
                    slot.append(ChatMessage::system(&profile.system_prompt), observer);
                }
            }
            slot.append(ChatMessage::user(text), observer);
        }

        let mut running = Vec::with_capacity(self.slots.len());
        for slot in &mut self.slots {
            if let Some(status) = slot.machine.begin(&slot.history) {
                observer.on_event(&ChatEvent::StatusChanged(status.clone()));
                running.push(slot);
            }
        }

        tracing::info!(models = running.len(), "chorus.turn.start");
        let backend = &self.backend;
        let interval = self.throttle_interval;
        let outcomes = join_all(
            running
                .into_iter()
                .map(|slot| run_model(backend, observer, slot, interval, cancel)),
        )
        .await;

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        tracing::info!(models = outcomes.len(), failed, "chorus.turn.done");
        outcomes
    }

    fn slot(&self, model: &str) -> Option<&ModelSlot> {
        self.slots.iter().find(|s| s.machine.name() == model)
    }
}

async fn run_model<B: ChatBackend>(
    backend: &B,
    observer: &dyn ChatObserver,
    slot: &mut ModelSlot,
    interval: Duration,
    cancel: &CancellationToken,
) -> TurnOutcome {
    let model = slot.machine.name().to_string();
    let started = Instant::now();
    let result = stream_reply(backend, observer, &model, &slot.history, interval, cancel).await;

    match &result {
        Ok(message) => {
            slot.append(message.clone(), observer);
            if let Some(status) = slot.machine.complete(started.elapsed()) {
                observer.on_event(&ChatEvent::StatusChanged(status.clone()));
            }
        }
        Err(err) => {
            tracing::debug!(model = %model, error = %err, "chorus.turn.model_failed");
            if let Some(status) = slot.machine.fail(err) {
                observer.on_event(&ChatEvent::StatusChanged(status.clone()));
            }
        }
    }

    TurnOutcome { model, result }
}

/// Drive one model's stream to its terminal chunk.
///
/// Never touches history; the caller appends the returned message.
async fn stream_reply<B: ChatBackend>(
    backend: &B,
    observer: &dyn ChatObserver,
    model: &str,
    history: &[ChatMessage],
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<ChatMessage, ChatError> {
    let cancelled = || ChatError::Cancelled {
        model: model.to_string(),
    };
    let emit = |content: String| {
        observer.on_event(&ChatEvent::StreamingUpdate {
            model: model.to_string(),
            content,
        });
    };

    let mut stream = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(cancelled()),
        opened = backend.chat_stream(model, history) => opened?,
    };

    let mut aggregator = Aggregator::new(interval, Instant::now());
    loop {
        let deadline = aggregator.deadline();
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                aggregator.abort();
                return Err(cancelled());
            }
            () = sleep_until(deadline) => {
                if let Some(content) = aggregator.fire(Instant::now()) {
                    emit(content);
                }
            }
            next = stream.next() => match next {
                Some(Ok(chunk)) if chunk.done => {
                    let finished = aggregator.finish(&chunk.content_delta);
                    if let Some(content) = finished.update {
                        emit(content);
                    }
                    return Ok(finished.message);
                }
                Some(Ok(chunk)) => {
                    if let Some(content) = aggregator.push(&chunk.content_delta, Instant::now()) {
                        emit(content);
                    }
                }
                Some(Err(err)) => {
                    aggregator.abort();
                    return Err(err);
                }
                None => {
                    aggregator.abort();
                    return Err(ChatError::IncompleteStream {
                        model: model.to_string(),
                    });
                }
            },
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
