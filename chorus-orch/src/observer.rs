//! Ready-made [`ChatObserver`] implementations.

use chorus_types::{ChatEvent, ChatObserver, InstallStatus, Status};
use tokio::sync::mpsc;

/// A [`ChatObserver`] that emits structured [`tracing`] events.
///
/// | Event | Level |
/// |-------|-------|
/// | StreamingUpdate, MessageAppended, InstallProgress (non-terminal) | `DEBUG` |
/// | StatusChanged, InstallProgress (terminal) | `INFO` |
/// | StatusChanged to `Error`, install `Error` | `WARN` |
///
/// # Example
///
/// ```
/// use chorus_orch::TracingObserver;
/// use chorus_types::{ChatEvent, ChatObserver, ModelStatus};
///
/// TracingObserver::new().on_event(&ChatEvent::StatusChanged(ModelStatus::idle("a")));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    /// Create a new `TracingObserver`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ChatObserver for TracingObserver {
    fn on_event(&self, event: &ChatEvent) {
        match event {
            ChatEvent::StatusChanged(status) => match status.status {
                Status::Error => tracing::warn!(
                    model = %status.name,
                    error = status.error.as_deref().unwrap_or_default(),
                    "chorus.model.error"
                ),
                Status::Ready => tracing::info!(
                    model = %status.name,
                    response_ms = status.response_time.map(|d| d.as_millis() as u64),
                    "chorus.model.ready"
                ),
                other => tracing::info!(model = %status.name, status = ?other, "chorus.model.status"),
            },
            ChatEvent::StreamingUpdate { model, content } => {
                tracing::debug!(model = %model, chars = content.chars().count(), "chorus.stream.update");
            }
            ChatEvent::MessageAppended { model, message } => {
                tracing::debug!(
                    model = %model,
                    role = message.role.as_str(),
                    chars = message.content.chars().count(),
                    "chorus.history.append"
                );
            }
            ChatEvent::InstallProgress(progress) => match progress.status {
                InstallStatus::Error => tracing::warn!(
                    model = %progress.model,
                    percent = progress.percent,
                    error = progress.error.as_deref().unwrap_or_default(),
                    "chorus.install.error"
                ),
                InstallStatus::Completed => {
                    tracing::info!(model = %progress.model, "chorus.install.completed");
                }
                other => tracing::debug!(
                    model = %progress.model,
                    status = ?other,
                    percent = progress.percent,
                    "chorus.install.progress"
                ),
            },
        }
    }
}

/// Forwards every event into an unbounded channel.
///
/// Lets a UI task consume events at its own pace. Events sent after the
/// receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ChatEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiver its events arrive on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ChatObserver for ChannelObserver {
    fn on_event(&self, event: &ChatEvent) {
        // A closed receiver means nobody is watching anymore.
        let _ = self.tx.send(event.clone());
    }
}

/// Fans each event out to several observers in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Box<dyn ChatObserver>>,
}

impl CompositeObserver {
    /// Create an empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer after the existing ones.
    #[must_use]
    pub fn with(mut self, observer: impl ChatObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }
}

impl ChatObserver for CompositeObserver {
    fn on_event(&self, event: &ChatEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}
