//! Per-model lifecycle tracking.

use std::time::Duration;

use chorus_types::{ChatError, ChatMessage, ModelStatus, Role, Status};

/// Whether a history ends in a user message that has no reply yet.
#[must_use]
pub fn awaiting_reply(history: &[ChatMessage]) -> bool {
    history.last().is_some_and(|m| m.role == Role::User)
}

/// Lifecycle of one selected model.
///
/// ```text
/// Idle | Ready | Error --begin--> Responding --complete--> Ready
///                                            --fail-----> Error
/// ```
///
/// At most one stream is open per model. Every transition that does not
/// match the diagram is refused and leaves the status untouched.
#[derive(Debug, Clone)]
pub struct StatusMachine {
    status: ModelStatus,
    stream_open: bool,
}

impl StatusMachine {
    /// A freshly selected, idle model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            status: ModelStatus::idle(name),
            stream_open: false,
        }
    }

    /// Current observable status.
    #[must_use]
    pub fn status(&self) -> &ModelStatus {
        &self.status
    }

    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.status.name
    }

    /// Whether a stream is currently open.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.stream_open
    }

    /// Move to `Responding` for a new turn.
    ///
    /// Refused when a stream is already open, when the current state does not
    /// accept a turn, or when `history` has no unanswered user message.
    pub fn begin(&mut self, history: &[ChatMessage]) -> Option<&ModelStatus> {
        if self.stream_open || !self.status.status.accepts_turn() || !awaiting_reply(history) {
            tracing::debug!(
                model = %self.status.name,
                status = ?self.status.status,
                stream_open = self.stream_open,
                "chorus.status.begin_refused"
            );
            return None;
        }
        self.stream_open = true;
        self.status.status = Status::Responding;
        self.status.error = None;
        self.status.response_time = None;
        Some(&self.status)
    }

    /// Close the stream after a clean terminal chunk.
    pub fn complete(&mut self, elapsed: Duration) -> Option<&ModelStatus> {
        if !self.stream_open {
            return None;
        }
        self.stream_open = false;
        self.status.status = Status::Ready;
        self.status.error = None;
        self.status.response_time = Some(elapsed);
        Some(&self.status)
    }

    /// Close the stream after a failure.
    pub fn fail(&mut self, error: &ChatError) -> Option<&ModelStatus> {
        if !self.stream_open {
            return None;
        }
        self.stream_open = false;
        self.status.status = Status::Error;
        self.status.error = Some(error.to_string());
        Some(&self.status)
    }
}
