//! Events emitted from the orchestration core to the UI shell.

use crate::types::{ChatMessage, InstallProgress, ModelStatus};

/// State change observed by the UI shell.
///
/// Events for one model arrive in the order they happened. No ordering is
/// promised across models.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A model moved to a new lifecycle state.
    StatusChanged(ModelStatus),
    /// Throttled preview of the reply being streamed, with thinking spans
    /// removed.
    StreamingUpdate {
        /// Model producing the reply.
        model: String,
        /// Display content so far.
        content: String,
    },
    /// A message was appended to a model's history.
    MessageAppended {
        /// History the message was appended to.
        model: String,
        /// The appended message.
        message: ChatMessage,
    },
    /// Progress of a model download.
    InstallProgress(InstallProgress),
}

impl ChatEvent {
    /// Name of the model the event concerns.
    #[must_use]
    pub fn model(&self) -> &str {
        match self {
            ChatEvent::StatusChanged(status) => &status.name,
            ChatEvent::StreamingUpdate { model, .. } => model,
            ChatEvent::MessageAppended { model, .. } => model,
            ChatEvent::InstallProgress(progress) => &progress.model,
        }
    }
}
