//! Seams between the orchestration core and its collaborators.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::{ChatError, StorageError};
use crate::event::ChatEvent;
use crate::model_name::check_model_name;
use crate::types::{ChatMessage, InstallProgress, ModelInfo, ModelNameCheck, StreamChunk};

/// Ordered stream of chat chunks for one model and one turn.
///
/// Ends after the chunk with `done == true` or after the first `Err`.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, ChatError>> + Send>>;

/// Ordered stream of pull progress for one model.
///
/// Ends after a [`crate::InstallStatus::Completed`] record or after the first `Err`.
pub type PullStream = Pin<Box<dyn Stream<Item = Result<InstallProgress, ChatError>> + Send>>;

/// A locally hosted model server.
///
/// Implemented by the Ollama client; the orchestrator only sees this trait.
pub trait ChatBackend: Send + Sync {
    /// Open one streaming chat request for `model` over `messages`.
    ///
    /// Timestamps are stripped before the history goes on the wire.
    fn chat_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> impl Future<Output = Result<ChatStream, ChatError>> + Send;

    /// Open one streaming pull (download) request for `model`.
    fn pull(&self, model: &str) -> impl Future<Output = Result<PullStream, ChatError>> + Send;

    /// List locally installed models.
    fn list_models(&self) -> impl Future<Output = Result<Vec<ModelInfo>, ChatError>> + Send;

    /// Check a model name before pulling it.
    ///
    /// Builds suggestions from [`ChatBackend::list_models`], so this fails
    /// whenever the listing fails. Callers may treat that failure as
    /// non-fatal and let the pull report the real problem.
    fn validate_model_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ModelNameCheck, ChatError>> + Send {
        async move {
            let installed = self.list_models().await?;
            Ok(check_model_name(name, &installed))
        }
    }
}

/// Receives state-change events from the orchestration core.
///
/// Called synchronously from the emitting task; implementations must not
/// block.
pub trait ChatObserver: Send + Sync {
    /// Handle one event.
    fn on_event(&self, event: &ChatEvent);
}

impl<F> ChatObserver for F
where
    F: Fn(&ChatEvent) + Send + Sync,
{
    fn on_event(&self, event: &ChatEvent) {
        self(event)
    }
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ChatObserver for NoopObserver {
    fn on_event(&self, _event: &ChatEvent) {}
}

/// Opaque keyed persistence for user-managed records (profiles, templates).
///
/// Identifiers are generated by the store on create.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Stored record type.
    type Record: Send;
    /// User-supplied fields for a new record.
    type Draft: Send;

    /// All records, built-ins first.
    async fn list(&self) -> Result<Vec<Self::Record>, StorageError>;

    /// Look up one record by id.
    async fn get(&self, id: &str) -> Result<Option<Self::Record>, StorageError>;

    /// Store a new record and return it with its generated id.
    async fn create(&self, draft: Self::Draft) -> Result<Self::Record, StorageError>;

    /// Delete a record. Returns `false` when nothing was removed (unknown id
    /// or a built-in record).
    async fn delete(&self, id: &str) -> Result<bool, StorageError>;
}
