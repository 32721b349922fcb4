//! Error types for all chorus crates.

/// Errors from one model's chat or pull pipeline.
///
/// Every variant is scoped to a single model: it ends that model's current
/// turn (or install) and never aborts another model's stream.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The backend endpoint could not be reached.
    #[error("failed to connect to Ollama: {0}")]
    Connection(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// Response status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// One NDJSON line could not be decoded. Logged and skipped by the
    /// decoder, never yielded from a stream.
    #[error("stream parse error: {0}")]
    StreamParse(String),

    /// The backend reported an `error` field mid-stream.
    #[error("Model error: {message}")]
    Model {
        /// Model whose stream failed.
        model: String,
        /// Upstream error text.
        message: String,
    },

    /// The per-model deadline elapsed before the stream finished.
    #[error("Timeout: {model} took too long to respond (>{secs}s)")]
    Timeout {
        /// Model that timed out.
        model: String,
        /// The deadline in seconds.
        secs: u64,
    },

    /// The connection closed without a terminal record.
    #[error("stream for {model} ended before completion")]
    IncompleteStream {
        /// Model whose stream was cut short.
        model: String,
    },

    /// The turn was cancelled before the stream finished.
    #[error("cancelled")]
    Cancelled {
        /// Model whose stream was dropped.
        model: String,
    },

    /// A model name failed validation.
    #[error("invalid model name: {0}")]
    InvalidModelName(String),

    /// A stream for this model is already open.
    #[error("{0} is already in progress")]
    AlreadyRunning(String),
}

impl ChatError {
    /// Whether the error came from a deadline. Drives the "large models may
    /// need more time to load" hint in the UI.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the error ends the stream it was raised on. Only
    /// [`ChatError::StreamParse`] is recoverable.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::StreamParse(_))
    }
}

/// Hint shown next to a timeout error.
pub const TIMEOUT_HINT: &str =
    "Large models may need more time to load. Try again or select a smaller model.";

/// Errors from profile, template and export persistence.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Record not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// I/O error during a storage operation.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
