#![deny(missing_docs)]
//! Ollama backend for chorus.
//!
//! Implements [`chorus_types::ChatBackend`] against a local Ollama server:
//! streaming chat over `/api/chat`, streaming pulls over `/api/pull`, and
//! model listing over `/api/tags`. Both streaming endpoints speak NDJSON and
//! share one [`NdjsonDecoder`].
//!
//! Chat requests carry a deadline picked from the model's size tag (see
//! [`timeout_for_model`]); exceeding it ends the stream with
//! [`chorus_types::ChatError::Timeout`].

mod client;
mod error;
pub mod ndjson;
mod pull;
mod streaming;
pub mod timeout;
mod types;

pub use client::{DEFAULT_BASE_URL, Ollama};
pub use ndjson::{NdjsonDecoder, decode_stream};
pub use timeout::{is_large_model, timeout_for_model};
