//! In-memory backend for testing orchestration.
//!
//! Available behind the `test-utils` feature flag.

mod scripted_backend;

pub use scripted_backend::{PullStep, ScriptedBackend, Step};
