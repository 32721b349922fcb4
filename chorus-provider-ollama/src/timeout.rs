//! Per-model deadline policy.
//!
//! Large models can take minutes to load before the first token arrives, so
//! the deadline for a chat request is picked from the size tag in the model
//! name.

use std::time::Duration;

/// Deadline for 24B/70B-class models.
pub const LARGE_MODEL_TIMEOUT: Duration = Duration::from_secs(300);
/// Deadline for 7B to 13B-class models.
pub const MEDIUM_MODEL_TIMEOUT: Duration = Duration::from_secs(180);
/// Deadline for everything else.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Pick the chat deadline for `model` from its name.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use chorus_provider_ollama::timeout_for_model;
///
/// assert_eq!(timeout_for_model("llama3.2:70b"), Duration::from_secs(300));
/// assert_eq!(timeout_for_model("qwen2.5:7b"), Duration::from_secs(180));
/// assert_eq!(timeout_for_model("phi3:mini"), Duration::from_secs(120));
/// ```
#[must_use]
pub fn timeout_for_model(model: &str) -> Duration {
    if ["70b", "24b"].iter().any(|tag| model.contains(tag)) {
        LARGE_MODEL_TIMEOUT
    } else if ["7b", "8b", "13b"].iter().any(|tag| model.contains(tag)) {
        MEDIUM_MODEL_TIMEOUT
    } else {
        DEFAULT_TIMEOUT
    }
}

/// Whether a model is large enough that the UI should warn about load time.
#[must_use]
pub fn is_large_model(model: &str) -> bool {
    timeout_for_model(model) == LARGE_MODEL_TIMEOUT
}
