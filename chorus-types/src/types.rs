//! Core message, status and catalog types.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role of a message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A human user.
    User,
    /// A model reply.
    Assistant,
    /// A system prompt, usually derived from a profile.
    System,
}

impl Role {
    /// Wire name of the role (`"user"`, `"assistant"`, `"system"`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// A message in one model's conversation history.
///
/// Messages are immutable once appended; a history only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author of the message.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user message.
    ///
    /// # Example
    ///
    /// ```
    /// use chorus_types::{ChatMessage, Role};
    /// let msg = ChatMessage::user("hi");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// The timestamp-free view of this message sent to a backend.
    #[must_use]
    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// A message as it appears in a chat request body: role and content only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Author of the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

/// Lifecycle state of one selected model.
///
/// `Loading` is reserved for connection establishment. `Idle` and `Ready`
/// are both valid entry points for a new turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Selected, never asked anything.
    #[default]
    Idle,
    /// Reserved.
    Loading,
    /// Finished its last turn cleanly.
    Ready,
    /// A stream is open for the current turn.
    Responding,
    /// The last turn failed.
    Error,
}

impl Status {
    /// Whether a new turn may move this model to [`Status::Responding`].
    #[must_use]
    pub fn accepts_turn(&self) -> bool {
        matches!(self, Status::Idle | Status::Ready | Status::Error)
    }
}

/// Observable status of one selected model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    /// Model name as known to the backend (e.g. `llama3.2:3b`).
    pub name: String,
    /// Current lifecycle state.
    pub status: Status,
    /// Human-readable error text when `status` is [`Status::Error`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time of the last clean turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<Duration>,
}

impl ModelStatus {
    /// A freshly selected, idle model.
    pub fn idle(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Idle,
            error: None,
            response_time: None,
        }
    }
}

/// One decoded chat record, reduced to what the aggregator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    /// Model that produced the chunk.
    pub model: String,
    /// Text appended by this record. May be empty.
    pub content_delta: String,
    /// Whether this is the terminal record of the stream.
    pub done: bool,
}

/// Phase of a model download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallStatus {
    /// Layers are being fetched.
    Downloading,
    /// Layers are being verified or written.
    Installing,
    /// The pull finished successfully. Terminal.
    Completed,
    /// The pull failed. Terminal.
    Error,
}

impl InstallStatus {
    /// Whether no further progress will follow.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, InstallStatus::Completed | InstallStatus::Error)
    }
}

/// Progress of one in-flight install request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallProgress {
    /// Model being pulled.
    pub model: String,
    /// Current phase.
    pub status: InstallStatus,
    /// Percentage in `0..=100`.
    pub percent: u8,
    /// Failure text when `status` is [`InstallStatus::Error`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstallProgress {
    /// Progress record in a non-error phase.
    pub fn new(model: impl Into<String>, status: InstallStatus, percent: u8) -> Self {
        Self {
            model: model.into(),
            status,
            percent,
            error: None,
        }
    }

    /// Terminal failure record.
    pub fn failed(model: impl Into<String>, percent: u8, error: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            status: InstallStatus::Error,
            percent,
            error: Some(error.into()),
        }
    }
}

/// A locally installed model, as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model name including tag.
    pub name: String,
    /// Size on disk in bytes.
    #[serde(default)]
    pub size: u64,
    /// Content digest.
    #[serde(default)]
    pub digest: String,
    /// Last modification time as reported by the backend.
    #[serde(default)]
    pub modified_at: String,
    /// Optional model metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ModelDetails>,
}

/// Optional metadata attached to a listed model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDetails {
    /// Weights format (e.g. `gguf`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Model family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    /// All families the model belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub families: Option<Vec<String>>,
    /// Human-readable parameter count (e.g. `7B`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_size: Option<String>,
    /// Quantization level (e.g. `Q4_0`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization_level: Option<String>,
}

/// Result of checking a model name before a pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelNameCheck {
    /// Whether the name is well formed.
    pub valid: bool,
    /// Installed model names that look like what the user meant.
    pub suggestions: Vec<String>,
}

/// A named system prompt applied to new conversations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Generated identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Prompt inserted as the first system message.
    pub system_prompt: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Shipped with the application; cannot be deleted.
    #[serde(default)]
    pub is_built_in: bool,
}

/// Fields supplied by the user when creating a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDraft {
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Prompt inserted as the first system message.
    pub system_prompt: String,
}

/// A named set of models to select together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Generated identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Models selected by this template.
    pub model_names: Vec<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Shipped with the application; cannot be deleted.
    #[serde(default)]
    pub is_built_in: bool,
}

/// Fields supplied by the user when creating a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDraft {
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Models selected by this template.
    pub model_names: Vec<String>,
}

/// A saved multi-model conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatExport {
    /// Generated identifier.
    pub id: String,
    /// User-supplied name.
    pub name: String,
    /// When the export was taken.
    pub timestamp: DateTime<Utc>,
    /// Profile active during the conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    /// Template the models were selected from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,
    /// Selected models, in panel order.
    pub models: Vec<String>,
    /// Per-model histories.
    pub messages: BTreeMap<String, Vec<ChatMessage>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn wire_message_drops_timestamp() {
        let msg = ChatMessage::user("hi");
        let wire = serde_json::to_value(msg.to_wire()).unwrap();
        assert_eq!(wire, serde_json::json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn responding_does_not_accept_turn() {
        assert!(Status::Idle.accepts_turn());
        assert!(Status::Ready.accepts_turn());
        assert!(Status::Error.accepts_turn());
        assert!(!Status::Responding.accepts_turn());
        assert!(!Status::Loading.accepts_turn());
    }

    #[test]
    fn model_info_tolerates_missing_details() {
        let info: ModelInfo = serde_json::from_value(serde_json::json!({
            "name": "llama2",
            "size": 3825819519u64,
            "digest": "abc123",
            "modified_at": "2023-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(info.name, "llama2");
        assert!(info.details.is_none());
    }

    #[test]
    fn profile_uses_camel_case_keys() {
        let profile = Profile {
            id: "p1".into(),
            name: "Reviewer".into(),
            description: "d".into(),
            system_prompt: "be strict".into(),
            created_at: Utc::now(),
            is_built_in: true,
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["systemPrompt"], "be strict");
        assert_eq!(json["isBuiltIn"], true);
    }
}
