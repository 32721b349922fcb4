//! Ollama wire types (request bodies and streamed records).
//!
//! Reference: <https://github.com/ollama/ollama/blob/main/docs/api.md>

use chorus_types::{ModelInfo, WireMessage};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/chat`.
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<WireMessage>,
    pub stream: bool,
}

/// Body of `POST /api/pull`.
#[derive(Debug, Serialize)]
pub(crate) struct PullRequest<'a> {
    pub name: &'a str,
    pub stream: bool,
}

/// One line of a streamed chat response.
///
/// Either carries `message` or, on failure, `error` instead.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatRecord {
    #[serde(default)]
    pub message: Option<RecordMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecordMessage {
    #[serde(default)]
    pub content: String,
}

/// One line of a streamed pull response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PullRecord {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub completed: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `GET /api/tags`.
#[derive(Debug, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_types::Role;

    #[test]
    fn chat_request_shape() {
        let body = ChatRequest {
            model: "llama3.2",
            messages: vec![WireMessage {
                role: Role::User,
                content: "hi".into(),
            }],
            stream: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "llama3.2",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": true
            })
        );
    }

    #[test]
    fn chat_record_with_error_field() {
        let record: ChatRecord = serde_json::from_str(r#"{"error":"model crashed"}"#).unwrap();
        assert_eq!(record.error.as_deref(), Some("model crashed"));
        assert!(record.message.is_none());
        assert!(!record.done);
    }

    #[test]
    fn chat_record_full() {
        let record: ChatRecord = serde_json::from_str(
            r#"{"model":"a","created_at":"2024-01-01T00:00:00Z","message":{"role":"assistant","content":"He"},"done":false}"#,
        )
        .unwrap();
        assert_eq!(record.message.unwrap().content, "He");
    }

    #[test]
    fn pull_record_optional_counters() {
        let record: PullRecord = serde_json::from_str(r#"{"status":"pulling manifest"}"#).unwrap();
        assert_eq!(record.status.as_deref(), Some("pulling manifest"));
        assert!(record.completed.is_none());
        assert!(record.total.is_none());
    }

    #[test]
    fn tags_response_lists_models() {
        let tags: TagsResponse = serde_json::from_str(
            r#"{"models":[{"name":"llama2","size":1,"digest":"abc","modified_at":"2023-01-01T00:00:00Z","details":{"family":"llama","parameter_size":"7B"}}]}"#,
        )
        .unwrap();
        assert_eq!(tags.models.len(), 1);
        let details = tags.models[0].details.as_ref().unwrap();
        assert_eq!(details.parameter_size.as_deref(), Some("7B"));
    }
}
