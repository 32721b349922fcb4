//! NDJSON chat streaming for the Ollama Chat API.
//!
//! Maps decoded [`ChatRecord`]s to [`StreamChunk`]s and enforces the
//! per-model deadline. The stream ends after the `done` record, after the
//! first error, or with [`ChatError::IncompleteStream`] if the connection
//! closes before either.
//!
//! Reference: <https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-chat-completion>

use std::time::Duration;

use chorus_types::{ChatError, ChatStream, StreamChunk};
use futures::{Stream, StreamExt};
use tokio::time::Instant;

use crate::types::ChatRecord;

/// Wrap decoded chat records into a [`ChatStream`] for `model`.
///
/// `deadline` is absolute: it was fixed when the request was sent, and
/// `bound` is only used to report it.
pub(crate) fn chat_chunks<S>(model: String, records: S, deadline: Instant, bound: Duration) -> ChatStream
where
    S: Stream<Item = Result<ChatRecord, ChatError>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut records = std::pin::pin!(records);
        let mut chunks = 0usize;

        loop {
            let next = match tokio::time::timeout_at(deadline, records.next()).await {
                Ok(next) => next,
                Err(_) => {
                    tracing::debug!(model = %model, chunks, "chorus.chat.timeout");
                    yield Err(ChatError::Timeout { model: model.clone(), secs: bound.as_secs() });
                    return;
                }
            };

            match next {
                Some(Ok(record)) => {
                    chunks += 1;
                    match map_record(&model, record) {
                        Ok(chunk) => {
                            let done = chunk.done;
                            yield Ok(chunk);
                            if done {
                                tracing::debug!(model = %model, chunks, "chorus.chat.done");
                                return;
                            }
                        }
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
                Some(Err(err)) => {
                    yield Err(err);
                    return;
                }
                None => {
                    tracing::debug!(model = %model, chunks, "chorus.chat.incomplete");
                    yield Err(ChatError::IncompleteStream { model: model.clone() });
                    return;
                }
            }
        }
    })
}

/// Map one record to a chunk, or to the error it carries.
fn map_record(model: &str, record: ChatRecord) -> Result<StreamChunk, ChatError> {
    if let Some(message) = record.error {
        return Err(ChatError::Model {
            model: model.to_string(),
            message,
        });
    }
    Ok(StreamChunk {
        model: model.to_string(),
        content_delta: record.message.map(|m| m.content).unwrap_or_default(),
        done: record.done,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordMessage;

    fn record(content: &str, done: bool) -> Result<ChatRecord, ChatError> {
        Ok(ChatRecord {
            message: Some(RecordMessage {
                content: content.into(),
            }),
            done,
            error: None,
        })
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    #[tokio::test]
    async fn yields_chunks_until_done() {
        let records = futures::stream::iter(vec![
            record("He", false),
            record("llo", false),
            record("", true),
            record("ignored", false),
        ]);
        let chunks: Vec<_> = chat_chunks("a".into(), records, far_deadline(), Duration::from_secs(60))
            .collect()
            .await;

        assert_eq!(chunks.len(), 3);
        let deltas: Vec<String> = chunks
            .into_iter()
            .map(|c| c.expect("ok chunk").content_delta)
            .collect();
        assert_eq!(deltas, vec!["He", "llo", ""]);
    }

    #[tokio::test]
    async fn error_field_fails_the_stream() {
        let records = futures::stream::iter(vec![
            record("He", false),
            Ok(ChatRecord {
                error: Some("out of memory".into()),
                ..Default::default()
            }),
            record("never", false),
        ]);
        let items: Vec<_> = chat_chunks("b".into(), records, far_deadline(), Duration::from_secs(60))
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        match &items[1] {
            Err(ChatError::Model { model, message }) => {
                assert_eq!(model, "b");
                assert_eq!(message, "out of memory");
            }
            other => panic!("expected Model error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn end_without_done_is_incomplete() {
        let records = futures::stream::iter(vec![record("partial", false)]);
        let items: Vec<_> = chat_chunks("c".into(), records, far_deadline(), Duration::from_secs(60))
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        assert!(matches!(&items[1], Err(ChatError::IncompleteStream { model }) if model == "c"));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_aborts_a_stalled_stream() {
        let bound = Duration::from_secs(120);
        let deadline = Instant::now() + bound;
        let records = futures::stream::iter(vec![record("slow", false)])
            .chain(futures::stream::pending());
        let items: Vec<_> = chat_chunks("phi3:mini".into(), records, deadline, bound)
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        match &items[1] {
            Err(err @ ChatError::Timeout { secs, .. }) => {
                assert_eq!(*secs, 120);
                assert!(err.to_string().contains("phi3:mini"));
            }
            other => panic!("expected Timeout, got: {other:?}"),
        }
    }
}
