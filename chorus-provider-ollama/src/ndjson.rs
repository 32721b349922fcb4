//! Newline-delimited JSON decoding for Ollama's streaming endpoints.
//!
//! Ollama emits one JSON object per line:
//! ```text
//! {"model":"llama3.2","message":{"role":"assistant","content":"Hello"},"done":false}
//! {"model":"llama3.2","message":{"role":"assistant","content":""},"done":true}
//! ```
//!
//! Network reads do not respect line boundaries, so the decoder keeps the
//! trailing partial line of each read and prepends it to the next one.
//! Buffering happens on raw bytes: a multi-byte character split across two
//! reads is reassembled before UTF-8 decoding.

use std::marker::PhantomData;

use bytes::Bytes;
use chorus_types::ChatError;
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;

use crate::error::map_reqwest_error;

/// Incremental NDJSON decoder for one connection.
///
/// Feed it reads with [`push`](Self::push) and call [`finish`](Self::finish)
/// once the connection closes. `finish` consumes the decoder, so an instance
/// can never be reused for a second connection.
///
/// Lines that are not valid UTF-8 or do not deserialize into `T` are logged
/// at `WARN` and dropped; decoding continues with the next line.
pub struct NdjsonDecoder<T> {
    buf: Vec<u8>,
    skipped: usize,
    _record: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> NdjsonDecoder<T> {
    /// Create an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            skipped: 0,
            _record: PhantomData,
        }
    }

    /// Append one read and return every record completed by it, in line order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<T> {
        self.buf.extend_from_slice(chunk);

        let mut records = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buf[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            if let Some(record) = self.decode_line(start, end) {
                records.push(record);
            }
            start = end + 1;
        }
        self.buf.drain(..start);
        records
    }

    /// Decode whatever remains after the connection closed.
    ///
    /// A final line without a trailing newline is still a record.
    pub fn finish(mut self) -> Option<T> {
        let end = self.buf.len();
        self.decode_line(0, end)
    }

    /// Number of lines dropped so far.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn decode_line(&mut self, start: usize, end: usize) -> Option<T> {
        let raw = &self.buf[start..end];
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.iter().all(u8::is_ascii_whitespace) {
            return None;
        }

        match parse_line(raw) {
            Ok(record) => Some(record),
            Err(err) => {
                self.skipped += 1;
                tracing::warn!(error = %err, line = %String::from_utf8_lossy(raw), "chorus.ndjson.skip");
                None
            }
        }
    }
}

impl<T: DeserializeOwned> Default for NdjsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_line<T: DeserializeOwned>(raw: &[u8]) -> Result<T, ChatError> {
    let line = std::str::from_utf8(raw)
        .map_err(|e| ChatError::StreamParse(format!("UTF-8 decode error: {e}")))?;
    serde_json::from_str(line).map_err(|e| ChatError::StreamParse(e.to_string()))
}

/// Turn a live response body into an ordered stream of records.
///
/// Yields `Err` only for transport failures, after which the stream ends.
/// Malformed lines never surface here.
pub fn decode_stream<T, S>(byte_stream: S) -> impl Stream<Item = Result<T, ChatError>> + Send
where
    T: DeserializeOwned + Send + 'static,
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    async_stream::stream! {
        let mut decoder = NdjsonDecoder::<T>::new();
        let mut bytes_stream = std::pin::pin!(byte_stream);

        while let Some(chunk_result) = bytes_stream.next().await {
            let chunk = match chunk_result {
                Ok(b) => b,
                Err(e) => {
                    yield Err(map_reqwest_error(e));
                    return;
                }
            };
            for record in decoder.push(&chunk) {
                yield Ok(record);
            }
        }

        if let Some(record) = decoder.finish() {
            yield Ok(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn decodes_complete_lines() {
        let mut decoder = NdjsonDecoder::<Value>::new();
        let records = decoder.push(b"{\"a\":1}\n{\"a\":2}\n");
        assert_eq!(records, vec![json!({"a": 1}), json!({"a": 2})]);
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn buffers_partial_line_across_reads() {
        let mut decoder = NdjsonDecoder::<Value>::new();
        assert!(decoder.push(b"{\"content\":\"Hel").is_empty());
        let records = decoder.push(b"lo\"}\n{\"con");
        assert_eq!(records, vec![json!({"content": "Hello"})]);
        let records = decoder.push(b"tent\":\"!\"}\n");
        assert_eq!(records, vec![json!({"content": "!"})]);
    }

    #[test]
    fn malformed_line_is_skipped() {
        let mut decoder = NdjsonDecoder::<Value>::new();
        let records = decoder.push(b"{\"a\":1}\nnot json\n{\"a\":2}\n");
        assert_eq!(records, vec![json!({"a": 1}), json!({"a": 2})]);
        assert_eq!(decoder.skipped(), 1);
    }

    #[test]
    fn blank_and_crlf_lines() {
        let mut decoder = NdjsonDecoder::<Value>::new();
        let records = decoder.push(b"\n  \n{\"a\":1}\r\n\r\n");
        assert_eq!(records, vec![json!({"a": 1})]);
        assert_eq!(decoder.skipped(), 0);
    }

    #[test]
    fn trailing_line_without_newline_is_kept() {
        let mut decoder = NdjsonDecoder::<Value>::new();
        assert!(decoder.push(b"{\"done\":true}").is_empty());
        assert_eq!(decoder.finish(), Some(json!({"done": true})));
    }

    #[test]
    fn split_multibyte_character_is_reassembled() {
        let line = "{\"content\":\"héllo\"}\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let mut decoder = NdjsonDecoder::<Value>::new();
        assert!(decoder.push(&line[..split]).is_empty());
        let records = decoder.push(&line[split..]);
        assert_eq!(records, vec![json!({"content": "héllo"})]);
    }

    #[test]
    fn record_type_mismatch_is_skipped() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Rec {
            n: u32,
        }
        let mut decoder = NdjsonDecoder::<Rec>::new();
        let records = decoder.push(b"{\"n\":\"x\"}\n{\"n\":3}\n");
        assert_eq!(records, vec![Rec { n: 3 }]);
    }

    #[tokio::test]
    async fn decode_stream_yields_records_in_order() {
        let reads: Vec<Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::from_static(b"{\"i\":1}\n{\"i\"")),
            Ok(Bytes::from_static(b":2}\ngarbage\n")),
            Ok(Bytes::from_static(b"{\"i\":3}")),
        ];
        let records: Vec<Value> = decode_stream(futures::stream::iter(reads))
            .map(|r| r.expect("no transport error"))
            .collect()
            .await;
        assert_eq!(records, vec![json!({"i": 1}), json!({"i": 2}), json!({"i": 3})]);
    }
}
