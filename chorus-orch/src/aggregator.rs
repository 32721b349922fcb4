//! Per-model accumulation of streamed reply text.

use std::time::Duration;

use chorus_types::ChatMessage;
use tokio::time::Instant;

use crate::think::strip_thinking;
use crate::throttle::Throttle;

/// Content of the final message when a reply is empty after stripping.
pub const EMPTY_REPLY: &str = "No response generated.";

/// Builds one model's reply for one turn.
///
/// Raw deltas are appended as they arrive; display content is derived from
/// the raw buffer on every update and rate limited by a [`Throttle`]. Empty
/// display content is never emitted.
#[derive(Debug)]
pub struct Aggregator {
    raw: String,
    throttle: Throttle,
}

/// Result of the terminal chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Finished {
    /// Final display update, emitted without throttling. `None` when the
    /// reply is empty after stripping.
    pub update: Option<String>,
    /// The assistant message to append to history.
    pub message: ChatMessage,
}

impl Aggregator {
    /// Start an empty reply whose stream opened at `opened`.
    ///
    /// The first update window runs from `opened`, not from the first delta.
    #[must_use]
    pub fn new(interval: Duration, opened: Instant) -> Self {
        Self {
            raw: String::new(),
            throttle: Throttle::new(interval, opened),
        }
    }

    /// Append a non-terminal delta received at `now`.
    ///
    /// Returns display content if an update may be shown immediately.
    pub fn push(&mut self, delta: &str, now: Instant) -> Option<String> {
        self.raw.push_str(delta);
        let display = strip_thinking(&self.raw);
        if display.is_empty() {
            // A pending update would show text that is no longer displayed.
            self.throttle.cancel();
            return None;
        }
        self.throttle.offer(display, now)
    }

    /// When the next deferred update is due.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.throttle.deadline()
    }

    /// Emit the deferred update whose deadline passed.
    pub fn fire(&mut self, now: Instant) -> Option<String> {
        self.throttle.fire(now)
    }

    /// Raw text received so far, thinking spans included.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Apply the terminal chunk's delta and close the reply.
    ///
    /// Any deferred update is cancelled; the returned update replaces it.
    pub fn finish(mut self, delta: &str) -> Finished {
        self.throttle.cancel();
        self.raw.push_str(delta);
        let display = strip_thinking(&self.raw);
        if display.is_empty() {
            Finished {
                update: None,
                message: ChatMessage::assistant(EMPTY_REPLY),
            }
        } else {
            Finished {
                message: ChatMessage::assistant(display.clone()),
                update: Some(display),
            }
        }
    }

    /// Abandon the reply. Deferred updates are dropped.
    pub fn abort(mut self) {
        self.throttle.cancel();
    }
}
