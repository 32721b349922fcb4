//! NDJSON pull (model download) streaming.
//!
//! Ollama reports pull progress as status lines:
//! ```text
//! {"status":"downloading sha256:2ae6...","completed":1048576,"total":4194304}
//! {"status":"verifying sha256 digest"}
//! {"status":"writing manifest"}
//! {"status":"success"}
//! ```
//!
//! Downloads account for the first 90%, verification and writing sit at 95%,
//! and `success` is 100%.

use chorus_types::{ChatError, InstallProgress, InstallStatus, PullStream};
use futures::{Stream, StreamExt};

use crate::types::PullRecord;

/// Share of the bar given to the download phase.
const DOWNLOAD_SHARE: f64 = 90.0;
/// Percent shown while layers are verified or written.
const FINALIZING_PERCENT: u8 = 95;

/// Maps pull records to progress for one model.
///
/// Percent never goes backwards: multi-layer pulls restart their byte
/// counters per layer, which would otherwise make the bar jump back.
#[derive(Debug)]
pub(crate) struct PullTracker {
    model: String,
    percent: u8,
}

impl PullTracker {
    pub(crate) fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            percent: 0,
        }
    }

    /// Progress produced by `record`, `Ok(None)` for statuses that do not
    /// move the bar, or the error the record carries.
    pub(crate) fn observe(&mut self, record: PullRecord) -> Result<Option<InstallProgress>, ChatError> {
        if let Some(message) = record.error {
            return Err(ChatError::Model {
                model: self.model.clone(),
                message,
            });
        }
        let Some(status) = record.status else {
            return Ok(None);
        };

        let (phase, percent) = if status.contains("downloading") {
            let completed = record.completed.unwrap_or(0) as f64;
            let total = record.total.filter(|t| *t > 0).unwrap_or(1) as f64;
            let percent = (completed / total * DOWNLOAD_SHARE).round().clamp(0.0, DOWNLOAD_SHARE);
            (InstallStatus::Downloading, percent as u8)
        } else if status.contains("verifying") || status.contains("writing") {
            (InstallStatus::Installing, FINALIZING_PERCENT)
        } else if status.contains("success") {
            (InstallStatus::Completed, 100)
        } else {
            return Ok(None);
        };

        self.percent = self.percent.max(percent);
        Ok(Some(InstallProgress::new(self.model.clone(), phase, self.percent)))
    }
}

/// Wrap decoded pull records into a [`PullStream`] for `model`.
pub(crate) fn pull_progress<S>(model: String, records: S) -> PullStream
where
    S: Stream<Item = Result<PullRecord, ChatError>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut tracker = PullTracker::new(model.clone());
        let mut records = std::pin::pin!(records);

        while let Some(record) = records.next().await {
            let record = match record {
                Ok(record) => record,
                Err(err) => {
                    yield Err(err);
                    return;
                }
            };
            match tracker.observe(record) {
                Ok(Some(progress)) => {
                    let finished = progress.status == InstallStatus::Completed;
                    tracing::debug!(model = %model, percent = progress.percent, "chorus.pull.progress");
                    yield Ok(progress);
                    if finished {
                        return;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    yield Err(err);
                    return;
                }
            }
        }

        yield Err(ChatError::IncompleteStream { model });
    })
}
