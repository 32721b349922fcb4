//! Model installation with progress events.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chorus_types::{
    ChatBackend, ChatError, ChatEvent, ChatObserver, InstallProgress, InstallStatus, NoopObserver,
};
use futures::StreamExt;

/// Pulls models through a backend and reports progress to an observer.
///
/// Every install emits a leading `Downloading 0%`, then the backend's
/// progress, then exactly one terminal `Completed` or `Error` event. At most
/// one install per model name runs at a time.
pub struct Installer<B> {
    backend: B,
    observer: Arc<dyn ChatObserver>,
    in_flight: Mutex<HashSet<String>>,
}

/// Removes a model from the in-flight set when the install ends, however it
/// ends.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    model: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.model);
    }
}

impl<B: ChatBackend> Installer<B> {
    /// Create an installer that reports nowhere.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            observer: Arc::new(NoopObserver),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Send progress events to `observer`.
    #[must_use]
    pub fn observer(mut self, observer: impl ChatObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Share an observer that is also used elsewhere.
    #[must_use]
    pub fn shared_observer(mut self, observer: Arc<dyn ChatObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Whether an install for `model` is running.
    pub fn is_installing(&self, model: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(model)
    }

    /// Pull `name` and wait for the terminal status.
    ///
    /// The name is checked first. A malformed name is rejected before any
    /// request is made; a failed check (e.g. the listing call is down) is
    /// logged and the pull goes ahead.
    pub async fn install(&self, name: &str) -> Result<(), ChatError> {
        let model = name.trim();
        if model.is_empty() {
            return Err(ChatError::InvalidModelName("Please enter a model name".into()));
        }
        let _guard = self.claim(model)?;

        let suggestions = match self.backend.validate_model_name(model).await {
            Ok(check) if !check.valid => {
                return Err(ChatError::InvalidModelName(invalid_name_message(
                    model,
                    &check.suggestions,
                )));
            }
            Ok(check) => check.suggestions,
            Err(err) => {
                tracing::warn!(model = %model, error = %err, "chorus.install.validation_skipped");
                Vec::new()
            }
        };

        let mut percent = 0;
        self.emit(InstallProgress::new(model, InstallStatus::Downloading, 0));

        let result = self.follow_pull(model, &mut percent).await;
        if let Err(err) = &result {
            let text = describe_failure(model, err, &suggestions);
            self.emit(InstallProgress::failed(model, percent, text));
        }
        result
    }

    async fn follow_pull(&self, model: &str, percent: &mut u8) -> Result<(), ChatError> {
        let mut progress = self.backend.pull(model).await?;
        while let Some(update) = progress.next().await {
            let update = update?;
            *percent = update.percent;
            let status = update.status;
            self.emit(update);
            if status == InstallStatus::Completed {
                return Ok(());
            }
        }
        Err(ChatError::IncompleteStream {
            model: model.to_string(),
        })
    }

    fn claim(&self, model: &str) -> Result<InFlight<'_>, ChatError> {
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !set.insert(model.to_string()) {
            return Err(ChatError::AlreadyRunning(format!("Installation of {model}")));
        }
        Ok(InFlight {
            set: &self.in_flight,
            model: model.to_string(),
        })
    }

    fn emit(&self, progress: InstallProgress) {
        self.observer.on_event(&ChatEvent::InstallProgress(progress));
    }
}

fn invalid_name_message(model: &str, suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        format!("Invalid model name '{model}'. Use the form name or name:tag (e.g. llama3.2:3b).")
    } else {
        format!(
            "Invalid model name '{model}'. Did you mean: {}?",
            suggestions.join(", ")
        )
    }
}

/// User-facing text for a failed install.
///
/// Upstream "not found" errors are replaced with a short message, plus
/// similar installed names when there are any.
fn describe_failure(model: &str, err: &ChatError, suggestions: &[String]) -> String {
    let text = err.to_string();
    if !text.to_ascii_lowercase().contains("not found") {
        return text;
    }
    let mut message = format!("Model '{model}' not found.");
    if !suggestions.is_empty() {
        message.push_str(&format!(" Similar installed models: {}.", suggestions.join(", ")));
    }
    message
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::test_utils::{PullStep, ScriptedBackend};

    fn recorder() -> (Arc<Mutex<Vec<InstallProgress>>>, impl ChatObserver + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer = move |e: &ChatEvent| {
            if let ChatEvent::InstallProgress(p) = e {
                sink.lock().unwrap().push(p.clone());
            }
        };
        (seen, observer)
    }

    #[tokio::test]
    async fn successful_install_reports_leading_zero_and_completion() {
        let backend = ScriptedBackend::new().pull(
            "phi3:mini",
            [
                PullStep::progress(InstallStatus::Downloading, 40),
                PullStep::progress(InstallStatus::Installing, 95),
                PullStep::progress(InstallStatus::Completed, 100),
            ],
        );
        let (seen, observer) = recorder();
        let installer = Installer::new(backend).observer(observer);

        installer.install(" phi3:mini ").await.expect("install succeeds");

        let percents: Vec<u8> = seen.lock().unwrap().iter().map(|p| p.percent).collect();
        assert_eq!(percents, vec![0, 40, 95, 100]);
        assert!(!installer.is_installing("phi3:mini"));
    }

    #[tokio::test]
    async fn empty_name_is_rejected_without_events() {
        let (seen, observer) = recorder();
        let installer = Installer::new(ScriptedBackend::new()).observer(observer);
        let err = installer.install("  ").await.unwrap_err();
        assert!(matches!(err, ChatError::InvalidModelName(_)));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_name_lists_suggestions() {
        let backend = ScriptedBackend::new().installed(["llama3.2:3b"]);
        let installer = Installer::new(backend);
        let err = installer.install("llama3.2:").await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("Did you mean: llama3.2:3b?"), "{text}");
    }

    #[tokio::test]
    async fn not_found_is_rewritten_with_suggestions() {
        let backend = ScriptedBackend::new()
            .installed(["llama3.2:3b"])
            .pull("llama3.2:70b", [PullStep::fail("pull model manifest: file not found")]);
        let (seen, observer) = recorder();
        let installer = Installer::new(backend).observer(observer);

        assert!(installer.install("llama3.2:70b").await.is_err());

        let seen = seen.lock().unwrap();
        let last = seen.last().unwrap();
        assert_eq!(last.status, InstallStatus::Error);
        assert_eq!(
            last.error.as_deref(),
            Some("Model 'llama3.2:70b' not found. Similar installed models: llama3.2:3b.")
        );
        assert_eq!(seen.iter().filter(|p| p.status.is_terminal()).count(), 1);
    }

    #[tokio::test]
    async fn listing_failure_does_not_block_install() {
        let backend = ScriptedBackend::new()
            .listing_fails()
            .pull("phi3:mini", [PullStep::progress(InstallStatus::Completed, 100)]);
        let installer = Installer::new(backend);
        installer.install("phi3:mini").await.expect("install proceeds");
    }

    #[tokio::test]
    async fn stream_without_completion_fails() {
        let backend = ScriptedBackend::new()
            .pull("phi3:mini", [PullStep::progress(InstallStatus::Downloading, 30)]);
        let (seen, observer) = recorder();
        let installer = Installer::new(backend).observer(observer);

        let err = installer.install("phi3:mini").await.unwrap_err();
        assert!(matches!(err, ChatError::IncompleteStream { .. }));
        let last = seen.lock().unwrap().last().cloned().unwrap();
        assert_eq!((last.status, last.percent), (InstallStatus::Error, 30));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_install_of_same_model_is_refused() {
        let backend = ScriptedBackend::new().pull(
            "phi3:mini",
            [
                PullStep::delay(std::time::Duration::from_secs(5)),
                PullStep::progress(InstallStatus::Completed, 100),
            ],
        );
        let installer = Installer::new(backend);

        let (first, second) = tokio::join!(installer.install("phi3:mini"), async {
            tokio::task::yield_now().await;
            installer.install("phi3:mini").await
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(ChatError::AlreadyRunning(_))));
        assert!(!installer.is_installing("phi3:mini"));
    }
}
