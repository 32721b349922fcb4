//! Terminal rendering of session events.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chorus::prelude::*;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

const PREVIEW_CHARS: usize = 60;

/// One spinner per responding model, showing the tail of its reply.
///
/// Bars are cleared when the model finishes; the full replies are printed
/// afterwards from the turn outcomes.
pub struct LiveView {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl LiveView {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn spinner(&self, model: &str) -> ProgressBar {
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(style);
        bar.set_prefix(model.to_string());
        bar.set_message(waiting_message(model));
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }
}

impl ChatObserver for LiveView {
    fn on_event(&self, event: &ChatEvent) {
        let mut bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        match event {
            ChatEvent::StatusChanged(status) => match status.status {
                Status::Responding => {
                    let bar = self.spinner(&status.name);
                    if let Some(old) = bars.insert(status.name.clone(), bar) {
                        old.finish_and_clear();
                    }
                }
                Status::Ready | Status::Error => {
                    if let Some(bar) = bars.remove(&status.name) {
                        bar.finish_and_clear();
                    }
                }
                Status::Idle | Status::Loading => {}
            },
            ChatEvent::StreamingUpdate { model, content } => {
                if let Some(bar) = bars.get(model) {
                    bar.set_message(preview(content));
                }
            }
            ChatEvent::MessageAppended { .. } | ChatEvent::InstallProgress(_) => {}
        }
    }
}

/// Shown until the first streamed content arrives.
fn waiting_message(model: &str) -> String {
    if chorus_provider_ollama::is_large_model(model) {
        format!("{model} is loading (large model, may take 2-5 minutes)...")
    } else {
        "thinking...".to_string()
    }
}

/// Last line of `content`, cut to fit on one terminal line.
fn preview(content: &str) -> String {
    let line = content.lines().last().unwrap_or_default();
    let count = line.chars().count();
    if count <= PREVIEW_CHARS {
        return line.to_string();
    }
    let tail: String = line.chars().skip(count - PREVIEW_CHARS).collect();
    format!("…{tail}")
}

/// Print one model's part of a turn.
pub fn print_outcome(outcome: &TurnOutcome, status: Option<&ModelStatus>) {
    let timing = status
        .and_then(|s| s.response_time)
        .map(|d| format!(" ({:.1}s)", d.as_secs_f64()))
        .unwrap_or_default();
    println!("── {}{timing} ──", outcome.model);
    match &outcome.result {
        Ok(message) => println!("{}\n", message.content),
        Err(err) => {
            println!("error: {err}");
            if err.is_timeout() {
                println!("{}", chorus_types::TIMEOUT_HINT);
            }
            println!();
        }
    }
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.1} GB", bytes / GB)
    } else {
        format!("{:.0} MB", bytes / MB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_short_last_line() {
        assert_eq!(preview("first\nsecond"), "second");
        assert_eq!(preview(""), "");
    }

    #[test]
    fn preview_cuts_long_line_from_the_left() {
        let long = "x".repeat(100) + "END";
        let shown = preview(&long);
        assert!(shown.starts_with('…'));
        assert!(shown.ends_with("END"));
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 1);
    }

    #[test]
    fn large_models_warn_about_load_time() {
        assert_eq!(
            waiting_message("llama3.1:70b"),
            "llama3.1:70b is loading (large model, may take 2-5 minutes)..."
        );
        assert_eq!(waiting_message("phi3:mini"), "thinking...");
    }

    #[test]
    fn sizes() {
        assert_eq!(format_size(3_825_819_519), "3.6 GB");
        assert_eq!(format_size(500 * 1024 * 1024), "500 MB");
    }
}
