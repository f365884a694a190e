//! Structured task logging utilities.
//!
//! Provides consistent, structured logging for the task lifecycle with
//! tracing spans and contextual information, plus subscriber setup for the
//! binaries.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// `LOG_FORMAT=json` selects JSON lines; otherwise human-readable output on stderr.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("aconv=info,aconv_worker=info,aconv_media=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Task logger for structured logging with consistent formatting.
///
/// Every line carries the 1-based task position and the input file name.
#[derive(Debug, Clone)]
pub struct TaskLogger {
    position: usize,
    total: usize,
    file: String,
}

impl TaskLogger {
    /// Create a logger for task `index` (0-based) of `total`.
    pub fn new(index: usize, total: usize, file: impl Into<String>) -> Self {
        Self {
            position: index + 1,
            total,
            file: file.into(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            task = self.position,
            total = self.total,
            file = %self.file,
            "Task started: {}", message
        );
    }

    pub fn log_progress(&self, percent: u8) {
        tracing::debug!(
            task = self.position,
            total = self.total,
            file = %self.file,
            percent,
            "Task progress"
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            task = self.position,
            total = self.total,
            file = %self.file,
            "Task warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            task = self.position,
            total = self.total,
            file = %self.file,
            "Task error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            task = self.position,
            total = self.total,
            file = %self.file,
            "Task completed: {}", message
        );
    }

    /// 1-based position in the batch.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Create a tracing span for this task.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "task",
            task = self.position,
            total = self.total,
            file = %self.file
        )
    }
}
