//! Conversion metrics.
//!
//! Recorded through the `metrics` facade; they are no-ops unless the host
//! installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const TASKS_COMPLETED_TOTAL: &str = "aconv_tasks_completed_total";
    pub const TASKS_FAILED_TOTAL: &str = "aconv_tasks_failed_total";
    pub const TASKS_SKIPPED_TOTAL: &str = "aconv_tasks_skipped_total";
    pub const BATCHES_CANCELLED_TOTAL: &str = "aconv_batches_cancelled_total";
    pub const ENCODE_DURATION_SECONDS: &str = "aconv_encode_duration_seconds";
}

/// Record a successful encode.
pub fn record_task_completed(format: &str, duration_secs: f64) {
    let labels = [("format", format.to_string())];
    counter!(names::TASKS_COMPLETED_TOTAL, &labels).increment(1);
    histogram!(names::ENCODE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Why a task failed; the `reason` label of the failure counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    MissingInput,
    ProgressFile,
    Spawn,
    EncoderExit,
    Wait,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingInput => "missing_input",
            Self::ProgressFile => "progress_file",
            Self::Spawn => "spawn",
            Self::EncoderExit => "encoder_exit",
            Self::Wait => "wait",
        }
    }
}

/// Record a task failure.
///
/// `reason` is labelled as one of `missing_input`, `progress_file`, `spawn`,
/// `encoder_exit` or `wait`.
pub fn record_task_failed(format: &str, reason: FailureReason) {
    let labels = [
        ("format", format.to_string()),
        ("reason", reason.as_str().to_string()),
    ];
    counter!(names::TASKS_FAILED_TOTAL, &labels).increment(1);
}

/// Record a policy rejection.
pub fn record_task_skipped(format: &str) {
    let labels = [("format", format.to_string())];
    counter!(names::TASKS_SKIPPED_TOTAL, &labels).increment(1);
}

/// Record a batch stopped by cancellation or surface loss.
pub fn record_batch_cancelled() {
    counter!(names::BATCHES_CANCELLED_TOTAL).increment(1);
}
