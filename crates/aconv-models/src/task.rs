//! Conversion tasks and their lifecycle status.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::format::OutputFormat;

/// Lifecycle status of a single conversion task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Materialized, not started yet
    #[default]
    Pending,
    /// Encoder process is being supervised
    Running,
    /// Encoder exited with status 0
    Done,
    /// Missing input, spawn failure or non-zero encoder exit
    Failed,
    /// Display surface went away while this task was in flight
    Cancelled,
    /// Rejected by the lossy/lossless policy before starting
    Skipped,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Skipped => "skipped",
        }
    }

    /// Check if this is a terminal state (no more transitions allowed).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One input file's conversion job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionTask {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub quality: String,
    pub status: TaskStatus,
}

impl ConversionTask {
    /// Create a pending task; the output path is derived from the input.
    pub fn new(input: impl Into<PathBuf>, format: OutputFormat, quality: impl Into<String>) -> Self {
        let input = input.into();
        let output = output_path_for(&input, format);
        Self {
            input,
            output,
            format,
            quality: quality.into(),
            status: TaskStatus::Pending,
        }
    }

    /// File name of the input, for labels and error lines.
    pub fn file_name(&self) -> String {
        self.input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input.to_string_lossy().into_owned())
    }

    /// Move to `next`. Terminal states are sticky; returns false if ignored.
    pub fn transition(&mut self, next: TaskStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = next;
        true
    }
}

/// Output path for `input`: same directory and stem with the format's extension.
///
/// When that would overwrite the input (e.g. `song.flac` → flac), the stem gets a
/// `_<format>` suffix instead.
pub fn output_path_for(input: &Path, format: OutputFormat) -> PathBuf {
    let candidate = input.with_extension(format.extension());
    if candidate != input {
        return candidate;
    }

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}_{}.{}", stem, format.as_str(), format.extension()))
}
