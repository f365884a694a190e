//! Worker error types.

use std::path::PathBuf;

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors that abort a run before any task is attempted.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Unknown format: '{0}'")]
    UnknownFormat(String),

    #[error("Quality '{quality}' is not available for {format}")]
    UnsupportedQuality { format: String, quality: String },

    #[error("No input files provided.")]
    NoInputs,
}

/// Task-scoped failures. Recorded in the batch result; the batch continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// Input disappeared before the task started; nothing was spawned
    #[error("File not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// Encoder could not be started or exited non-zero
    #[error("{file}:\n{excerpt}")]
    EncodeFailure { file: String, excerpt: String },
}

impl TaskError {
    pub fn encode_failure(file: impl Into<String>, excerpt: impl Into<String>) -> Self {
        Self::EncodeFailure {
            file: file.into(),
            excerpt: excerpt.into(),
        }
    }
}
