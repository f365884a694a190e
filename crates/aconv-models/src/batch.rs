//! Batch request and result types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::encoding::EncodingConfig;
use crate::format::{quality_suffix, OutputFormat};
use crate::task::ConversionTask;

/// Number of error excerpts shown in the end-of-batch summary.
pub const ERROR_PREVIEW_COUNT: usize = 3;

/// Everything the batch controller receives from its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Input files, in processing order
    pub inputs: Vec<PathBuf>,
    pub format: OutputFormat,
    pub quality: String,
    /// Precomputed encoder output arguments
    pub codec_args: Vec<String>,
}

impl BatchRequest {
    pub fn new(
        inputs: Vec<PathBuf>,
        format: OutputFormat,
        quality: impl Into<String>,
        codec_args: Vec<String>,
    ) -> Self {
        Self {
            inputs,
            format,
            quality: quality.into(),
            codec_args,
        }
    }

    /// Build a request whose codec arguments come from [`EncodingConfig`].
    pub fn from_encoding(inputs: Vec<PathBuf>, encoding: &EncodingConfig) -> Self {
        Self::new(
            inputs,
            encoding.format,
            encoding.quality.clone(),
            encoding.to_ffmpeg_args(),
        )
    }

    /// Materialize the task list. Done once, at batch start.
    pub fn tasks(&self) -> Vec<ConversionTask> {
        self.inputs
            .iter()
            .map(|input| ConversionTask::new(input.clone(), self.format, self.quality.clone()))
            .collect()
    }

    /// Title shown on the progress display, e.g. `Audio Converter - MP3 (V0)`.
    pub fn display_title(&self) -> String {
        format!(
            "Audio Converter - {}{}",
            self.format.as_str().to_uppercase(),
            quality_suffix(&self.quality)
        )
    }
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Tasks whose encoder exited successfully
    pub done: usize,
    /// Number of tasks in the batch
    pub total: usize,
    /// Tasks rejected by the lossy/lossless policy
    pub skipped: usize,
    /// Per-task error descriptions, in task order
    pub errors: Vec<String>,
    pub cancelled: bool,
    /// 1-based index of the task that was in flight when cancellation hit
    pub cancelled_at: Option<usize>,
}

impl BatchResult {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// First few errors joined by blank lines, with an `…and N more` tail.
    pub fn error_preview(&self) -> String {
        let mut preview = self
            .errors
            .iter()
            .take(ERROR_PREVIEW_COUNT)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n\n");
        if self.errors.len() > ERROR_PREVIEW_COUNT {
            preview.push_str(&format!(
                "\n\n…and {} more",
                self.errors.len() - ERROR_PREVIEW_COUNT
            ));
        }
        preview
    }

    /// Counts plus error preview, shown once at batch end.
    pub fn summary(&self) -> String {
        format!(
            "Converted {} of {} file(s).\n\nErrors:\n{}",
            self.done,
            self.total,
            self.error_preview()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_are_materialized_in_order() {
        let request = BatchRequest::from_encoding(
            vec!["/m/a.wav".into(), "/m/b.wav".into()],
            &EncodingConfig::new(OutputFormat::Mp3, "V2"),
        );
        let tasks = request.tasks();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].output, PathBuf::from("/m/a.mp3"));
        assert_eq!(tasks[1].quality, "V2");
        assert_eq!(request.codec_args, ["-codec:a", "libmp3lame", "-q:a", "2"]);
    }

    #[test]
    fn test_display_title() {
        let lossy = BatchRequest::new(vec![], OutputFormat::Opus, "96k", vec![]);
        assert_eq!(lossy.display_title(), "Audio Converter - OPUS (96k)");
        let lossless = BatchRequest::new(vec![], OutputFormat::Flac, "lossless", vec![]);
        assert_eq!(lossless.display_title(), "Audio Converter - FLAC");
    }

    #[test]
    fn test_error_preview_is_capped() {
        let mut result = BatchResult::new(5);
        result.done = 0;
        result.errors = (1..=5).map(|i| format!("e{}", i)).collect();
        assert_eq!(result.error_preview(), "e1\n\ne2\n\ne3\n\n…and 2 more");
    }

    #[test]
    fn test_summary_without_overflow() {
        let mut result = BatchResult::new(3);
        result.done = 2;
        result.errors.push("b.wav:\nbroken".to_string());
        assert_eq!(
            result.summary(),
            "Converted 2 of 3 file(s).\n\nErrors:\nb.wav:\nbroken"
        );
    }

    #[test]
    fn test_result_serialization() {
        let mut result = BatchResult::new(2);
        result.cancelled = true;
        result.cancelled_at = Some(2);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["cancelled"], true);
        assert_eq!(json["cancelled_at"], 2);
    }
}
