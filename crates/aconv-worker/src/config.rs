//! Converter configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Immutable settings for one batch controller.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Interval between progress-file polls
    pub poll_interval: Duration,
    /// Bound on each ffprobe call
    pub probe_timeout: Duration,
    /// Bound on each display-surface call; exceeding it counts as surface loss
    pub surface_call_timeout: Duration,
    /// Maximum bytes of encoder diagnostics kept per failed task
    pub diagnostic_limit: usize,
    /// File names longer than this are shortened in display labels
    pub label_max_chars: usize,
    /// Directory for per-task progress-report and diagnostics files
    pub work_dir: PathBuf,
    /// Encoder binary
    pub ffmpeg_bin: PathBuf,
    /// Inspection binary
    pub ffprobe_bin: PathBuf,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            probe_timeout: Duration::from_secs(30),
            surface_call_timeout: Duration::from_secs(5),
            diagnostic_limit: 400,
            label_max_chars: 50,
            work_dir: std::env::temp_dir(),
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            ffprobe_bin: PathBuf::from("ffprobe"),
        }
    }
}

impl ConverterConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            poll_interval: Duration::from_millis(
                std::env::var("ACONV_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|ms| *ms > 0)
                    .unwrap_or(500),
            ),
            probe_timeout: Duration::from_secs(
                std::env::var("ACONV_PROBE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            surface_call_timeout: Duration::from_secs(
                std::env::var("ACONV_SURFACE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            diagnostic_limit: std::env::var("ACONV_DIAGNOSTIC_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.diagnostic_limit),
            label_max_chars: std::env::var("ACONV_LABEL_MAX_CHARS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.label_max_chars),
            work_dir: std::env::var("ACONV_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            ffmpeg_bin: std::env::var("ACONV_FFMPEG")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_bin),
            ffprobe_bin: std::env::var("ACONV_FFPROBE")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffprobe_bin),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }
}
