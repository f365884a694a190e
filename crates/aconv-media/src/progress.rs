//! Side-file progress channel written by `ffmpeg -progress <file>`.
//!
//! The encoder appends `key=value` blocks to a private temporary file; the
//! supervisor re-reads the whole file on each poll tick and keeps only the most
//! recent elapsed-time record. Nothing ever blocks on the encoder's output.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::MediaResult;

/// Prefix of every progress-report file name.
pub const PROGRESS_FILE_PREFIX: &str = "aconv_prog_";

/// Elapsed output time in microseconds. ffmpeg names it `out_time_ms` even
/// though the unit is µs; newer builds also emit `out_time_us`.
static ELAPSED_RECORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^out_time_(?:ms|us)=(\d+)\s*$").unwrap());

/// A per-task progress-report file. Deleted when dropped.
#[derive(Debug)]
pub struct ProgressReport {
    file: NamedTempFile,
}

impl ProgressReport {
    /// Create an empty progress-report file in `dir`.
    pub fn create_in(dir: impl AsRef<Path>) -> MediaResult<Self> {
        let file = tempfile::Builder::new()
            .prefix(PROGRESS_FILE_PREFIX)
            .suffix(".txt")
            .tempfile_in(dir)?;
        debug!(path = %file.path().display(), "Created progress report file");
        Ok(Self { file })
    }

    /// Path handed to the encoder.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Latest elapsed time in the file, if any record has been written.
    ///
    /// Reading never mutates the file; a failed read is treated as "nothing new".
    pub async fn latest_elapsed_us(&self) -> Option<u64> {
        match tokio::fs::read(self.path()).await {
            Ok(bytes) => parse_latest_elapsed_us(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                debug!(path = %self.path().display(), "Progress file not readable yet: {}", e);
                None
            }
        }
    }

    /// Fraction of `duration_secs` covered so far, in `[0, 1]`.
    pub async fn read_fraction(&self, duration_secs: Option<f64>) -> f64 {
        elapsed_fraction(self.latest_elapsed_us().await, duration_secs)
    }

    /// Delete the file now, reporting failures instead of swallowing them in `Drop`.
    pub fn close(self) -> PathBuf {
        let path = self.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!(path = %path.display(), "Failed to remove progress report file: {}", e);
        }
        path
    }
}

/// Extract the most recently written elapsed-time record.
pub fn parse_latest_elapsed_us(content: &str) -> Option<u64> {
    ELAPSED_RECORD
        .captures_iter(content)
        .filter_map(|c| c.get(1)?.as_str().parse::<u64>().ok())
        .last()
}

/// Convert elapsed microseconds to a clamped fraction of the total duration.
///
/// Unknown duration or no record yet gives 0.
pub fn elapsed_fraction(elapsed_us: Option<u64>, duration_secs: Option<f64>) -> f64 {
    match (elapsed_us, duration_secs) {
        (Some(us), Some(total)) if total > 0.0 => (us as f64 / 1_000_000.0 / total).clamp(0.0, 1.0),
        _ => 0.0,
    }
}
