//! FFprobe duration and codec inspection.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Default bound on a single ffprobe call.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Answers questions about an input file before it is encoded.
///
/// Both calls are best-effort: `None` means "could not tell", never an error.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    /// Total duration in seconds, if positive and known.
    async fn duration(&self, path: &Path) -> Option<f64>;

    /// Codec name of the first audio stream, lower-cased.
    async fn audio_codec(&self, path: &Path) -> Option<String>;
}

/// FFprobe JSON output format.
#[derive(Debug, Default, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_name: Option<String>,
}

/// [`MediaInspector`] backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeInspector {
    program: PathBuf,
    timeout: Duration,
}

impl Default for FfprobeInspector {
    fn default() -> Self {
        Self::new("ffprobe", DEFAULT_PROBE_TIMEOUT)
    }
}

impl FfprobeInspector {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Probe the container duration in seconds.
    pub async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        let stdout = self
            .run(&["-show_entries", "format=duration"], path)
            .await?;
        duration_from_json(&stdout)
            .ok_or_else(|| MediaError::ffprobe_failed("No usable duration in ffprobe output", None))
    }

    /// Probe the first audio stream's codec name.
    pub async fn probe_codec(&self, path: &Path) -> MediaResult<Option<String>> {
        let stdout = self
            .run(
                &["-select_streams", "a:0", "-show_entries", "stream=codec_name"],
                path,
            )
            .await?;
        Ok(codec_from_json(&stdout))
    }

    async fn run(&self, entries: &[&str], path: &Path) -> MediaResult<Vec<u8>> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-v", "error"])
            .args(entries)
            .args(["-print_format", "json"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => MediaError::FfprobeNotFound,
                _ => MediaError::Io(e),
            })?,
            Err(_) => return Err(MediaError::Timeout(self.timeout.as_secs())),
        };

        if !output.status.success() {
            return Err(MediaError::ffprobe_failed(
                "FFprobe failed",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    async fn duration(&self, path: &Path) -> Option<f64> {
        match self.probe_duration(path).await {
            Ok(duration) => {
                debug!(path = %path.display(), duration, "Probed duration");
                Some(duration)
            }
            Err(e) => {
                warn!(path = %path.display(), "Duration probe failed, progress will jump at completion: {}", e);
                None
            }
        }
    }

    async fn audio_codec(&self, path: &Path) -> Option<String> {
        match self.probe_codec(path).await {
            Ok(codec) => codec,
            Err(e) => {
                warn!(path = %path.display(), "Codec probe failed: {}", e);
                None
            }
        }
    }
}

/// Parse a textual duration; only finite positive values count.
pub fn parse_duration(text: &str) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

fn duration_from_json(stdout: &[u8]) -> Option<f64> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout).ok()?;
    probe.format?.duration.as_deref().and_then(parse_duration)
}

fn codec_from_json(stdout: &[u8]) -> Option<String> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout).ok()?;
    probe
        .streams
        .into_iter()
        .find_map(|s| s.codec_name)
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
}
