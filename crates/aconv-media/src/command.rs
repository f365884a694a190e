//! FFmpeg command builder and encoder process handle.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// Upper bound on how much of the diagnostics file is read after exit.
const MAX_STDERR_READ: u64 = 64 * 1024;

/// Prefix of the per-process diagnostics file.
pub const DIAGNOSTICS_FILE_PREFIX: &str = "aconv_err_";

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Progress-report file path (`-progress`)
    progress_path: Option<PathBuf>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            progress_path: None,
            output_args: Vec::new(),
        }
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Write progress records to `path` instead of a pipe.
    pub fn progress_file(mut self, path: impl AsRef<Path>) -> Self {
        self.progress_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn progress_path(&self) -> Option<&Path> {
        self.progress_path.as_deref()
    }

    /// Build the command arguments. Existing outputs are overwritten and only
    /// errors are logged.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec!["-y".to_string()];

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        if let Some(progress) = &self.progress_path {
            args.push("-progress".to_string());
            args.push(progress.to_string_lossy().to_string());
            args.push("-nostats".to_string());
        }

        args.push("-loglevel".to_string());
        args.push("error".to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// How an encoder process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Exit code; `None` when terminated by a signal
    pub code: Option<i32>,
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A running encoder supervised by polling.
#[async_trait]
pub trait EncodeProcess: Send {
    /// Non-blocking liveness check; `Some` once the process has exited.
    fn try_wait(&mut self) -> MediaResult<Option<ExitOutcome>>;

    /// Terminate immediately, without a shutdown handshake, and reap.
    async fn kill(&mut self) -> MediaResult<()>;

    /// Diagnostic output, truncated to at most `limit` bytes.
    ///
    /// Only complete after the process has exited.
    async fn diagnostics(&mut self, limit: usize) -> String;
}

/// Starts encoder processes.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn spawn(&self, cmd: &FfmpegCommand) -> MediaResult<Box<dyn EncodeProcess>>;
}

/// [`Encoder`] that launches the `ffmpeg` binary.
///
/// The child's stderr goes to a temporary file in `work_dir`, never a pipe, so
/// an encoder that logs heavily cannot block on a full pipe buffer.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
    work_dir: PathBuf,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            work_dir: std::env::temp_dir(),
        }
    }

    /// Directory for the per-process diagnostics file.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn spawn(&self, cmd: &FfmpegCommand) -> MediaResult<Box<dyn EncodeProcess>> {
        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", self.program.display(), args.join(" "));

        let diagnostics = tempfile::Builder::new()
            .prefix(DIAGNOSTICS_FILE_PREFIX)
            .suffix(".log")
            .tempfile_in(&self.work_dir)?;
        let stderr = diagnostics.reopen()?;

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => MediaError::FfmpegNotFound,
                _ => MediaError::spawn_failed(e.to_string()),
            })?;

        Ok(Box::new(FfmpegProcess::new(child, diagnostics)))
    }
}

/// Handle to a spawned encoder child and its diagnostics file.
///
/// The diagnostics file is removed when the handle is dropped.
#[derive(Debug)]
pub struct FfmpegProcess {
    child: Child,
    diagnostics: NamedTempFile,
}

impl FfmpegProcess {
    pub fn new(child: Child, diagnostics: NamedTempFile) -> Self {
        Self { child, diagnostics }
    }
}

#[async_trait]
impl EncodeProcess for FfmpegProcess {
    fn try_wait(&mut self) -> MediaResult<Option<ExitOutcome>> {
        Ok(self
            .child
            .try_wait()?
            .map(|status| ExitOutcome { code: status.code() }))
    }

    async fn kill(&mut self) -> MediaResult<()> {
        info!(pid = ?self.child.id(), "Killing encoder process");
        match self.child.kill().await {
            Ok(()) => Ok(()),
            // Already exited and reaped.
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn diagnostics(&mut self, limit: usize) -> String {
        let mut buf = Vec::new();
        let read = async {
            let file = tokio::fs::File::open(self.diagnostics.path()).await?;
            file.take(MAX_STDERR_READ).read_to_end(&mut buf).await
        };
        if let Err(e) = read.await {
            warn!(path = %self.diagnostics.path().display(), "Failed to read encoder diagnostics: {}", e);
        }
        truncate_on_char_boundary(&String::from_utf8_lossy(&buf), limit)
    }
}

/// Truncate `text` to at most `limit` bytes without splitting a character.
pub fn truncate_on_char_boundary(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

/// Check if the encoder binary is available.
pub fn check_ffmpeg(program: impl AsRef<Path>) -> MediaResult<PathBuf> {
    which::which(program.as_ref()).map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if the inspection binary is available.
pub fn check_ffprobe(program: impl AsRef<Path>) -> MediaResult<PathBuf> {
    which::which(program.as_ref()).map_err(|_| MediaError::FfprobeNotFound)
}
