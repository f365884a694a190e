//! Thin wrappers around the desktop helper binaries (kdialog, qdbus, notify-send).

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use tokio::process::Command;

/// D-Bus CLI names, in lookup order.
pub const QDBUS_CANDIDATES: [&str; 3] = ["qdbus-qt5", "qdbus", "qdbus6"];

/// Locate the first available qdbus binary.
pub fn find_qdbus() -> Option<PathBuf> {
    QDBUS_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// Run a helper to completion and capture its output.
///
/// The child is killed if the returned future is dropped, so callers can bound
/// it with `tokio::time::timeout`.
pub async fn run_helper<I, S>(program: &Path, args: I) -> std::io::Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
}

/// Run a helper and report only whether it exited with status 0.
pub async fn run_helper_ok<I, S>(program: &Path, args: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    match run_helper(program, args).await {
        Ok(output) => output.status.success(),
        Err(e) => {
            tracing::debug!("{} could not be run: {}", program.display(), e);
            false
        }
    }
}
