//! Filesystem helpers for encoder outputs.

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Remove a partially written output file.
///
/// Returns `Ok(true)` when a file was deleted and `Ok(false)` when there was
/// nothing to delete (the encoder may die before creating it).
pub async fn remove_partial_output(path: impl AsRef<Path>) -> MediaResult<bool> {
    let path = path.as_ref();
    match fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!("Removed partial output {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => {
            tracing::warn!("Failed to remove partial output {}: {}", path.display(), e);
            Err(MediaError::from(e))
        }
    }
}

/// Best-effort variant of [`remove_partial_output`] for cleanup paths.
pub async fn discard_partial_output(path: impl AsRef<Path>) {
    let _ = remove_partial_output(path).await;
}
