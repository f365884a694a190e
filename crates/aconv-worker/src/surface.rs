//! Remote progress-display surface.
//!
//! The production surface is a `kdialog --progressbar` window driven over
//! D-Bus with `qdbus`. Every call is an independent remote operation.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::desktop::{find_qdbus, run_helper, run_helper_ok};

/// Identity of one open display session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceHandle {
    pub service: String,
    pub object_path: String,
}

impl SurfaceHandle {
    /// Parse `kdialog --progressbar` output: `<service> <object path>`.
    ///
    /// Older kdialog prints only the service; the object path is then `/`.
    pub fn parse(stdout: &str) -> Option<Self> {
        let mut parts = stdout.split_whitespace();
        let service = parts.next()?.to_string();
        let object_path = parts.next().unwrap_or("/").to_string();
        Some(Self {
            service,
            object_path,
        })
    }
}

/// A progress bar hosted outside this process.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DisplaySurface: Send + Sync {
    /// Open a 0–100 bar. `None` means no display is available.
    async fn open(&self, title: &str, label: &str) -> Option<SurfaceHandle>;

    /// Push a value. `false` means the surface is gone.
    async fn update(&self, handle: &SurfaceHandle, value: u8) -> bool;

    /// Replace the label text. Cosmetic; failures are not reported.
    async fn set_label(&self, handle: &SurfaceHandle, label: &str);

    /// Close the bar. Best-effort.
    async fn close(&self, handle: &SurfaceHandle);
}

/// kdialog progress bar controlled through qdbus.
#[derive(Debug, Clone)]
pub struct KdialogSurface {
    kdialog: PathBuf,
    qdbus: Option<PathBuf>,
}

impl KdialogSurface {
    pub fn new(kdialog: impl Into<PathBuf>, qdbus: Option<PathBuf>) -> Self {
        Self {
            kdialog: kdialog.into(),
            qdbus,
        }
    }

    /// Use `kdialog` from PATH and the first qdbus flavour found.
    pub fn detect() -> Self {
        let qdbus = find_qdbus();
        match &qdbus {
            Some(path) => debug!("Using {} for progress updates", path.display()),
            None => info!("No qdbus binary found; cancellation cannot be detected"),
        }
        Self::new("kdialog", qdbus)
    }
}

#[async_trait]
impl DisplaySurface for KdialogSurface {
    async fn open(&self, title: &str, label: &str) -> Option<SurfaceHandle> {
        let output = run_helper(
            &self.kdialog,
            ["--title", title, "--progressbar", label, "100"],
        )
        .await
        .map_err(|e| debug!("kdialog unavailable: {}", e))
        .ok()?;
        SurfaceHandle::parse(&String::from_utf8_lossy(&output.stdout))
    }

    async fn update(&self, handle: &SurfaceHandle, value: u8) -> bool {
        let Some(qdbus) = &self.qdbus else {
            return true;
        };

        let value = value.to_string();
        run_helper_ok(
            qdbus,
            [
                handle.service.as_str(),
                handle.object_path.as_str(),
                "Set",
                "",
                "value",
                value.as_str(),
            ],
        )
        .await
    }

    async fn set_label(&self, handle: &SurfaceHandle, label: &str) {
        if let Some(qdbus) = &self.qdbus {
            run_helper_ok(
                qdbus,
                [
                    handle.service.as_str(),
                    handle.object_path.as_str(),
                    "setLabelText",
                    label,
                ],
            )
            .await;
        }
    }

    async fn close(&self, handle: &SurfaceHandle) {
        if let Some(qdbus) = &self.qdbus {
            run_helper_ok(
                qdbus,
                [handle.service.as_str(), handle.object_path.as_str(), "close"],
            )
            .await;
        }
    }
}
