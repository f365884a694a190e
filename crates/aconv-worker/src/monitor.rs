//! Cancellation detection through the display surface.
//!
//! There is no direct cancel event. The user closing or cancelling the progress
//! window makes the next remote update fail, and so does the display service
//! crashing or hanging past the call timeout. Those causes cannot be told
//! apart, so all of them map to [`Liveness::CancelledOrSurfaceLost`] and take
//! the same abort path.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::surface::{DisplaySurface, SurfaceHandle};

/// Result of forwarding one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    CancelledOrSurfaceLost,
}

impl Liveness {
    pub fn is_alive(&self) -> bool {
        matches!(self, Liveness::Alive)
    }
}

/// Owns the single display session of a batch.
pub struct CancellationMonitor {
    surface: Arc<dyn DisplaySurface>,
    handle: Option<SurfaceHandle>,
    call_timeout: Duration,
    lost: bool,
    closed: bool,
}

impl CancellationMonitor {
    /// Open the display session. Never fails: without a display the monitor
    /// reports alive for the rest of the batch.
    pub async fn open(
        surface: Arc<dyn DisplaySurface>,
        title: &str,
        label: &str,
        call_timeout: Duration,
    ) -> Self {
        let handle = match tokio::time::timeout(call_timeout, surface.open(title, label)).await {
            Ok(handle) => handle,
            Err(_) => {
                warn!("Opening the progress display timed out after {:?}", call_timeout);
                None
            }
        };

        match &handle {
            Some(h) => debug!(service = %h.service, path = %h.object_path, "Progress display opened"),
            None => debug!("No progress display; cancellation cannot be detected"),
        }

        Self {
            surface,
            handle,
            call_timeout,
            lost: false,
            closed: false,
        }
    }

    /// True once any update has reported the surface gone.
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// Forward a value (and optional label) to the display.
    ///
    /// Only the value call decides liveness: if it fails or times out, the
    /// surface is gone. The label follows under its own timeout and its
    /// outcome is ignored. Once lost, the monitor stays lost and makes no
    /// further remote calls.
    pub async fn update(&mut self, value: u8, label: Option<&str>) -> Liveness {
        if self.lost {
            return Liveness::CancelledOrSurfaceLost;
        }
        if self.closed {
            return Liveness::Alive;
        }
        let Some(handle) = &self.handle else {
            return Liveness::Alive;
        };

        let call = self.surface.update(handle, value);
        let alive = match tokio::time::timeout(self.call_timeout, call).await {
            Ok(alive) => alive,
            Err(_) => {
                warn!(value, "Progress display update timed out after {:?}", self.call_timeout);
                false
            }
        };

        if !alive {
            warn!(value, "Progress display is gone; treating as cancellation");
            self.lost = true;
            return Liveness::CancelledOrSurfaceLost;
        }

        if let Some(label) = label {
            let call = self.surface.set_label(handle, label);
            if tokio::time::timeout(self.call_timeout, call).await.is_err() {
                debug!("Progress label update timed out; ignored");
            }
        }
        Liveness::Alive
    }

    /// Close the display. Only the first call has any effect.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(handle) = &self.handle {
            if tokio::time::timeout(self.call_timeout, self.surface.close(handle))
                .await
                .is_err()
            {
                warn!("Closing the progress display timed out");
            }
        }
    }
}
