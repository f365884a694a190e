//! User-facing notifications. Fire-and-forget: nothing is read back.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::desktop::run_helper_ok;

/// Application name shown by the notification daemon.
pub const APP_NAME: &str = "Audio Converter";

/// A desktop notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: icon.into(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Show a passive notification.
    async fn notify(&self, notification: &Notification);

    /// Show a modal error message.
    async fn error_dialog(&self, title: &str, message: &str);
}

/// `notify-send` for notifications and `kdialog --error` for dialogs.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    notify_send: PathBuf,
    kdialog: PathBuf,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self {
            notify_send: PathBuf::from("notify-send"),
            kdialog: PathBuf::from("kdialog"),
        }
    }
}

impl DesktopNotifier {
    pub fn new(notify_send: impl Into<PathBuf>, kdialog: impl Into<PathBuf>) -> Self {
        Self {
            notify_send: notify_send.into(),
            kdialog: kdialog.into(),
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, notification: &Notification) {
        debug!(title = %notification.title, "Sending notification");
        run_helper_ok(
            &self.notify_send,
            [
                "-i",
                notification.icon.as_str(),
                "-a",
                APP_NAME,
                notification.title.as_str(),
                notification.body.as_str(),
            ],
        )
        .await;
    }

    async fn error_dialog(&self, title: &str, message: &str) {
        run_helper_ok(&self.kdialog, ["--title", title, "--error", message]).await;
    }
}

/// Writes notifications to the log only; for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) {
        tracing::info!(title = %notification.title, "{}", notification.body);
    }

    async fn error_dialog(&self, title: &str, message: &str) {
        tracing::error!(title, "{}", message);
    }
}
