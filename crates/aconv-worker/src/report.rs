//! End-of-batch report: at most one dialog and one notification per run.

use aconv_models::{quality_suffix, BatchRequest, BatchResult};

use crate::notify::{Notification, Notifier};

/// What the user is told once the batch is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalReport {
    Cancelled(Notification),
    FinishedWithErrors {
        dialog_title: String,
        dialog_body: String,
        notification: Notification,
    },
    Done(Notification),
    /// Nothing converted and nothing failed (e.g. every task was skipped)
    Silent,
}

impl FinalReport {
    pub fn build(request: &BatchRequest, result: &BatchResult) -> Self {
        if result.cancelled {
            let at = result.cancelled_at.unwrap_or(result.done + 1);
            return FinalReport::Cancelled(Notification::new(
                "Audio Converter - Cancelled",
                format!("Cancelled on file {} of {}", at, result.total),
                "dialog-cancel",
            ));
        }

        if result.has_errors() {
            return FinalReport::FinishedWithErrors {
                dialog_title: "Audio Converter - Errors".to_string(),
                dialog_body: result.summary(),
                notification: Notification::new(
                    "Audio Converter - Finished with errors",
                    format!(
                        "{}/{} converted, {} failed.",
                        result.done,
                        result.total,
                        result.errors.len()
                    ),
                    "dialog-error",
                ),
            };
        }

        if result.done > 0 {
            let plural = if result.done == 1 { "" } else { "s" };
            return FinalReport::Done(Notification::new(
                "Audio Converter - Done",
                format!(
                    "✔  {} file{} → {}{}",
                    result.done,
                    plural,
                    request.format.as_str().to_uppercase(),
                    quality_suffix(&request.quality)
                ),
                "audio-x-generic",
            ));
        }

        FinalReport::Silent
    }

    /// Deliver the report through the notifier.
    pub async fn emit(&self, notifier: &dyn Notifier) {
        match self {
            FinalReport::Cancelled(notification) | FinalReport::Done(notification) => {
                notifier.notify(notification).await;
            }
            FinalReport::FinishedWithErrors {
                dialog_title,
                dialog_body,
                notification,
            } => {
                notifier.error_dialog(dialog_title, dialog_body).await;
                notifier.notify(notification).await;
            }
            FinalReport::Silent => {}
        }
    }
}
