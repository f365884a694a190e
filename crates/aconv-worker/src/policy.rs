//! Pre-flight lossy/lossless policy.

use std::path::PathBuf;

use aconv_models::{CodecCategory, OutputFormat};
use async_trait::async_trait;
use tracing::info;

use crate::desktop::run_helper_ok;

/// What the policy is asked about one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyQuery {
    /// Codec reported by the inspector, if any
    pub source_codec: Option<String>,
    pub category: CodecCategory,
    pub target: OutputFormat,
    pub destination_lossless: bool,
}

impl PolicyQuery {
    pub fn new(source_codec: Option<String>, target: OutputFormat) -> Self {
        Self {
            category: CodecCategory::from_codec_name(source_codec.as_deref()),
            source_codec,
            target,
            destination_lossless: target.is_lossless(),
        }
    }

    /// Only lossy sources warrant a confirmation; lossless and unknown sources
    /// are accepted outright.
    pub fn needs_confirmation(&self) -> bool {
        self.category == CodecCategory::Lossy
    }
}

/// Decides whether a task may start. May ask a human.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LossPolicy: Send + Sync {
    async fn accept(&self, query: &PolicyQuery) -> bool;
}

/// Accept every task without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

#[async_trait]
impl LossPolicy for AcceptAll {
    async fn accept(&self, _query: &PolicyQuery) -> bool {
        true
    }
}

/// Ask with a kdialog yes/no warning when re-encoding a lossy source.
#[derive(Debug, Clone)]
pub struct KdialogLossPolicy {
    kdialog: PathBuf,
}

impl Default for KdialogLossPolicy {
    fn default() -> Self {
        Self::new("kdialog")
    }
}

impl KdialogLossPolicy {
    pub fn new(kdialog: impl Into<PathBuf>) -> Self {
        Self {
            kdialog: kdialog.into(),
        }
    }

    fn message(query: &PolicyQuery) -> String {
        let codec = query
            .source_codec
            .as_deref()
            .unwrap_or("unknown")
            .to_uppercase();
        let target = query.target.as_str().to_uppercase();
        if query.destination_lossless {
            format!(
                "<b>Lossy → Lossless conversion</b><br><br>\
                 Source codec: <i>{codec}</i><br>Target format: <i>{target}</i><br><br>\
                 A lossless container cannot restore quality the source already lost; \
                 the output will only be larger.<br><br><b>Convert anyway?</b>"
            )
        } else {
            format!(
                "<b>Lossy → Lossy conversion</b><br><br>\
                 Source codec: <i>{codec}</i><br>Target format: <i>{target}</i><br><br>\
                 Re-encoding between lossy formats degrades quality permanently.<br><br>\
                 <b>Convert anyway?</b>"
            )
        }
    }
}

#[async_trait]
impl LossPolicy for KdialogLossPolicy {
    async fn accept(&self, query: &PolicyQuery) -> bool {
        if !query.needs_confirmation() {
            return true;
        }

        let message = Self::message(query);
        let accepted = run_helper_ok(
            &self.kdialog,
            [
                "--title",
                "Audio Converter - Warning",
                "--warningyesno",
                message.as_str(),
                "--yes-label",
                "Convert",
                "--no-label",
                "Cancel",
            ],
        )
        .await;
        info!(codec = ?query.source_codec, target = %query.target, accepted, "Lossy source confirmation");
        accepted
    }
}
