//! Batch controller: runs the tasks of one request strictly in order.

use std::sync::Arc;

use aconv_media::{Encoder, FfmpegEncoder, FfprobeInspector, MediaInspector};
use aconv_models::{BatchRequest, BatchResult};
use tracing::{info, warn};

use crate::aggregator::ProgressAggregator;
use crate::config::ConverterConfig;
use crate::metrics;
use crate::monitor::CancellationMonitor;
use crate::notify::{DesktopNotifier, LogNotifier, Notifier};
use crate::policy::{AcceptAll, KdialogLossPolicy, LossPolicy};
use crate::report::FinalReport;
use crate::runner::{TaskOutcome, TaskRunner, TaskScope};
use crate::surface::{DisplaySurface, KdialogSurface};

/// External collaborators of a batch.
#[derive(Clone)]
pub struct Collaborators {
    pub inspector: Arc<dyn MediaInspector>,
    pub encoder: Arc<dyn Encoder>,
    pub surface: Arc<dyn DisplaySurface>,
    pub policy: Arc<dyn LossPolicy>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    /// ffmpeg/ffprobe plus the KDE desktop helpers.
    ///
    /// Without kdialog there is nobody to ask about lossy sources, so every
    /// task is accepted. Without notify-send the final report goes to the log.
    pub fn desktop(config: &ConverterConfig) -> Self {
        let policy: Arc<dyn LossPolicy> = match which::which("kdialog") {
            Ok(path) => Arc::new(KdialogLossPolicy::new(path)),
            Err(_) => {
                warn!("kdialog not found; lossy sources are converted without confirmation");
                Arc::new(AcceptAll)
            }
        };

        let notifier: Arc<dyn Notifier> = match which::which("notify-send") {
            Ok(_) => Arc::new(DesktopNotifier::default()),
            Err(_) => Arc::new(LogNotifier),
        };

        Self {
            inspector: Arc::new(FfprobeInspector::new(
                config.ffprobe_bin.clone(),
                config.probe_timeout,
            )),
            encoder: Arc::new(
                FfmpegEncoder::new(config.ffmpeg_bin.clone()).with_work_dir(config.work_dir.clone()),
            ),
            surface: Arc::new(KdialogSurface::detect()),
            policy,
            notifier,
        }
    }
}

pub struct BatchController {
    config: ConverterConfig,
    collaborators: Collaborators,
}

impl BatchController {
    pub fn new(config: ConverterConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Run the batch and deliver the final report.
    pub async fn run(&self, request: &BatchRequest) -> BatchResult {
        let result = self.execute(request).await;
        FinalReport::build(request, &result)
            .emit(self.collaborators.notifier.as_ref())
            .await;
        result
    }

    /// Run the batch without reporting.
    pub async fn execute(&self, request: &BatchRequest) -> BatchResult {
        let mut tasks = request.tasks();
        let total = tasks.len();
        let mut result = BatchResult::new(total);
        if total == 0 {
            return result;
        }

        info!(
            total,
            format = %request.format,
            quality = %request.quality,
            "Starting batch"
        );

        let mut progress = ProgressAggregator::new(total);
        let mut monitor = CancellationMonitor::open(
            self.collaborators.surface.clone(),
            &request.display_title(),
            &format!("Starting… (0 of {total})"),
            self.config.surface_call_timeout,
        )
        .await;
        let runner = TaskRunner::new(&self.config, &self.collaborators, &request.codec_args);

        for (index, task) in tasks.iter_mut().enumerate() {
            let scope = TaskScope {
                progress: &mut progress,
                monitor: &mut monitor,
            };
            let outcome = runner.run(task, index, scope).await;

            match &outcome {
                TaskOutcome::Done => result.done += 1,
                TaskOutcome::Skipped => result.skipped += 1,
                TaskOutcome::Failed(err) => result.errors.push(err.to_string()),
                TaskOutcome::Cancelled => {}
            }

            if outcome == TaskOutcome::Cancelled || monitor.is_lost() {
                result.cancelled = true;
                result.cancelled_at = Some(index + 1);
                break;
            }
        }

        if !result.cancelled {
            let value = progress.checkpoint(100);
            if !monitor.update(value, Some("Finished")).await.is_alive() {
                warn!("Progress display lost after the last task");
            }
        }
        monitor.close().await;

        if result.cancelled {
            metrics::record_batch_cancelled();
        }
        info!(
            done = result.done,
            failed = result.errors.len(),
            skipped = result.skipped,
            cancelled = result.cancelled,
            "Batch finished"
        );
        result
    }
}
