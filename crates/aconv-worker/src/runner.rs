//! Conversion task runner.
//!
//! Drives one task from `Pending` to a terminal state: pre-flight checks, one
//! encoder process, the poll loop that forwards progress through the
//! cancellation monitor, and cleanup on every exit path.

use std::time::Instant;

use aconv_media::{discard_partial_output, EncodeProcess, ExitOutcome, FfmpegCommand, ProgressReport};
use aconv_models::{ConversionTask, TaskStatus};
use tracing::{debug, Instrument};

use crate::aggregator::{ProgressAggregator, Slice};
use crate::batch::Collaborators;
use crate::config::ConverterConfig;
use crate::error::TaskError;
use crate::logging::TaskLogger;
use crate::metrics::{self, FailureReason};
use crate::monitor::CancellationMonitor;
use crate::policy::PolicyQuery;

/// How a task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Done,
    /// Rejected by the loss policy; neither failed nor cancelled
    Skipped,
    Failed(TaskError),
    /// The display surface is gone; the batch must stop
    Cancelled,
}

/// `[i/N] <name>`, with long names shortened to `max_chars` plus `…`.
pub fn display_label(index: usize, total: usize, name: &str, max_chars: usize) -> String {
    let shown = if name.chars().count() > max_chars {
        let mut short: String = name.chars().take(max_chars).collect();
        short.push('…');
        short
    } else {
        name.to_string()
    };
    format!("[{}/{}] {}", index + 1, total, shown)
}

/// Shared state of the batch that one task reads and advances.
pub struct TaskScope<'a> {
    pub progress: &'a mut ProgressAggregator,
    pub monitor: &'a mut CancellationMonitor,
}

pub struct TaskRunner<'a> {
    config: &'a ConverterConfig,
    collaborators: &'a Collaborators,
    codec_args: &'a [String],
}

impl<'a> TaskRunner<'a> {
    pub fn new(
        config: &'a ConverterConfig,
        collaborators: &'a Collaborators,
        codec_args: &'a [String],
    ) -> Self {
        Self {
            config,
            collaborators,
            codec_args,
        }
    }

    /// Run task `index` of the batch to a terminal state.
    pub async fn run(
        &self,
        task: &mut ConversionTask,
        index: usize,
        scope: TaskScope<'_>,
    ) -> TaskOutcome {
        let logger = TaskLogger::new(index, scope.progress.total(), task.file_name());
        let span = logger.create_span();
        let outcome = self.execute(task, index, scope, &logger).instrument(span).await;

        let status = match &outcome {
            TaskOutcome::Done => TaskStatus::Done,
            TaskOutcome::Skipped => TaskStatus::Skipped,
            TaskOutcome::Failed(_) => TaskStatus::Failed,
            TaskOutcome::Cancelled => TaskStatus::Cancelled,
        };
        task.transition(status);
        outcome
    }

    async fn execute(
        &self,
        task: &mut ConversionTask,
        index: usize,
        scope: TaskScope<'_>,
        logger: &TaskLogger,
    ) -> TaskOutcome {
        let TaskScope { progress, monitor } = scope;
        let format = task.format.as_str();
        let name = task.file_name();
        let slice = progress.slice(index);
        let label = display_label(
            index,
            progress.total(),
            &name,
            self.config.label_max_chars,
        );

        if !tokio::fs::try_exists(&task.input).await.unwrap_or(false) {
            logger.log_error("input file not found");
            metrics::record_task_failed(format, FailureReason::MissingInput);
            return TaskOutcome::Failed(TaskError::MissingInput(task.input.clone()));
        }

        let codec = self.collaborators.inspector.audio_codec(&task.input).await;
        let query = PolicyQuery::new(codec, task.format);
        if !self.collaborators.policy.accept(&query).await {
            logger.log_warning(&format!("skipped by loss policy (source {})", query.category));
            metrics::record_task_skipped(format);
            return TaskOutcome::Skipped;
        }

        let value = progress.checkpoint(slice.start);
        if !monitor
            .update(value, Some(&format!("Preparing: {label}")))
            .await
            .is_alive()
        {
            return TaskOutcome::Cancelled;
        }

        task.transition(TaskStatus::Running);
        logger.log_start(&format!("→ {}", task.output.display()));

        let report = match ProgressReport::create_in(&self.config.work_dir) {
            Ok(report) => report,
            Err(e) => {
                logger.log_error(&format!("cannot create progress file: {e}"));
                metrics::record_task_failed(format, FailureReason::ProgressFile);
                return TaskOutcome::Failed(TaskError::encode_failure(name, e.to_string()));
            }
        };
        let duration = self.collaborators.inspector.duration(&task.input).await;
        if duration.is_none() {
            logger.log_warning("duration unknown; progress advances only at completion");
        }

        let command = FfmpegCommand::new(&task.input, &task.output)
            .progress_file(report.path())
            .output_args(self.codec_args.iter().cloned());
        let started = Instant::now();
        let mut process = match self.collaborators.encoder.spawn(&command).await {
            Ok(process) => process,
            Err(e) => {
                report.close();
                logger.log_error(&format!("encoder did not start: {e}"));
                metrics::record_task_failed(format, FailureReason::Spawn);
                return TaskOutcome::Failed(TaskError::encode_failure(name, e.to_string()));
            }
        };

        let supervised = Supervision {
            process: process.as_mut(),
            report: &report,
            duration,
            slice,
            label: &label,
            logger,
        }
        .run(self.config, progress, monitor)
        .await;
        report.close();

        match supervised {
            Supervised::Exited(exit) if exit.success() => {
                let value = progress.checkpoint(slice.end);
                // A lost surface here is picked up by the controller through the monitor.
                monitor.update(value, Some(&format!("Done: {label}"))).await;
                let elapsed = started.elapsed().as_secs_f64();
                logger.log_completion(&format!("{:.1}s", elapsed));
                metrics::record_task_completed(format, elapsed);
                TaskOutcome::Done
            }
            Supervised::Exited(exit) => {
                let excerpt = process.diagnostics(self.config.diagnostic_limit).await;
                discard_partial_output(&task.output).await;
                logger.log_error(&format!("encoder exited with {:?}: {}", exit.code, excerpt));
                metrics::record_task_failed(format, FailureReason::EncoderExit);
                TaskOutcome::Failed(TaskError::encode_failure(name, excerpt))
            }
            Supervised::WaitFailed(message) => {
                if let Err(e) = process.kill().await {
                    debug!("kill after wait failure: {}", e);
                }
                discard_partial_output(&task.output).await;
                logger.log_error(&message);
                metrics::record_task_failed(format, FailureReason::Wait);
                TaskOutcome::Failed(TaskError::encode_failure(name, message))
            }
            Supervised::SurfaceLost => {
                discard_partial_output(&task.output).await;
                logger.log_warning("cancelled; encoder terminated and partial output removed");
                TaskOutcome::Cancelled
            }
        }
    }
}

enum Supervised {
    Exited(ExitOutcome),
    WaitFailed(String),
    SurfaceLost,
}

/// The poll loop of one running encoder.
struct Supervision<'p> {
    process: &'p mut dyn EncodeProcess,
    report: &'p ProgressReport,
    duration: Option<f64>,
    slice: Slice,
    label: &'p str,
    logger: &'p TaskLogger,
}

impl Supervision<'_> {
    async fn run(
        mut self,
        config: &ConverterConfig,
        progress: &mut ProgressAggregator,
        monitor: &mut CancellationMonitor,
    ) -> Supervised {
        let converting = format!("Converting: {}", self.label);
        loop {
            match self.process.try_wait() {
                Ok(Some(exit)) => return Supervised::Exited(exit),
                Ok(None) => {}
                Err(e) => return Supervised::WaitFailed(e.to_string()),
            }

            tokio::time::sleep(config.poll_interval).await;

            let fraction = self.report.read_fraction(self.duration).await;
            let Some(value) = progress.advance(self.slice.percent_at(fraction)) else {
                continue;
            };
            self.logger.log_progress(value);

            if !monitor.update(value, Some(&converting)).await.is_alive() {
                if let Err(e) = self.process.kill().await {
                    self.logger.log_warning(&format!("kill failed: {e}"));
                }
                return Supervised::SurfaceLost;
            }
        }
    }
}
