//! Batch audio conversion worker.
//!
//! This crate provides:
//! - Batch controller and per-task runner
//! - Global progress aggregation
//! - Cancellation detection through the progress display
//! - Loss policy, notifications and the final report

pub mod aggregator;
pub mod batch;
pub mod cli;
pub mod config;
pub mod desktop;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod monitor;
pub mod notify;
pub mod policy;
pub mod report;
pub mod runner;
pub mod surface;

pub use aggregator::{ProgressAggregator, Slice};
pub use batch::{BatchController, Collaborators};
pub use cli::Cli;
pub use config::ConverterConfig;
pub use error::{TaskError, WorkerError, WorkerResult};
pub use logging::TaskLogger;
pub use monitor::{CancellationMonitor, Liveness};
pub use notify::{DesktopNotifier, LogNotifier, Notification, Notifier};
pub use policy::{AcceptAll, KdialogLossPolicy, LossPolicy, PolicyQuery};
pub use report::FinalReport;
pub use runner::{display_label, TaskOutcome, TaskRunner};
pub use surface::{DisplaySurface, KdialogSurface, SurfaceHandle};
