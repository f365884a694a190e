//! Shared data models for the aconv batch converter.
//!
//! This crate provides Serde-serializable types for:
//! - Output formats and their quality menus
//! - Source codec categories
//! - Encoder argument construction
//! - Conversion tasks, batch requests and batch results

pub mod batch;
pub mod codec;
pub mod encoding;
pub mod format;
pub mod task;

// Re-export common types
pub use batch::{BatchRequest, BatchResult};
pub use codec::CodecCategory;
pub use encoding::EncodingConfig;
pub use format::{quality_suffix, OutputFormat, QualityOption, UnknownFormat, LOSSLESS_QUALITY};
pub use task::{output_path_for, ConversionTask, TaskStatus};
