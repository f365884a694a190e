//! FFmpeg/FFprobe CLI wrapper for audio conversion.
//!
//! This crate provides:
//! - Duration and codec probing through ffprobe (`MediaInspector`)
//! - Type-safe FFmpeg command building
//! - Non-blocking encoder process supervision (`Encoder`, `EncodeProcess`)
//! - The side-file progress channel written by `-progress <file>`
//! - Partial-output cleanup

pub mod command;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod progress;

pub use command::{
    check_ffmpeg, check_ffprobe, truncate_on_char_boundary, EncodeProcess, Encoder, ExitOutcome,
    FfmpegCommand, FfmpegEncoder, FfmpegProcess,
};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{discard_partial_output, remove_partial_output};
pub use probe::{parse_duration, FfprobeInspector, MediaInspector, DEFAULT_PROBE_TIMEOUT};
pub use progress::{elapsed_fraction, parse_latest_elapsed_us, ProgressReport};
