//! Audio encoding arguments per output format.

use serde::{Deserialize, Serialize};

use crate::format::OutputFormat;

/// FLAC compression level used for every FLAC encode.
pub const FLAC_COMPRESSION_LEVEL: u8 = 8;
/// Vorbis quality used when the quality id is not of the `Q<n>` form.
pub const DEFAULT_VORBIS_QUALITY: &str = "6";

/// Encoder settings for one batch: format plus quality identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingConfig {
    pub format: OutputFormat,
    pub quality: String,
}

impl EncodingConfig {
    pub fn new(format: OutputFormat, quality: impl Into<String>) -> Self {
        Self {
            format,
            quality: quality.into(),
        }
    }

    /// Configuration using the format's default quality.
    pub fn with_default_quality(format: OutputFormat) -> Self {
        Self::new(format, format.default_quality())
    }

    /// Convert to FFmpeg output arguments (codec selection and rate control).
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let q = self.quality.as_str();
        let args: Vec<&str> = match self.format {
            OutputFormat::Mp3 => match vbr_level(q) {
                Some(level) => vec!["-codec:a", "libmp3lame", "-q:a", level],
                None => vec!["-codec:a", "libmp3lame", "-b:a", q],
            },
            OutputFormat::Ogg => {
                let level = q.strip_prefix('Q').unwrap_or(DEFAULT_VORBIS_QUALITY);
                vec!["-codec:a", "libvorbis", "-q:a", level]
            }
            OutputFormat::M4a => vec!["-codec:a", "aac", "-b:a", q],
            OutputFormat::Opus => vec!["-codec:a", "libopus", "-b:a", q],
            OutputFormat::Flac => {
                return vec![
                    "-codec:a".to_string(),
                    "flac".to_string(),
                    "-compression_level".to_string(),
                    FLAC_COMPRESSION_LEVEL.to_string(),
                ]
            }
            OutputFormat::Wav => vec!["-codec:a", "pcm_s16le"],
            OutputFormat::Alac => vec!["-codec:a", "alac"],
        };

        args.into_iter().map(String::from).collect()
    }
}

/// `V0`..`V9` selects LAME VBR mode; returns the digit.
fn vbr_level(quality: &str) -> Option<&str> {
    let level = quality.strip_prefix('V')?;
    (level.len() == 1 && level.chars().all(|c| c.is_ascii_digit())).then_some(level)
}
