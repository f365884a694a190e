//! Source codec classification.

use serde::{Deserialize, Serialize};

/// Whether a source codec discards information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CodecCategory {
    Lossy,
    Lossless,
    #[default]
    Unknown,
}

impl CodecCategory {
    /// Classify an ffprobe codec name. Missing or unrecognised names are `Unknown`.
    pub fn from_codec_name(codec: Option<&str>) -> Self {
        let Some(codec) = codec else {
            return CodecCategory::Unknown;
        };

        match codec.trim().to_lowercase().as_str() {
            "mp3" | "vorbis" | "aac" | "opus" | "wmav1" | "wmav2" | "ac3" | "eac3" | "mp2"
            | "amrnb" | "amrwb" | "wmavoice" => CodecCategory::Lossy,
            "flac" | "alac" | "wavpack" | "ape" | "tta" | "truehd" | "mlp" | "pcm_s16le"
            | "pcm_s24le" | "pcm_s32le" | "pcm_f32le" | "pcm_f64le" | "pcm_s16be" => {
                CodecCategory::Lossless
            }
            _ => CodecCategory::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CodecCategory::Lossy => "lossy",
            CodecCategory::Lossless => "lossless",
            CodecCategory::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CodecCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
