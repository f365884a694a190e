//! Output formats and their quality menus.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Quality identifier used by formats that have no quality choice.
pub const LOSSLESS_QUALITY: &str = "lossless";

/// A selectable quality option: identifier and human description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityOption {
    pub id: &'static str,
    pub description: &'static str,
}

const fn opt(id: &'static str, description: &'static str) -> QualityOption {
    QualityOption { id, description }
}

const MP3_OPTIONS: &[QualityOption] = &[
    opt("V0", "VBR ~245 kbps (best)"),
    opt("V2", "VBR ~190 kbps"),
    opt("V4", "VBR ~165 kbps"),
    opt("128k", "CBR 128 kbps"),
    opt("192k", "CBR 192 kbps"),
    opt("256k", "CBR 256 kbps"),
    opt("320k", "CBR 320 kbps (max)"),
];

const OGG_OPTIONS: &[QualityOption] = &[
    opt("Q6", "~192 kbps (default)"),
    opt("Q3", "~112 kbps"),
    opt("Q5", "~160 kbps"),
    opt("Q8", "~256 kbps"),
    opt("Q10", "~500 kbps (best)"),
];

const M4A_OPTIONS: &[QualityOption] = &[
    opt("192k", "192 kbps (default)"),
    opt("128k", "128 kbps"),
    opt("256k", "256 kbps"),
    opt("320k", "320 kbps"),
];

const OPUS_OPTIONS: &[QualityOption] = &[
    opt("128k", "128 kbps (default)"),
    opt("64k", "64 kbps (voice)"),
    opt("96k", "96 kbps"),
    opt("192k", "192 kbps"),
    opt("256k", "256 kbps (transparent)"),
];

const FLAC_OPTIONS: &[QualityOption] = &[opt(LOSSLESS_QUALITY, "Lossless")];
const WAV_OPTIONS: &[QualityOption] = &[opt(LOSSLESS_QUALITY, "Lossless (PCM 16-bit)")];
const ALAC_OPTIONS: &[QualityOption] = &[opt(LOSSLESS_QUALITY, "Lossless")];

/// Target container/codec family for a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Mp3,
    Ogg,
    Flac,
    Wav,
    M4a,
    Opus,
    Alac,
}

impl OutputFormat {
    /// All supported formats, in menu order.
    pub const ALL: [OutputFormat; 7] = [
        OutputFormat::Mp3,
        OutputFormat::Ogg,
        OutputFormat::Flac,
        OutputFormat::Wav,
        OutputFormat::M4a,
        OutputFormat::Opus,
        OutputFormat::Alac,
    ];

    /// Format identifier as accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Ogg => "ogg",
            OutputFormat::Flac => "flac",
            OutputFormat::Wav => "wav",
            OutputFormat::M4a => "m4a",
            OutputFormat::Opus => "opus",
            OutputFormat::Alac => "alac",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "MP3",
            OutputFormat::Ogg => "OGG (Vorbis)",
            OutputFormat::Flac => "FLAC",
            OutputFormat::Wav => "WAV",
            OutputFormat::M4a => "M4A (AAC)",
            OutputFormat::Opus => "Opus",
            OutputFormat::Alac => "ALAC (M4A)",
        }
    }

    /// File extension (without the dot). ALAC lives in an M4A container.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::M4a | OutputFormat::Alac => "m4a",
            other => other.as_str(),
        }
    }

    /// Quality menu; the first entry is the default.
    pub fn quality_options(&self) -> &'static [QualityOption] {
        match self {
            OutputFormat::Mp3 => MP3_OPTIONS,
            OutputFormat::Ogg => OGG_OPTIONS,
            OutputFormat::Flac => FLAC_OPTIONS,
            OutputFormat::Wav => WAV_OPTIONS,
            OutputFormat::M4a => M4A_OPTIONS,
            OutputFormat::Opus => OPUS_OPTIONS,
            OutputFormat::Alac => ALAC_OPTIONS,
        }
    }

    pub fn default_quality(&self) -> &'static str {
        self.quality_options()[0].id
    }

    pub fn supports_quality(&self, quality: &str) -> bool {
        self.quality_options().iter().any(|o| o.id == quality)
    }

    /// A format is lossless when `lossless` is its only quality option.
    pub fn is_lossless(&self) -> bool {
        matches!(self.quality_options(), [only] if only.id == LOSSLESS_QUALITY)
    }

    /// Comma separated list of all format identifiers.
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a format identifier is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown format: '{0}'")]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == lower)
            .ok_or(UnknownFormat(lower))
    }
}

/// Display suffix for a quality: ` (V0)`, or empty for lossless.
pub fn quality_suffix(quality: &str) -> String {
    if quality == LOSSLESS_QUALITY {
        String::new()
    } else {
        format!(" ({})", quality)
    }
}
