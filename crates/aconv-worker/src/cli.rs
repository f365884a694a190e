//! Command-line arguments and request validation.

use std::path::PathBuf;

use aconv_models::{BatchRequest, EncodingConfig, OutputFormat};
use clap::Parser;

use crate::error::{WorkerError, WorkerResult};

/// Convert audio files to another format.
#[derive(Debug, Parser)]
#[command(name = "aconv", version, about)]
pub struct Cli {
    /// Target format (mp3, ogg, flac, wav, m4a, opus, alac)
    #[arg(short, long)]
    pub format: String,

    /// Quality preset; defaults to the format's first option
    #[arg(short, long)]
    pub quality: Option<String>,

    /// Input files, converted in the given order
    pub files: Vec<PathBuf>,
}

impl Cli {
    /// Validate the arguments and build the batch request.
    pub fn into_request(self) -> WorkerResult<BatchRequest> {
        let format: OutputFormat = self
            .format
            .parse()
            .map_err(|_| WorkerError::UnknownFormat(self.format.clone()))?;

        if self.files.is_empty() {
            return Err(WorkerError::NoInputs);
        }

        let encoding = match self.quality {
            Some(quality) if !format.supports_quality(&quality) => {
                return Err(WorkerError::UnsupportedQuality {
                    format: format.to_string(),
                    quality,
                });
            }
            Some(quality) => EncodingConfig::new(format, quality),
            None => EncodingConfig::with_default_quality(format),
        };

        Ok(BatchRequest::from_encoding(self.files, &encoding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("aconv").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_default_quality() {
        let request = parse(&["--format", "MP3", "a.flac"]).into_request().unwrap();
        assert_eq!(request.format, OutputFormat::Mp3);
        assert_eq!(request.quality, "V0");
        assert_eq!(request.codec_args, vec!["-codec:a", "libmp3lame", "-q:a", "0"]);
    }

    #[test]
    fn test_explicit_quality() {
        let request = parse(&["-f", "opus", "-q", "96k", "a.wav", "b.wav"])
            .into_request()
            .unwrap();
        assert_eq!(request.inputs.len(), 2);
        assert_eq!(request.quality, "96k");
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(
            parse(&["--format", "aiff", "a.wav"]).into_request(),
            Err(WorkerError::UnknownFormat(f)) if f == "aiff"
        ));
        assert!(matches!(
            parse(&["--format", "flac"]).into_request(),
            Err(WorkerError::NoInputs)
        ));
        assert!(matches!(
            parse(&["--format", "flac", "--quality", "320k", "a.wav"]).into_request(),
            Err(WorkerError::UnsupportedQuality { .. })
        ));
    }
}
