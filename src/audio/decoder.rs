//! Track source resolution and WAV decoding.

use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader};

use super::element::MediaErrorCode;
use crate::error::Result;

/// Fully decoded PCM for one track
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Interleaved samples in [-1, 1]
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Map a track URL to a local file.
///
/// `file://` URLs and bare paths are accepted. Remote schemes cannot be
/// fetched by this player and report `SrcNotSupported`; a missing file
/// reports `Network`, as a failed fetch would.
pub fn resolve_source(url: &str) -> std::result::Result<PathBuf, MediaErrorCode> {
    let url = url.trim();
    if url.is_empty() {
        return Err(MediaErrorCode::SrcNotSupported);
    }

    let path = if let Some(rest) = url.strip_prefix("file://") {
        PathBuf::from(rest)
    } else if url.contains("://") {
        return Err(MediaErrorCode::SrcNotSupported);
    } else {
        PathBuf::from(url)
    };

    if !path.is_file() {
        return Err(MediaErrorCode::Network);
    }
    Ok(path)
}

/// Decode a WAV file into interleaved f32 samples
pub fn decode_wav(path: &Path) -> Result<DecodedAudio> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok(DecodedAudio {
        samples,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}

/// Resolve and decode, reducing any failure to a media error code
pub fn load_track(url: &str) -> std::result::Result<DecodedAudio, MediaErrorCode> {
    let path = resolve_source(url)?;
    decode_wav(&path).map_err(|err| {
        tracing::debug!(path = %path.display(), "decode failed: {err}");
        match err {
            crate::error::VizError::Io(_) => MediaErrorCode::Network,
            crate::error::VizError::Decode(hound::Error::Unsupported) => {
                MediaErrorCode::SrcNotSupported
            }
            _ => MediaErrorCode::Decode,
        }
    })
}
