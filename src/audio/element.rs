//! Media element abstraction.
//!
//! A [`MediaElement`] is the single "now playing" audio output: it loads one
//! source at a time, plays and pauses asynchronously, and reports what
//! happened through [`MediaEvent`]s that the transport polls once per frame.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one media element for its whole lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(u64);

impl ElementId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Stream fetch mode.
///
/// `Anonymous` exposes decoded samples to the analysis tap. Some sources
/// reject it; `Disabled` still plays but the tap reports silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossOrigin {
    #[default]
    Anonymous,
    Disabled,
}

/// Handle for one asynchronous play request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayAttempt(pub u64);

/// Why a play request did not start playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayFailure {
    /// Superseded by a newer load or pause
    Aborted,
    /// Refused by the element (no source, device failure, ...)
    NotAllowed(String),
}

/// Failure codes reported by a media element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaErrorCode {
    Aborted,
    Network,
    Decode,
    SrcNotSupported,
    Other(u16),
}

impl MediaErrorCode {
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::Aborted,
            2 => Self::Network,
            3 => Self::Decode,
            4 => Self::SrcNotSupported,
            other => Self::Other(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::Aborted => 1,
            Self::Network => 2,
            Self::Decode => 3,
            Self::SrcNotSupported => 4,
            Self::Other(code) => *code,
        }
    }

    /// User-facing description
    pub fn message(&self) -> String {
        match self {
            Self::Aborted => "Audio loading aborted".to_string(),
            Self::Network => "Network error loading audio".to_string(),
            Self::Decode => "Audio decode failed".to_string(),
            Self::SrcNotSupported => "Audio format not supported or invalid URL".to_string(),
            Self::Other(code) => format!("Audio error (code: {code})"),
        }
    }
}

/// Message for an error event that may not carry a code
pub fn error_message(code: Option<MediaErrorCode>) -> String {
    match code {
        Some(code) => code.message(),
        None => "Audio loading failed".to_string(),
    }
}

/// Events emitted by a media element
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Playback actually started
    Play,
    /// Playback actually paused
    Pause,
    /// Enough data is decoded to start playback
    LoadedData,
    /// Duration is known (seconds)
    DurationChange(f64),
    /// Playback position advanced (seconds)
    TimeUpdate(f64),
    /// The cursor passed the last frame
    Ended,
    /// Loading or playback failed
    Error(Option<MediaErrorCode>),
    /// A play request settled
    PlayResolved {
        attempt: PlayAttempt,
        result: Result<(), PlayFailure>,
    },
}

/// Errors building an analysis tap on an element
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("a stream source is already connected to this element")]
    AlreadyConnected,

    #[error("audio analysis unsupported: {0}")]
    Unsupported(String),
}

/// Read side of the samples an element is currently outputting
pub trait StreamTap: Send + Sync {
    fn sample_rate(&self) -> u32;

    /// Copy the most recent mono samples into the tail of `out`.
    ///
    /// Returns how many samples were available; missing samples are zeroed.
    fn copy_latest(&self, out: &mut [f32]) -> usize;
}

/// The one-per-element connection from an element to an analysis graph
#[derive(Clone)]
pub struct StreamSource {
    pub element: ElementId,
    pub tap: Arc<dyn StreamTap>,
}

impl fmt::Debug for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSource")
            .field("element", &self.element)
            .field("sample_rate", &self.tap.sample_rate())
            .finish()
    }
}

/// A single audio output slot with asynchronous load / play semantics
pub trait MediaElement {
    fn id(&self) -> ElementId;

    /// Start loading `url`; aborts any in-flight play request
    fn load(&mut self, url: &str, mode: CrossOrigin);

    /// Drop the current source
    fn clear_source(&mut self);

    fn has_source(&self) -> bool;

    /// Fetch mode of the current source
    fn cross_origin(&self) -> CrossOrigin;

    /// Request playback; the outcome arrives as `MediaEvent::PlayResolved`
    fn play(&mut self) -> PlayAttempt;

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    /// Move the playback cursor (seconds)
    fn set_position(&mut self, seconds: f64);

    /// Next pending event, if any
    fn poll_event(&mut self) -> Option<MediaEvent>;

    /// Connect the element's output to an analysis tap.
    ///
    /// Succeeds at most once per element.
    fn open_stream_source(&mut self) -> Result<StreamSource, GraphError>;
}

/// Bounded mono sample ring shared between an output callback and the analyzer
pub struct TapBuffer {
    samples: Mutex<VecDeque<f32>>,
    capacity: usize,
    sample_rate: u32,
    opaque: AtomicBool,
}

impl TapBuffer {
    pub fn new(capacity: usize, sample_rate: u32) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            sample_rate,
            opaque: AtomicBool::new(false),
        }
    }

    /// Append output samples, dropping the oldest beyond capacity
    pub fn push(&self, chunk: &[f32]) {
        let Ok(mut samples) = self.samples.lock() else {
            return;
        };
        for &sample in chunk {
            if samples.len() == self.capacity {
                samples.pop_front();
            }
            samples.push_back(sample);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut samples) = self.samples.lock() {
            samples.clear();
        }
    }

    /// Opaque taps report silence (non-cross-origin sources)
    pub fn set_opaque(&self, opaque: bool) {
        self.opaque.store(opaque, Ordering::Relaxed);
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque.load(Ordering::Relaxed)
    }
}

impl StreamTap for TapBuffer {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn copy_latest(&self, out: &mut [f32]) -> usize {
        out.fill(0.0);
        if self.is_opaque() {
            return 0;
        }
        let Ok(samples) = self.samples.lock() else {
            return 0;
        };
        let available = samples.len().min(out.len());
        let offset = out.len() - available;
        let start = samples.len() - available;
        for (slot, &sample) in out[offset..].iter_mut().zip(samples.range(start..)) {
            *slot = sample;
        }
        available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_round_trip_platform_numbers() {
        for code in 1..=4 {
            assert_eq!(MediaErrorCode::from_code(code).code(), code);
        }
        assert_eq!(MediaErrorCode::from_code(42), MediaErrorCode::Other(42));
    }

    #[test]
    fn error_messages() {
        assert_eq!(MediaErrorCode::Aborted.message(), "Audio loading aborted");
        assert_eq!(MediaErrorCode::Network.message(), "Network error loading audio");
        assert_eq!(MediaErrorCode::Decode.message(), "Audio decode failed");
        assert_eq!(
            MediaErrorCode::SrcNotSupported.message(),
            "Audio format not supported or invalid URL"
        );
        assert_eq!(MediaErrorCode::Other(7).message(), "Audio error (code: 7)");
        assert_eq!(error_message(None), "Audio loading failed");
    }

    #[test]
    fn element_ids_are_unique() {
        assert_ne!(ElementId::next(), ElementId::next());
    }

    #[test]
    fn tap_copies_latest_samples_right_aligned() {
        let tap = TapBuffer::new(8, 48_000);
        tap.push(&[1.0, 2.0, 3.0]);

        let mut out = [9.0; 5];
        assert_eq!(tap.copy_latest(&mut out), 3);
        assert_eq!(out, [0.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn tap_drops_oldest_beyond_capacity() {
        let tap = TapBuffer::new(4, 48_000);
        tap.push(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let mut out = [0.0; 4];
        tap.copy_latest(&mut out);
        assert_eq!(out, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn opaque_tap_reports_silence() {
        let tap = TapBuffer::new(4, 48_000);
        tap.push(&[0.5; 4]);
        tap.set_opaque(true);

        let mut out = [1.0; 4];
        assert_eq!(tap.copy_latest(&mut out), 0);
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
