//! Audio playback and spectral analysis.
//!
//! - `element`: the media element seam (load / play / pause / events)
//! - `device`: the cpal-backed element used by the binary
//! - `decoder`: source resolution and WAV decoding
//! - `transport`: track list state machine over one element
//! - `analyzer`: windowed FFT over the element's output
//! - `stats`: per-frame snapshot reduction

mod analyzer;
mod decoder;
mod device;
mod element;
mod stats;
mod transport;

pub use analyzer::{blackman_window, AnalysisGraph, AnalysisHandle, ContextState, SpectralAnalyzer};
pub use decoder::{decode_wav, load_track, resolve_source, DecodedAudio};
pub use device::DeviceElement;
pub use element::{
    error_message, CrossOrigin, ElementId, GraphError, MediaElement, MediaErrorCode, MediaEvent,
    PlayAttempt, PlayFailure, StreamSource, StreamTap, TapBuffer,
};
pub use stats::{AudioStats, BinPartition};
pub use transport::{LoadPhase, PlaybackSignal, Track, Transport, TransportState};
