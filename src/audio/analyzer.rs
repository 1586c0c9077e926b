//! Spectral analyzer.
//!
//! Taps the playing element once, runs a short windowed FFT over the most
//! recent output samples each frame, and reduces the byte spectrum into an
//! [`AudioStats`] snapshot.
//!
//! Attachment is modelled as a capability: the first successful attach on an
//! element yields an [`AnalysisHandle`], and every later attach on the same
//! element returns that handle without touching the element again (an element
//! can only ever feed one graph). If the platform cannot provide a tap the
//! analyzer latches into a degraded state and returns `None` forever.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use tracing::{debug, warn};

use super::element::{ElementId, GraphError, MediaElement, StreamSource, StreamTap};
use super::stats::AudioStats;
use crate::params::AnalyzerConfig;

/// Capability token for the single analysis graph of one element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnalysisHandle {
    id: u64,
    element: ElementId,
}

impl AnalysisHandle {
    pub fn element(&self) -> ElementId {
        self.element
    }
}

/// Processing context state; sampling requires `Running`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextState {
    #[default]
    Suspended,
    Running,
}

/// Tap → windowed FFT → byte spectrum, with the analyser-node defaults
pub struct AnalysisGraph {
    handle: AnalysisHandle,
    tap: Arc<dyn StreamTap>,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    time_domain: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    smoothing: f32,
    min_db: f32,
    max_db: f32,
}

impl AnalysisGraph {
    fn new(handle: AnalysisHandle, source: StreamSource, config: &AnalyzerConfig) -> Self {
        let size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            handle,
            tap: source.tap,
            fft,
            window: (0..size).map(|i| blackman_window(i, size)).collect(),
            time_domain: vec![0.0; size],
            spectrum: vec![Complex::new(0.0, 0.0); size],
            scratch,
            smoothed: vec![0.0; config.bin_count()],
            smoothing: config.smoothing_time_constant,
            min_db: config.min_decibels,
            max_db: config.max_decibels,
        }
    }

    pub fn handle(&self) -> AnalysisHandle {
        self.handle
    }

    pub fn bin_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Fill `out` with byte magnitudes of the latest transform
    pub fn read_byte_frequency_data(&mut self, out: &mut [u8]) {
        self.tap.copy_latest(&mut self.time_domain);

        for ((slot, &sample), &w) in self
            .spectrum
            .iter_mut()
            .zip(&self.time_domain)
            .zip(&self.window)
        {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let norm = 1.0 / self.spectrum.len() as f32;
        let range = self.max_db - self.min_db;

        for (k, (smoothed, byte)) in self.smoothed.iter_mut().zip(out.iter_mut()).enumerate() {
            let magnitude = self.spectrum[k].norm() * norm;
            let mut value = self.smoothing * *smoothed + (1.0 - self.smoothing) * magnitude;
            if !value.is_finite() {
                value = 0.0;
            }
            *smoothed = value;

            let db = 20.0 * value.max(f32::MIN_POSITIVE).log10();
            let scaled = (255.0 / range) * (db - self.min_db);
            *byte = scaled.clamp(0.0, 255.0) as u8;
        }
    }
}

/// Blackman window (alpha = 0.16)
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let x = index as f32 / size as f32;
    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
}

/// Converts the playing stream into per-frame [`AudioStats`]
pub struct SpectralAnalyzer {
    config: AnalyzerConfig,
    context: ContextState,
    graph: Option<AnalysisGraph>,
    bins: Vec<u8>,
    sampling: bool,
    degraded: bool,
    next_handle: u64,
}

impl SpectralAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let bins = vec![0; config.bin_count()];
        Self {
            config,
            context: ContextState::Suspended,
            graph: None,
            bins,
            sampling: false,
            degraded: false,
            next_handle: 1,
        }
    }

    /// Attach to `element`, building its graph on first use.
    ///
    /// Idempotent per element. Returns `None` when no graph can exist.
    pub fn attach(&mut self, element: &mut dyn MediaElement) -> Option<AnalysisHandle> {
        if self.degraded {
            return None;
        }
        if let Some(graph) = &self.graph {
            if graph.handle.element == element.id() {
                return Some(graph.handle);
            }
        }

        match element.open_stream_source() {
            Ok(source) => {
                let handle = AnalysisHandle {
                    id: self.next_handle,
                    element: source.element,
                };
                self.next_handle += 1;
                debug!(
                    element = %handle.element,
                    fft_size = self.config.fft_size,
                    sample_rate = source.tap.sample_rate(),
                    "analysis graph attached"
                );
                self.graph = Some(AnalysisGraph::new(handle, source, &self.config));
                Some(handle)
            }
            Err(GraphError::AlreadyConnected) => {
                warn!(element = %element.id(), "element already feeds another graph, not re-attaching");
                None
            }
            Err(err @ GraphError::Unsupported(_)) => {
                warn!("analysis disabled: {err}");
                self.degraded = true;
                self.sampling = false;
                None
            }
        }
    }

    /// Resume a suspended context before sampling
    pub fn resume_context(&mut self) {
        if self.context == ContextState::Suspended {
            debug!("resuming analysis context");
            self.context = ContextState::Running;
        }
    }

    /// Playback started: resume, attach (once) and start sampling
    pub fn on_play(&mut self, element: &mut dyn MediaElement) {
        self.resume_context();
        self.sampling = self.attach(element).is_some();
    }

    /// Playback stopped: cancel sampling
    pub fn on_pause(&mut self) {
        self.sampling = false;
    }

    /// Unmount: stop sampling; the graph stays bound to its element
    pub fn detach_sampling(&mut self) {
        if self.sampling {
            debug!("analysis sampling detached");
        }
        self.sampling = false;
    }

    /// Latest snapshot, or `None` when not sampling or no graph exists
    pub fn sample(&mut self) -> Option<AudioStats> {
        if !self.sampling || self.context != ContextState::Running {
            return None;
        }
        let graph = self.graph.as_mut()?;
        graph.read_byte_frequency_data(&mut self.bins);
        Some(AudioStats::from_bins(&self.bins, self.config.partition))
    }

    pub fn handle(&self) -> Option<AnalysisHandle> {
        self.graph.as_ref().map(AnalysisGraph::handle)
    }

    pub fn is_sampling(&self) -> bool {
        self.sampling
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn context_state(&self) -> ContextState {
        self.context
    }
}
