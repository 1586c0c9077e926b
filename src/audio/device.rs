//! Media element backed by the default audio output device.
//!
//! One cpal output stream is opened for the lifetime of the element. Tracks
//! are decoded on a worker thread and handed back over a channel; the output
//! callback resamples the current track to the device rate and mirrors a mono
//! mix into the analysis tap.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, error, info, warn};

use super::decoder::{load_track, DecodedAudio};
use super::element::{
    CrossOrigin, ElementId, GraphError, MediaElement, MediaErrorCode, MediaEvent, PlayAttempt,
    PlayFailure, StreamSource, TapBuffer,
};
use crate::error::{Result, VizError};

/// Minimum spacing of `TimeUpdate` events
const TIME_UPDATE_INTERVAL: Duration = Duration::from_millis(250);

/// Tap capacity in samples (several analysis windows)
const TAP_CAPACITY: usize = 4096;

/// Messages from the worker and output threads
enum DeviceMessage {
    Loaded {
        generation: u64,
        result: std::result::Result<DecodedAudio, MediaErrorCode>,
    },
    Ended {
        generation: u64,
    },
}

/// State shared with the output callback
struct Playback {
    audio: Option<Arc<DecodedAudio>>,
    /// Cursor in source frames
    position: f64,
    playing: bool,
    generation: u64,
    mono: Vec<f32>,
}

impl Playback {
    fn seconds(&self) -> f64 {
        match &self.audio {
            Some(audio) if audio.sample_rate > 0 => self.position / f64::from(audio.sample_rate),
            _ => 0.0,
        }
    }

    /// Fill one interleaved output block
    fn render(
        &mut self,
        data: &mut [f32],
        channels: usize,
        output_rate: u32,
        tap: &TapBuffer,
        events: &Sender<DeviceMessage>,
    ) {
        data.fill(0.0);
        self.mono.clear();

        let Some(audio) = self.audio.clone() else {
            return;
        };
        if !self.playing {
            return;
        }

        let frames = audio.frames();
        let source_channels = usize::from(audio.channels.max(1));
        let step = f64::from(audio.sample_rate) / f64::from(output_rate.max(1));

        for frame in data.chunks_mut(channels) {
            if self.position >= frames as f64 {
                self.playing = false;
                let _ = events.send(DeviceMessage::Ended {
                    generation: self.generation,
                });
                break;
            }

            let index = self.position as usize;
            let frac = (self.position - index as f64) as f32;
            let next = (index + 1).min(frames.saturating_sub(1));

            let mut mix = 0.0;
            for (ch, out) in frame.iter_mut().enumerate() {
                let src_ch = ch.min(source_channels - 1);
                let a = audio.samples[index * source_channels + src_ch];
                let b = audio.samples[next * source_channels + src_ch];
                *out = a + (b - a) * frac;
                mix += *out;
            }
            self.mono.push(mix / channels as f32);
            self.position += step;
        }

        tap.push(&self.mono);
    }
}

/// Event-loop side of the element: load generations, play attempts and the
/// event queue. Owns no device handle.
struct ElementCore {
    id: ElementId,
    playback: Arc<Mutex<Playback>>,
    tap: Arc<TapBuffer>,
    events_tx: Sender<DeviceMessage>,
    events_rx: Receiver<DeviceMessage>,
    queued: VecDeque<MediaEvent>,
    generation: u64,
    source: Option<String>,
    mode: CrossOrigin,
    loading: bool,
    /// Play requests waiting on the current load
    pending_plays: Vec<PlayAttempt>,
    next_attempt: u64,
    paused: bool,
    stream_connected: bool,
    last_time_update: Instant,
}

impl ElementCore {
    fn new(tap: Arc<TapBuffer>, now: Instant) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            id: ElementId::next(),
            playback: Arc::new(Mutex::new(Playback {
                audio: None,
                position: 0.0,
                playing: false,
                generation: 0,
                mono: Vec::with_capacity(TAP_CAPACITY),
            })),
            tap,
            events_tx,
            events_rx,
            queued: VecDeque::new(),
            generation: 0,
            source: None,
            mode: CrossOrigin::default(),
            loading: false,
            pending_plays: Vec::new(),
            next_attempt: 1,
            paused: true,
            stream_connected: false,
            last_time_update: now,
        }
    }

    fn with_playback<T>(&self, f: impl FnOnce(&mut Playback) -> T) -> Option<T> {
        self.playback.lock().ok().map(|mut playback| f(&mut playback))
    }

    fn reject_pending(&mut self, failure: PlayFailure) {
        for attempt in self.pending_plays.drain(..) {
            self.queued.push_back(MediaEvent::PlayResolved {
                attempt,
                result: Err(failure.clone()),
            });
        }
    }

    /// Drop the current track and invalidate in-flight work
    fn reset(&mut self) {
        self.generation += 1;
        self.reject_pending(PlayFailure::Aborted);
        let generation = self.generation;
        self.with_playback(|playback| {
            playback.audio = None;
            playback.position = 0.0;
            playback.playing = false;
            playback.generation = generation;
        });
        self.tap.clear();
        self.loading = false;
        self.paused = true;
    }

    /// Switch to `url`; returns the generation its decode result must carry
    fn begin_load(&mut self, url: &str, mode: CrossOrigin) -> u64 {
        self.reset();
        self.tap.set_opaque(mode == CrossOrigin::Disabled);
        self.source = Some(url.to_string());
        self.mode = mode;
        self.loading = true;
        self.generation
    }

    fn clear_source(&mut self) {
        self.reset();
        self.source = None;
    }

    /// Begin output and resolve `attempt`
    fn start(&mut self, attempt: PlayAttempt) {
        let started = self
            .with_playback(|playback| {
                let Some(audio) = &playback.audio else {
                    return false;
                };
                if playback.position >= audio.frames() as f64 {
                    playback.position = 0.0;
                }
                playback.playing = true;
                true
            })
            .unwrap_or(false);

        if !started {
            self.queued.push_back(MediaEvent::PlayResolved {
                attempt,
                result: Err(PlayFailure::NotAllowed("no playable source".into())),
            });
            return;
        }

        if self.paused {
            self.paused = false;
            self.queued.push_back(MediaEvent::Play);
        }
        self.queued.push_back(MediaEvent::PlayResolved {
            attempt,
            result: Ok(()),
        });
    }

    fn handle_message(&mut self, message: DeviceMessage) {
        match message {
            DeviceMessage::Loaded { generation, result } if generation == self.generation => {
                self.loading = false;
                match result {
                    Ok(audio) => {
                        let duration = audio.duration();
                        debug!(
                            element = %self.id,
                            duration,
                            channels = audio.channels,
                            sample_rate = audio.sample_rate,
                            "track decoded"
                        );
                        let audio = Arc::new(audio);
                        self.with_playback(|playback| {
                            playback.audio = Some(audio);
                            playback.position = 0.0;
                        });
                        self.queued.push_back(MediaEvent::DurationChange(duration));
                        self.queued.push_back(MediaEvent::LoadedData);
                        for attempt in std::mem::take(&mut self.pending_plays) {
                            self.start(attempt);
                        }
                    }
                    Err(code) => {
                        self.queued.push_back(MediaEvent::Error(Some(code)));
                        self.reject_pending(PlayFailure::NotAllowed(code.message()));
                    }
                }
            }
            DeviceMessage::Ended { generation } if generation == self.generation => {
                self.paused = true;
                let time = self.with_playback(|p| p.seconds()).unwrap_or(0.0);
                self.queued.push_back(MediaEvent::TimeUpdate(time));
                self.queued.push_back(MediaEvent::Pause);
                self.queued.push_back(MediaEvent::Ended);
            }
            _ => debug!(element = %self.id, "dropping stale device message"),
        }
    }

    fn play(&mut self) -> PlayAttempt {
        let attempt = PlayAttempt(self.next_attempt);
        self.next_attempt += 1;

        if self.source.is_none() {
            self.queued.push_back(MediaEvent::PlayResolved {
                attempt,
                result: Err(PlayFailure::NotAllowed("no source".into())),
            });
        } else if self.loading {
            self.pending_plays.push(attempt);
        } else {
            self.start(attempt);
        }
        attempt
    }

    fn pause(&mut self) {
        self.reject_pending(PlayFailure::Aborted);
        self.with_playback(|playback| playback.playing = false);
        if !self.paused {
            self.paused = true;
            self.queued.push_back(MediaEvent::Pause);
        }
    }

    fn set_position(&mut self, seconds: f64) {
        let time = self.with_playback(|playback| {
            let audio = playback.audio.as_ref()?;
            let frame = (seconds.max(0.0) * f64::from(audio.sample_rate)).min(audio.frames() as f64);
            playback.position = frame;
            Some(playback.seconds())
        });
        match time.flatten() {
            Some(time) => self.queued.push_back(MediaEvent::TimeUpdate(time)),
            None => warn!(element = %self.id, seconds, "seek ignored, no decoded source"),
        }
    }

    fn poll_event_at(&mut self, now: Instant) -> Option<MediaEvent> {
        while let Ok(message) = self.events_rx.try_recv() {
            self.handle_message(message);
        }

        if !self.paused
            && now.saturating_duration_since(self.last_time_update) >= TIME_UPDATE_INTERVAL
        {
            self.last_time_update = now;
            if let Some(time) = self.with_playback(|p| p.seconds()) {
                self.queued.push_back(MediaEvent::TimeUpdate(time));
            }
        }

        self.queued.pop_front()
    }

    fn open_stream_source(&mut self) -> std::result::Result<StreamSource, GraphError> {
        if self.stream_connected {
            return Err(GraphError::AlreadyConnected);
        }
        self.stream_connected = true;
        Ok(StreamSource {
            element: self.id,
            tap: self.tap.clone(),
        })
    }
}

/// The live "now playing" element
pub struct DeviceElement {
    core: ElementCore,

    /// Output stream (kept alive)
    _stream: cpal::Stream,
}

impl DeviceElement {
    /// Open the default output device and start its (silent) stream
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| VizError::Audio("No audio output device found".into()))?;

        let config = device
            .default_output_config()
            .map_err(|e| VizError::Audio(format!("Failed to get audio config: {e}")))?;

        let output_rate = config.sample_rate().0;
        let channels = usize::from(config.channels().max(1));
        info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate = output_rate,
            channels,
            "audio output opened"
        );

        let core = ElementCore::new(
            Arc::new(TapBuffer::new(TAP_CAPACITY, output_rate)),
            Instant::now(),
        );

        let callback_playback = Arc::clone(&core.playback);
        let callback_tap = Arc::clone(&core.tap);
        let callback_tx = core.events_tx.clone();

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    match callback_playback.lock() {
                        Ok(mut playback) => {
                            playback.render(data, channels, output_rate, &callback_tap, &callback_tx)
                        }
                        Err(_) => data.fill(0.0),
                    }
                },
                |err| error!("Audio stream error: {err}"),
                None,
            )
            .map_err(|e| VizError::Audio(format!("Failed to build audio stream: {e}")))?;

        stream
            .play()
            .map_err(|e| VizError::Audio(format!("Failed to start audio stream: {e}")))?;

        Ok(Self {
            core,
            _stream: stream,
        })
    }
}

impl MediaElement for DeviceElement {
    fn id(&self) -> ElementId {
        self.core.id
    }

    fn load(&mut self, url: &str, mode: CrossOrigin) {
        let generation = self.core.begin_load(url, mode);
        let url = url.to_string();
        let tx = self.core.events_tx.clone();
        debug!(element = %self.core.id, %url, ?mode, generation, "loading track");
        thread::spawn(move || {
            let result = load_track(&url);
            let _ = tx.send(DeviceMessage::Loaded { generation, result });
        });
    }

    fn clear_source(&mut self) {
        self.core.clear_source();
    }

    fn has_source(&self) -> bool {
        self.core.source.is_some()
    }

    fn cross_origin(&self) -> CrossOrigin {
        self.core.mode
    }

    fn play(&mut self) -> PlayAttempt {
        self.core.play()
    }

    fn pause(&mut self) {
        self.core.pause();
    }

    fn is_paused(&self) -> bool {
        self.core.paused
    }

    fn set_position(&mut self, seconds: f64) {
        self.core.set_position(seconds);
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        self.core.poll_event_at(Instant::now())
    }

    fn open_stream_source(&mut self) -> std::result::Result<StreamSource, GraphError> {
        self.core.open_stream_source()
    }
}
