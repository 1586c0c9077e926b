//! Playback transport.
//!
//! Owns the single "now playing" element over an ordered track list. Callers
//! only express intent (`request_play`, `request_track`, ...) and read back a
//! [`TransportState`] snapshot; element events are applied in [`Transport::poll`]
//! once per frame.
//!
//! Recovery policies:
//! - a source or decode rejection on a cross-origin load is retried once with
//!   cross-origin disabled (audio still plays, the analysis tap goes silent)
//! - any other failure is terminal for the track: the message is surfaced,
//!   playback stops and the next track is loaded after a fixed delay

use std::path::Path;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::element::{
    error_message, CrossOrigin, MediaElement, MediaErrorCode, MediaEvent, PlayAttempt,
    PlayFailure,
};
use crate::params::TransportConfig;

/// A playable track descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Catalog duration (seconds); the element's reported duration wins
    pub duration_s: f64,
    pub preview_url: Option<String>,
}

impl Track {
    /// Descriptor for a local audio file
    pub fn local(path: &Path) -> Self {
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id: path.display().to_string(),
            title,
            artist: String::new(),
            duration_s: 0.0,
            preview_url: Some(format!("file://{}", path.display())),
        }
    }
}

/// Per-track load cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
    Errored,
}

/// Read-only transport snapshot
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransportState {
    pub current_track_index: usize,
    pub is_playing: bool,
    /// Playback position (seconds)
    pub current_time: f64,
    /// Track length (seconds); 0 until known
    pub duration: f64,
    /// User-facing message for the last terminal failure
    pub audio_error: Option<String>,
    pub phase: LoadPhase,
}

/// Output edges the analyzer lifecycle follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSignal {
    Started,
    Stopped,
}

pub struct Transport<E: MediaElement> {
    element: E,
    config: TransportConfig,
    tracks: Vec<Track>,
    state: TransportState,
    /// One-shot cross-origin retry guard, reset on track change
    retried: bool,
    play_attempt: Option<PlayAttempt>,
    /// Pause requested while a play attempt was in flight
    pending_pause: bool,
    /// Auto-advance deadline after a terminal error
    pending_advance: Option<Instant>,
    resume_after_advance: bool,
    element_playing: bool,
    signals: Vec<PlaybackSignal>,
}

impl<E: MediaElement> Transport<E> {
    pub fn new(element: E, config: TransportConfig) -> Self {
        Self {
            element,
            config,
            tracks: Vec::new(),
            state: TransportState::default(),
            retried: false,
            play_attempt: None,
            pending_pause: false,
            pending_advance: None,
            resume_after_advance: false,
            element_playing: false,
            signals: Vec::new(),
        }
    }

    pub fn state(&self) -> &TransportState {
        &self.state
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.get(self.state.current_track_index)
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut E {
        &mut self.element
    }

    /// Whether an error auto-advance is scheduled
    pub fn advance_pending(&self) -> bool {
        self.pending_advance.is_some()
    }

    /// Replace the track list and load its first entry
    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        info!(count = tracks.len(), "track list replaced");
        self.tracks = tracks;
        self.state.current_track_index = 0;
        if self.tracks.is_empty() {
            self.state.is_playing = false;
            self.pending_advance = None;
            self.element.clear_source();
            self.mark_stopped();
            self.state.phase = LoadPhase::Idle;
        } else {
            self.load_current();
        }
    }

    /// Select a track by index; out-of-range requests are ignored
    pub fn request_track(&mut self, index: usize) {
        if index >= self.tracks.len() {
            warn!(index, len = self.tracks.len(), "track index out of range");
            return;
        }
        self.state.current_track_index = index;
        self.load_current();
    }

    pub fn request_play(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        self.state.is_playing = true;
        self.issue_play();
    }

    pub fn request_pause(&mut self) {
        self.state.is_playing = false;
        if self.play_attempt.is_some() {
            self.pending_pause = true;
        } else {
            self.element.pause();
        }
    }

    pub fn toggle_play(&mut self) {
        if self.state.is_playing {
            self.request_pause();
        } else {
            self.request_play();
        }
    }

    /// Next track (clamped at the end), with play intent
    pub fn next(&mut self) {
        let Some(last) = self.tracks.len().checked_sub(1) else {
            return;
        };
        let target = (self.state.current_track_index + 1).min(last);
        self.skip_to(target);
    }

    /// Previous track (clamped at the start), with play intent
    pub fn prev(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        let target = self.state.current_track_index.saturating_sub(1);
        self.skip_to(target);
    }

    /// Move the playback position; a no-op until the duration is known
    pub fn request_seek(&mut self, seconds: f64) {
        let duration = self.state.duration;
        if !(duration.is_finite() && duration > 0.0) || !seconds.is_finite() {
            debug!(seconds, duration, "seek ignored");
            return;
        }
        let target = seconds.clamp(0.0, duration);
        self.element.set_position(target);
        self.state.current_time = target;
    }

    /// Apply pending element events and timers
    pub fn poll(&mut self, now: Instant) -> Vec<PlaybackSignal> {
        while let Some(event) = self.element.poll_event() {
            self.handle_event(event, now);
        }
        self.tick(now);
        std::mem::take(&mut self.signals)
    }

    /// Fire the error auto-advance once its deadline passes
    pub fn tick(&mut self, now: Instant) {
        let Some(deadline) = self.pending_advance else {
            return;
        };
        if now < deadline {
            return;
        }
        self.pending_advance = None;

        let next = self.state.current_track_index + 1;
        if next < self.tracks.len() {
            info!(index = next, "advancing after track error");
            self.state.current_track_index = next;
            self.state.is_playing = self.resume_after_advance;
            self.load_current();
        }
        self.resume_after_advance = false;
    }

    pub fn handle_event(&mut self, event: MediaEvent, now: Instant) {
        match event {
            MediaEvent::Play => {
                self.state.is_playing = true;
                self.state.phase = LoadPhase::Playing;
                if !self.element_playing {
                    self.element_playing = true;
                    self.signals.push(PlaybackSignal::Started);
                }
            }
            MediaEvent::Pause => {
                self.state.is_playing = false;
                if !matches!(self.state.phase, LoadPhase::Ended | LoadPhase::Errored) {
                    self.state.phase = LoadPhase::Paused;
                }
                self.mark_stopped();
            }
            MediaEvent::LoadedData => {
                self.state.audio_error = None;
                if self.state.phase == LoadPhase::Loading {
                    self.state.phase = LoadPhase::Ready;
                }
                if self.state.is_playing && self.element.is_paused() && self.play_attempt.is_none() {
                    self.issue_play();
                }
            }
            MediaEvent::DurationChange(duration) => {
                self.state.duration = if duration.is_finite() && duration > 0.0 {
                    duration
                } else {
                    0.0
                };
            }
            MediaEvent::TimeUpdate(time) => {
                if time.is_finite() {
                    self.state.current_time = time;
                }
            }
            MediaEvent::Ended => self.on_ended(),
            MediaEvent::Error(code) => self.on_error(code, now),
            MediaEvent::PlayResolved { attempt, result } => self.on_play_resolved(attempt, result),
        }
    }

    fn skip_to(&mut self, target: usize) {
        self.state.is_playing = true;
        if target == self.state.current_track_index {
            self.issue_play();
        } else {
            self.request_track(target);
        }
    }

    /// Reset per-track state and load the current index
    fn load_current(&mut self) {
        self.pending_advance = None;
        self.resume_after_advance = false;
        self.retried = false;
        self.play_attempt = None;
        self.pending_pause = false;
        self.state.audio_error = None;
        self.state.current_time = 0.0;
        self.state.duration = 0.0;
        self.state.phase = LoadPhase::Idle;

        let index = self.state.current_track_index;
        let url = self.tracks.get(index).and_then(|t| t.preview_url.clone());
        match url {
            Some(url) => {
                debug!(index, %url, "loading track");
                self.element.load(&url, CrossOrigin::Anonymous);
                self.state.phase = LoadPhase::Loading;
                if self.state.is_playing {
                    self.issue_play();
                }
            }
            None => {
                debug!(index, "track has no playable url");
                self.element.clear_source();
                self.state.is_playing = false;
                self.mark_stopped();
            }
        }
    }

    fn issue_play(&mut self) {
        self.pending_pause = false;
        if self.play_attempt.is_some() || !self.element.has_source() {
            return;
        }
        self.play_attempt = Some(self.element.play());
    }

    fn mark_stopped(&mut self) {
        if self.element_playing {
            self.element_playing = false;
            self.signals.push(PlaybackSignal::Stopped);
        }
    }

    fn on_play_resolved(&mut self, attempt: PlayAttempt, result: Result<(), PlayFailure>) {
        if self.play_attempt != Some(attempt) {
            debug!(?attempt, "stale play attempt resolved");
            return;
        }
        self.play_attempt = None;

        match result {
            Ok(()) => {
                if self.pending_pause {
                    self.pending_pause = false;
                    self.element.pause();
                }
            }
            Err(PlayFailure::Aborted) => {
                debug!(?attempt, "play attempt superseded");
            }
            Err(PlayFailure::NotAllowed(reason)) => {
                warn!(%reason, "playback did not start");
                self.pending_pause = false;
                self.state.is_playing = false;
            }
        }
    }

    fn on_ended(&mut self) {
        self.state.is_playing = false;
        self.state.current_time = 0.0;
        self.state.phase = LoadPhase::Ended;
        self.mark_stopped();

        let next = self.state.current_track_index + 1;
        if next < self.tracks.len() {
            self.state.current_track_index = next;
            self.state.is_playing = true;
            self.load_current();
        } else {
            debug!("end of track list");
            self.element.set_position(0.0);
        }
    }

    fn on_error(&mut self, code: Option<MediaErrorCode>, now: Instant) {
        let retryable = matches!(
            code,
            Some(MediaErrorCode::SrcNotSupported | MediaErrorCode::Decode)
        );
        let url = self.current_track().and_then(|t| t.preview_url.clone());

        if let Some(url) = url.filter(|_| {
            self.config.cross_origin_retry
                && retryable
                && !self.retried
                && self.element.cross_origin() == CrossOrigin::Anonymous
        }) {
            warn!(%url, "source rejected with cross-origin enabled, retrying without it");
            self.retried = true;
            self.play_attempt = None;
            self.state.current_time = 0.0;
            self.state.duration = 0.0;
            self.element.load(&url, CrossOrigin::Disabled);
            self.state.phase = LoadPhase::Loading;
            if self.state.is_playing {
                self.issue_play();
            }
            return;
        }

        let message = error_message(code);
        error!(
            code = code.map(|c| c.code()),
            index = self.state.current_track_index,
            "{message}"
        );
        self.resume_after_advance = self.state.is_playing || self.element_playing;
        self.state.audio_error = Some(message);
        self.state.is_playing = false;
        self.state.phase = LoadPhase::Errored;
        self.pending_pause = false;
        self.element.pause();
        self.mark_stopped();
        self.pending_advance = Some(now + self.config.error_advance_delay());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_track_uses_file_stem() {
        let track = Track::local(Path::new("/music/night drive.wav"));
        assert_eq!(track.title, "night drive");
        assert_eq!(
            track.preview_url.as_deref(),
            Some("file:///music/night drive.wav")
        );
    }

    #[test]
    fn default_state_is_idle() {
        let state = TransportState::default();
        assert_eq!(state.phase, LoadPhase::Idle);
        assert!(!state.is_playing);
        assert_eq!(state.duration, 0.0);
        assert!(state.audio_error.is_none());
    }
}
