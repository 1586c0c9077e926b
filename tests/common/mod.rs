#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use moodscope::audio::{
    CrossOrigin, ElementId, GraphError, MediaElement, MediaEvent, PlayAttempt, PlayFailure,
    StreamSource, TapBuffer, Track,
};

/// Calls a transport made on the element, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(String, CrossOrigin),
    ClearSource,
    Play(PlayAttempt),
    Pause,
    SetPosition(f64),
    OpenStream,
}

/// Scripted media element: records calls, replays queued events.
///
/// With `auto_resolve` every play request succeeds on the next poll;
/// otherwise attempts stay in flight until [`ScriptedElement::resolve`].
pub struct ScriptedElement {
    id: ElementId,
    pub calls: Vec<Call>,
    events: VecDeque<MediaEvent>,
    source: Option<String>,
    mode: CrossOrigin,
    paused: bool,
    next_attempt: u64,
    pending: Vec<PlayAttempt>,
    auto_resolve: bool,
    stream_opened: bool,
    pub stream_error: Option<GraphError>,
    pub tap: Arc<TapBuffer>,
}

impl ScriptedElement {
    pub fn new() -> Self {
        Self {
            id: ElementId::next(),
            calls: Vec::new(),
            events: VecDeque::new(),
            source: None,
            mode: CrossOrigin::Anonymous,
            paused: true,
            next_attempt: 1,
            pending: Vec::new(),
            auto_resolve: true,
            stream_opened: false,
            stream_error: None,
            tap: Arc::new(TapBuffer::new(1024, 48_000)),
        }
    }

    /// Play attempts stay pending until resolved by the test
    pub fn manual() -> Self {
        Self {
            auto_resolve: false,
            ..Self::new()
        }
    }

    pub fn push(&mut self, event: MediaEvent) {
        self.events.push_back(event);
    }

    /// Settle an in-flight attempt the way a platform would
    pub fn resolve(&mut self, attempt: PlayAttempt, result: Result<(), PlayFailure>) {
        self.pending.retain(|&a| a != attempt);
        if result.is_ok() && self.paused {
            self.paused = false;
            self.events.push_back(MediaEvent::Play);
        }
        self.events
            .push_back(MediaEvent::PlayResolved { attempt, result });
    }

    pub fn pending_attempts(&self) -> &[PlayAttempt] {
        &self.pending
    }

    pub fn loads(&self) -> Vec<(String, CrossOrigin)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Load(url, mode) => Some((url.clone(), *mode)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| wanted(c)).count()
    }

    fn abort_pending(&mut self) {
        for attempt in std::mem::take(&mut self.pending) {
            self.events.push_back(MediaEvent::PlayResolved {
                attempt,
                result: Err(PlayFailure::Aborted),
            });
        }
    }
}

impl MediaElement for ScriptedElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn load(&mut self, url: &str, mode: CrossOrigin) {
        self.calls.push(Call::Load(url.to_string(), mode));
        self.abort_pending();
        self.source = Some(url.to_string());
        self.mode = mode;
        self.paused = true;
    }

    fn clear_source(&mut self) {
        self.calls.push(Call::ClearSource);
        self.abort_pending();
        self.source = None;
        self.paused = true;
    }

    fn has_source(&self) -> bool {
        self.source.is_some()
    }

    fn cross_origin(&self) -> CrossOrigin {
        self.mode
    }

    fn play(&mut self) -> PlayAttempt {
        let attempt = PlayAttempt(self.next_attempt);
        self.next_attempt += 1;
        self.calls.push(Call::Play(attempt));

        if self.source.is_none() {
            self.events.push_back(MediaEvent::PlayResolved {
                attempt,
                result: Err(PlayFailure::NotAllowed("no source".into())),
            });
        } else if self.auto_resolve {
            self.resolve(attempt, Ok(()));
        } else {
            self.pending.push(attempt);
        }
        attempt
    }

    fn pause(&mut self) {
        self.calls.push(Call::Pause);
        self.abort_pending();
        if !self.paused {
            self.paused = true;
            self.events.push_back(MediaEvent::Pause);
        }
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_position(&mut self, seconds: f64) {
        self.calls.push(Call::SetPosition(seconds));
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        self.events.pop_front()
    }

    fn open_stream_source(&mut self) -> Result<StreamSource, GraphError> {
        self.calls.push(Call::OpenStream);
        if let Some(err) = self.stream_error.clone() {
            return Err(err);
        }
        if self.stream_opened {
            return Err(GraphError::AlreadyConnected);
        }
        self.stream_opened = true;
        Ok(StreamSource {
            element: self.id,
            tap: self.tap.clone(),
        })
    }
}

pub fn track(name: &str) -> Track {
    Track {
        id: name.to_string(),
        title: name.to_string(),
        artist: "Test Artist".to_string(),
        duration_s: 30.0,
        preview_url: Some(format!("file:///music/{name}.wav")),
    }
}

/// A track without a playable stream
pub fn silent_track(name: &str) -> Track {
    Track {
        preview_url: None,
        ..track(name)
    }
}

/// 256 samples of a full-scale sine at bin `bin`
pub fn sine(bin: usize) -> Vec<f32> {
    (0..256)
        .map(|i| (2.0 * std::f32::consts::PI * bin as f32 * i as f32 / 256.0).sin())
        .collect()
}
