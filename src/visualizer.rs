//! Composition of transport, analyzer and scenes.
//!
//! One [`Visualizer::frame`] call per display frame:
//! 1. apply element events and timers (transport)
//! 2. follow play/pause edges (analyzer lifecycle)
//! 3. sample one spectrum snapshot
//! 4. plan the active scene's layers

use std::time::Instant;

use tracing::debug;

use crate::audio::{
    AudioStats, MediaElement, PlaybackSignal, SpectralAnalyzer, Track, Transport, TransportState,
};
use crate::params::VisualizerConfig;
use crate::scene::{FramePlan, Mood, SceneDirector, Theme, Viewport};

pub struct Visualizer<E: MediaElement> {
    transport: Transport<E>,
    analyzer: SpectralAnalyzer,
    director: SceneDirector,
    last_stats: Option<AudioStats>,
}

impl<E: MediaElement> Visualizer<E> {
    pub fn new(element: E, config: &VisualizerConfig, theme: Theme, mood: Mood) -> Self {
        Self {
            transport: Transport::new(element, config.transport.clone()),
            analyzer: SpectralAnalyzer::new(config.analysis.clone()),
            director: SceneDirector::new(&config.scenes, theme, mood),
            last_stats: None,
        }
    }

    /// Advance one display frame
    pub fn frame(&mut self, now: Instant, time_s: f32, viewport: Viewport) -> FramePlan {
        for signal in self.transport.poll(now) {
            match signal {
                PlaybackSignal::Started => self.analyzer.on_play(self.transport.element_mut()),
                PlaybackSignal::Stopped => self.analyzer.on_pause(),
            }
        }

        self.last_stats = self.analyzer.sample();
        self.director
            .plan(time_s, self.last_stats.as_ref(), viewport)
    }

    /// Swap the mounted scene; playback and analysis are untouched
    pub fn set_theme(&mut self, theme: Theme) {
        if theme != self.director.theme() {
            debug!(%theme, "theme selected");
        }
        self.director.set_theme(theme);
    }

    pub fn set_mood(&mut self, mood: Mood) {
        self.director.set_mood(mood);
    }

    pub fn cycle_mood(&mut self) {
        let mood = self.director.mood().next();
        debug!(%mood, "mood selected");
        self.director.set_mood(mood);
    }

    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        self.transport.set_tracks(tracks);
    }

    /// Stop sampling before the host goes away
    pub fn shutdown(&mut self) {
        self.analyzer.detach_sampling();
    }

    pub fn state(&self) -> &TransportState {
        self.transport.state()
    }

    /// Stats of the last frame (`None` while paused or without analysis)
    pub fn last_stats(&self) -> Option<&AudioStats> {
        self.last_stats.as_ref()
    }

    pub fn theme(&self) -> Theme {
        self.director.theme()
    }

    pub fn mood(&self) -> Mood {
        self.director.mood()
    }

    pub fn transport(&self) -> &Transport<E> {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut Transport<E> {
        &mut self.transport
    }

    pub fn analyzer(&self) -> &SpectralAnalyzer {
        &self.analyzer
    }

    pub fn director(&self) -> &SceneDirector {
        &self.director
    }
}
