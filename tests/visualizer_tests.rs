mod common;

use std::time::Instant;

use common::{sine, track, Call, ScriptedElement};
use moodscope::audio::MediaEvent;
use moodscope::params::VisualizerConfig;
use moodscope::scene::{Layer, Mood, Theme, Viewport};
use moodscope::Visualizer;

const VIEW: Viewport = Viewport {
    width: 1280,
    height: 720,
};

fn visualizer(theme: Theme) -> Visualizer<ScriptedElement> {
    Visualizer::new(
        ScriptedElement::new(),
        &VisualizerConfig::default(),
        theme,
        Mood::Neutral,
    )
}

#[test]
fn ambient_frames_without_audio() {
    let mut viz = visualizer(Theme::Halo);
    let now = Instant::now();

    let first = viz.frame(now, 1.0, VIEW);
    let second = viz.frame(now, 2.0, VIEW);

    assert!(viz.last_stats().is_none());
    assert_eq!(first.layers.len(), 2);
    let (Layer::Galaxy(a), Layer::Galaxy(b)) = (first.layers[0], second.layers[0]) else {
        panic!("expected galaxy backdrop");
    };
    assert_eq!(a.beat, 0.0);
    assert!(b.time > a.time);
}

#[test]
fn playback_drives_analysis() {
    let mut viz = visualizer(Theme::Stars);
    viz.set_tracks(vec![track("a")]);
    viz.transport_mut().element_mut().tap.push(&sine(8));
    let now = Instant::now();

    viz.transport_mut().request_play();
    viz.frame(now, 0.0, VIEW);
    assert!(viz.analyzer().is_sampling());
    assert!(viz.last_stats().is_some());

    viz.transport_mut().request_pause();
    viz.frame(now, 0.1, VIEW);
    assert!(!viz.analyzer().is_sampling());
    assert!(viz.last_stats().is_none());

    // Resume keeps the single graph
    viz.transport_mut().request_play();
    viz.frame(now, 0.2, VIEW);
    assert!(viz.last_stats().is_some());
    let opened = viz
        .transport()
        .element()
        .count(|c| matches!(c, Call::OpenStream));
    assert_eq!(opened, 1);
}

#[test]
fn theme_switch_leaves_transport_alone() {
    let mut viz = visualizer(Theme::Halo);
    viz.set_tracks(vec![track("a"), track("b")]);
    let now = Instant::now();

    viz.transport_mut().request_track(1);
    viz.transport_mut().request_play();
    viz.frame(now, 0.0, VIEW);
    viz.transport_mut()
        .element_mut()
        .push(MediaEvent::TimeUpdate(12.5));
    viz.frame(now, 0.5, VIEW);
    let before = viz.state().clone();
    let handle = viz.analyzer().handle();

    viz.set_theme(Theme::Aurora);
    let plan = viz.frame(now, 1.0, VIEW);

    assert!(matches!(plan.layers[..], [Layer::Aurora(_)]));
    assert_eq!(viz.theme(), Theme::Aurora);
    let after = viz.state();
    assert_eq!(after.current_track_index, before.current_track_index);
    assert_eq!(after.is_playing, before.is_playing);
    assert_eq!(after.current_time, before.current_time);
    assert_eq!(viz.analyzer().handle(), handle);
    assert!(viz.analyzer().is_sampling());
}

#[test]
fn mood_cycles_without_touching_theme() {
    let mut viz = visualizer(Theme::Snow);
    viz.cycle_mood();
    assert_eq!(viz.mood(), Mood::Melancholy);
    viz.set_mood(Mood::Dynamic);
    assert_eq!(viz.mood(), Mood::Dynamic);
    assert_eq!(viz.theme(), Theme::Snow);
}

#[test]
fn zero_area_viewport_skips_frame() {
    let mut viz = visualizer(Theme::RainGlass);
    let plan = viz.frame(Instant::now(), 0.0, Viewport::new(0, 0));
    assert!(plan.is_skipped());
}
