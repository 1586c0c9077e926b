use moodscope::audio::{AudioStats, BinPartition};
use moodscope::params::{BeatCurve, SceneConfig};
use moodscope::scene::{BeatEnvelope, Layer, Mood, SceneDirector, Theme, Viewport};
use proptest::prelude::*;

const VIEW: Viewport = Viewport {
    width: 1280,
    height: 720,
};

fn full_scale() -> AudioStats {
    AudioStats::from_bins(&[255; 128], BinPartition::default())
}

/// Beat of the layer that carries one
fn layer_beat(layer: &Layer) -> Option<f32> {
    match layer {
        Layer::Galaxy(u) => Some(u.beat),
        Layer::RainGlass(u) => Some(u.beat),
        Layer::Aurora(u) => Some(u.beat),
        Layer::Particles(_) => None,
    }
}

#[test]
fn envelope_converges_within_bounded_frames() {
    for gain in [0.06, 0.08] {
        let mut env = BeatEnvelope::new(BeatCurve::new(0.3, 1.6, gain));
        for _ in 0..120 {
            env.step(1.0);
        }
        assert!((1.0 - env.value()).abs() < 1e-3, "gain {gain}: {}", env.value());
    }
}

#[test]
fn every_theme_animates_without_stats() {
    let mut director = SceneDirector::new(&SceneConfig::default(), Theme::Stars, Mood::Neutral);
    for theme in Theme::ALL {
        director.set_theme(theme);
        for frame in 0..10 {
            let plan = director.plan(frame as f32 / 60.0, None, VIEW);
            assert!(!plan.is_skipped(), "{theme} skipped a frame");
            for layer in &plan.layers {
                if let Some(beat) = layer_beat(layer) {
                    assert_eq!(beat, 0.0);
                }
            }
        }
    }
}

#[test]
fn galaxy_only_beneath_particle_themes() {
    let mut director = SceneDirector::new(&SceneConfig::default(), Theme::Rain, Mood::Happy);
    for theme in Theme::ALL {
        director.set_theme(theme);
        let plan = director.plan(0.0, None, VIEW);
        let has_galaxy = plan.layers.iter().any(|l| matches!(l, Layer::Galaxy(_)));
        assert_eq!(has_galaxy, theme.is_particle(), "{theme}");
    }
}

#[test]
fn forced_beat_config_is_deterministic() {
    let mut config = SceneConfig::default();
    config.galaxy.beat = BeatCurve::new(0.0, 1.0, 1.0);
    let mut director = SceneDirector::new(&config, Theme::Stars, Mood::Neutral);

    let loud = full_scale();
    let plan = director.plan(0.0, Some(&loud), VIEW);
    let Layer::Galaxy(u) = plan.layers[0] else {
        panic!("expected galaxy backdrop");
    };
    assert_eq!(u.beat, 1.0);
    assert!((u.brightness - 1.02).abs() < 1e-6);
}

#[test]
fn resolution_follows_viewport_each_frame() {
    let mut director = SceneDirector::new(&SceneConfig::default(), Theme::RainGlass, Mood::Neutral);
    for (i, (w, h)) in [(800, 600), (1600, 1200), (1024, 768)].into_iter().enumerate() {
        let plan = director.plan(i as f32, None, Viewport::new(w, h));
        let Layer::RainGlass(u) = plan.layers[0] else {
            panic!("expected rain-glass layer");
        };
        assert_eq!(u.resolution, [w as f32, h as f32]);
    }
}

#[test]
fn theme_switch_resets_incoming_smoothing() {
    let loud = full_scale();
    let mut director = SceneDirector::new(&SceneConfig::default(), Theme::Aurora, Mood::Neutral);
    for frame in 0..60 {
        director.plan(frame as f32 / 60.0, Some(&loud), VIEW);
    }

    director.set_theme(Theme::Halo);
    director.set_theme(Theme::Aurora);
    let plan = director.plan(2.0, None, VIEW);
    let Layer::Aurora(u) = plan.layers[0] else {
        panic!("expected aurora layer");
    };
    assert_eq!(u.beat, 0.0);
}

proptest! {
    #[test]
    fn envelope_approaches_constant_target_monotonically(
        target in 0.0f32..=1.0,
        gain in 0.06f32..=0.08,
    ) {
        let mut env = BeatEnvelope::new(BeatCurve::new(0.3, 1.6, gain));
        let mut previous = env.value();
        for _ in 0..200 {
            let value = env.step(target);
            prop_assert!(value >= previous - 1e-6);
            prop_assert!(value <= target + 1e-6);
            previous = value;
        }
        prop_assert!((target - previous).abs() < 1e-3);
    }

    #[test]
    fn shaped_beat_stays_normalized(intensity in -1.0f32..2.0, threshold in 0.0f32..0.9) {
        let env = BeatEnvelope::new(BeatCurve::new(threshold, 1.7, 0.08));
        let beat = env.shape(intensity);
        prop_assert!((0.0..=1.0).contains(&beat));
        if intensity <= threshold {
            prop_assert_eq!(beat, 0.0);
        }
    }
}
