//! Audio-reactive scenes.
//!
//! Every scene follows the same per-frame contract:
//! 1. shape normalized intensity into a beat (threshold + power curve)
//! 2. smooth it frame over frame ([`BeatEnvelope`])
//! 3. derive its GPU parameters from scene time and the smoothed beat only
//!
//! Without stats every beat term is 0 and scenes keep animating on time alone.
//! Scenes produce plain, `Pod` uniform data; `rendering` owns the GPU side.

mod aurora;
mod beat;
mod galaxy;
mod particles;
mod rain_glass;

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::audio::AudioStats;
use crate::error::VizError;
use crate::params::SceneConfig;

pub use aurora::{AuroraScene, AuroraUniforms};
pub use beat::BeatEnvelope;
pub use galaxy::{GalaxyScene, GalaxyUniforms};
pub use particles::{
    drift, hsl_to_rgb, Drift, ParticleField, ParticleInstance, ParticleScene, ParticleUniforms,
};
pub use rain_glass::{RainGlassScene, RainGlassUniforms};

/// Selected visual theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Theme {
    Stars,
    Rain,
    Snow,
    #[default]
    Halo,
    RainGlass,
    Aurora,
}

impl Theme {
    pub const ALL: [Theme; 6] = [
        Theme::Stars,
        Theme::Rain,
        Theme::Snow,
        Theme::Halo,
        Theme::RainGlass,
        Theme::Aurora,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Theme::Stars => "stars",
            Theme::Rain => "rain",
            Theme::Snow => "snow",
            Theme::Halo => "halo",
            Theme::RainGlass => "rainGlass",
            Theme::Aurora => "aurora",
        }
    }

    /// Particle themes share the galaxy backdrop
    pub fn is_particle(&self) -> bool {
        matches!(self, Theme::Stars | Theme::Rain | Theme::Snow | Theme::Halo)
    }

    fn mount(&self) -> Mount {
        match self {
            Theme::RainGlass => Mount::RainGlass,
            Theme::Aurora => Mount::Aurora,
            _ => Mount::Particles,
        }
    }

    /// Parse a theme name, falling back to the default on unknown input
    pub fn parse_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!("Unknown theme '{}', using {}", name, Theme::default());
            Theme::default()
        })
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Theme {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stars" => Ok(Theme::Stars),
            "rain" => Ok(Theme::Rain),
            "snow" => Ok(Theme::Snow),
            "halo" => Ok(Theme::Halo),
            "rainglass" | "rain-glass" | "rain_glass" => Ok(Theme::RainGlass),
            "aurora" => Ok(Theme::Aurora),
            _ => Err(VizError::Config(format!("unknown theme '{s}'"))),
        }
    }
}

/// Which scene subtree a theme mounts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mount {
    Particles,
    RainGlass,
    Aurora,
}

/// Track mood; only the particle tint reads it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mood {
    Melancholy,
    Happy,
    Dynamic,
    #[default]
    Neutral,
}

impl Mood {
    pub const ALL: [Mood; 4] = [Mood::Melancholy, Mood::Happy, Mood::Dynamic, Mood::Neutral];

    /// Base tint hue (fraction of the colour wheel)
    pub fn base_hue(&self) -> f32 {
        match self {
            Mood::Melancholy => 0.60,
            Mood::Happy => 0.13,
            Mood::Dynamic => 0.92,
            Mood::Neutral => 0.74,
        }
    }

    /// Unknown labels map to `Neutral`
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "melancholy" => Mood::Melancholy,
            "happy" => Mood::Happy,
            "dynamic" => Mood::Dynamic,
            _ => Mood::Neutral,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Mood::Melancholy => Mood::Happy,
            Mood::Happy => Mood::Dynamic,
            Mood::Dynamic => Mood::Neutral,
            Mood::Neutral => Mood::Melancholy,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Mood::Melancholy => "Melancholy",
            Mood::Happy => "Happy",
            Mood::Dynamic => "Dynamic",
            Mood::Neutral => "Neutral",
        };
        f.write_str(label)
    }
}

/// Framebuffer size in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn resolution(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Everything one scene update may read
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// Seconds since the active scene was mounted
    pub time_s: f32,
    pub stats: Option<&'a AudioStats>,
    pub theme: Theme,
    pub mood: Mood,
    pub viewport: Viewport,
}

/// One drawable layer of a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Layer {
    Galaxy(GalaxyUniforms),
    Particles(ParticleUniforms),
    RainGlass(RainGlassUniforms),
    Aurora(AuroraUniforms),
}

/// Back-to-front layers for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FramePlan {
    pub theme: Theme,
    pub layers: Vec<Layer>,
}

impl FramePlan {
    /// No layer could be produced (zero-area viewport)
    pub fn is_skipped(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Shared per-frame contract of every scene
pub trait Scene {
    /// Advance one frame; `None` means the frame is skipped
    fn update(&mut self, input: &FrameInput<'_>) -> Option<Layer>;

    /// Forget smoothing state (on mount)
    fn reset(&mut self);
}

/// Owns the active theme and all scene state
pub struct SceneDirector {
    theme: Theme,
    mood: Mood,
    galaxy: GalaxyScene,
    particles: ParticleScene,
    rain_glass: RainGlassScene,
    aurora: AuroraScene,
    /// Wall time at which the active mount started
    mount_epoch: Option<f32>,
}

impl SceneDirector {
    pub fn new(config: &SceneConfig, theme: Theme, mood: Mood) -> Self {
        Self {
            theme,
            mood,
            galaxy: GalaxyScene::new(config.galaxy.clone()),
            particles: ParticleScene::new(config.particles.clone()),
            rain_glass: RainGlassScene::new(config.rain_glass.clone()),
            aurora: AuroraScene::new(config.aurora.clone()),
            mount_epoch: None,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    /// Point sprites of the particle field (static for the director's lifetime)
    pub fn particle_instances(&self) -> &[ParticleInstance] {
        self.particles.instances()
    }

    /// Swap the active scene; switching within the particle themes keeps its state
    pub fn set_theme(&mut self, theme: Theme) {
        if theme == self.theme {
            return;
        }
        let previous = self.theme;
        self.theme = theme;

        if previous.mount() != theme.mount() {
            debug!(from = %previous, to = %theme, "mounting scene");
            self.mount_epoch = None;
            match theme.mount() {
                Mount::Particles => {
                    self.galaxy.reset();
                    self.particles.reset();
                }
                Mount::RainGlass => self.rain_glass.reset(),
                Mount::Aurora => self.aurora.reset(),
            }
        }
    }

    pub fn set_mood(&mut self, mood: Mood) {
        self.mood = mood;
    }

    /// Advance the active scene(s) and collect this frame's layers
    pub fn plan(&mut self, time_s: f32, stats: Option<&AudioStats>, viewport: Viewport) -> FramePlan {
        let epoch = *self.mount_epoch.get_or_insert(time_s);
        let input = FrameInput {
            time_s: (time_s - epoch).max(0.0),
            stats,
            theme: self.theme,
            mood: self.mood,
            viewport,
        };

        let layers = match self.theme.mount() {
            Mount::Particles => [self.galaxy.update(&input), self.particles.update(&input)]
                .into_iter()
                .flatten()
                .collect(),
            Mount::RainGlass => self.rain_glass.update(&input).into_iter().collect(),
            Mount::Aurora => self.aurora.update(&input).into_iter().collect(),
        };

        FramePlan {
            theme: self.theme,
            layers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_parsing() {
        assert_eq!("aurora".parse::<Theme>().unwrap(), Theme::Aurora);
        assert_eq!("rainGlass".parse::<Theme>().unwrap(), Theme::RainGlass);
        assert_eq!("RAIN-GLASS".parse::<Theme>().unwrap(), Theme::RainGlass);
        assert!("lava".parse::<Theme>().is_err());
        assert_eq!(Theme::parse_or_default("lava"), Theme::Halo);
    }

    #[test]
    fn theme_labels_round_trip() {
        for theme in Theme::ALL {
            assert_eq!(theme.label().parse::<Theme>().unwrap(), theme);
        }
    }

    #[test]
    fn mood_hues() {
        assert_eq!(Mood::from_label("Happy").base_hue(), 0.13);
        assert_eq!(Mood::from_label("melancholy").base_hue(), 0.60);
        assert_eq!(Mood::from_label("Dynamic").base_hue(), 0.92);
        assert_eq!(Mood::from_label("Chill"), Mood::Neutral);
        assert_eq!(Mood::Neutral.base_hue(), 0.74);
    }

    #[test]
    fn mood_cycle_visits_all() {
        let mut mood = Mood::Melancholy;
        for _ in 0..Mood::ALL.len() {
            mood = mood.next();
        }
        assert_eq!(mood, Mood::Melancholy);
    }

    #[test]
    fn particle_themes_layer_galaxy_first() {
        let mut director = SceneDirector::new(&SceneConfig::default(), Theme::Halo, Mood::Neutral);
        let plan = director.plan(0.0, None, Viewport::new(640, 480));
        assert_eq!(plan.layers.len(), 2);
        assert!(matches!(plan.layers[0], Layer::Galaxy(_)));
        assert!(matches!(plan.layers[1], Layer::Particles(_)));
    }

    #[test]
    fn shader_themes_have_one_layer() {
        let mut director = SceneDirector::new(&SceneConfig::default(), Theme::Aurora, Mood::Neutral);
        let plan = director.plan(0.0, None, Viewport::new(640, 480));
        assert_eq!(plan.layers.len(), 1);
        assert!(matches!(plan.layers[0], Layer::Aurora(_)));

        director.set_theme(Theme::RainGlass);
        let plan = director.plan(0.1, None, Viewport::new(640, 480));
        assert!(matches!(plan.layers[..], [Layer::RainGlass(_)]));
    }

    #[test]
    fn zero_viewport_skips_frame() {
        let mut director = SceneDirector::new(&SceneConfig::default(), Theme::Stars, Mood::Happy);
        let plan = director.plan(1.0, None, Viewport::new(0, 480));
        assert!(plan.is_skipped());
    }

    #[test]
    fn scene_time_restarts_on_mount() {
        let mut director = SceneDirector::new(&SceneConfig::default(), Theme::Halo, Mood::Neutral);
        director.plan(10.0, None, Viewport::new(640, 480));
        director.set_theme(Theme::Aurora);

        let plan = director.plan(12.0, None, Viewport::new(640, 480));
        let Layer::Aurora(uniforms) = plan.layers[0] else {
            panic!("expected aurora layer");
        };
        assert_eq!(uniforms.time, 0.0);
    }
}
