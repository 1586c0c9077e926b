//! Milky-way backdrop beneath the particle themes.

use bytemuck::{Pod, Zeroable};

use super::{BeatEnvelope, FrameInput, Layer, Scene, Theme};
use crate::params::GalaxyConfig;

/// Uniform buffer for the galaxy shader
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GalaxyUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub beat: f32,
    pub tint: f32,
    pub brightness: f32,
    pub _padding: [f32; 2],
}

pub struct GalaxyScene {
    config: GalaxyConfig,
    beat: BeatEnvelope,
}

impl GalaxyScene {
    pub fn new(config: GalaxyConfig) -> Self {
        let beat = BeatEnvelope::new(config.beat);
        Self { config, beat }
    }
}

impl Scene for GalaxyScene {
    fn update(&mut self, input: &FrameInput<'_>) -> Option<Layer> {
        if input.viewport.is_empty() {
            return None;
        }
        let beat = self.beat.update(input.stats);
        let tint = if input.theme == Theme::Halo {
            self.config.halo_tint
        } else {
            self.config.default_tint
        };

        Some(Layer::Galaxy(GalaxyUniforms {
            resolution: input.viewport.resolution(),
            time: input.time_s * self.config.time_scale,
            beat,
            tint,
            brightness: self.config.base_brightness + beat * self.config.beat_brightness,
            _padding: [0.0; 2],
        }))
    }

    fn reset(&mut self) {
        self.beat.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Mood, Viewport};

    fn input(theme: Theme) -> FrameInput<'static> {
        FrameInput {
            time_s: 4.0,
            stats: None,
            theme,
            mood: Mood::Neutral,
            viewport: Viewport::new(800, 600),
        }
    }

    #[test]
    fn uniform_size_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<GalaxyUniforms>() % 16, 0);
    }

    #[test]
    fn halo_uses_cooler_tint() {
        let mut scene = GalaxyScene::new(GalaxyConfig::default());
        let Some(Layer::Galaxy(halo)) = scene.update(&input(Theme::Halo)) else {
            panic!("expected galaxy layer");
        };
        let Some(Layer::Galaxy(stars)) = scene.update(&input(Theme::Stars)) else {
            panic!("expected galaxy layer");
        };
        assert_eq!(halo.tint, 0.78);
        assert_eq!(stars.tint, 0.62);
    }

    #[test]
    fn ambient_frame_is_time_driven() {
        let mut scene = GalaxyScene::new(GalaxyConfig::default());
        let Some(Layer::Galaxy(u)) = scene.update(&input(Theme::Stars)) else {
            panic!("expected galaxy layer");
        };
        assert_eq!(u.beat, 0.0);
        assert_eq!(u.time, 2.0);
        assert_eq!(u.brightness, 0.9);
        assert_eq!(u.resolution, [800.0, 600.0]);
    }
}
