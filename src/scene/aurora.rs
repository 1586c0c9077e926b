//! Aurora sky scene.

use bytemuck::{Pod, Zeroable};

use super::{BeatEnvelope, FrameInput, Layer, Scene};
use crate::params::AuroraConfig;

/// Uniform buffer for the aurora shader
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct AuroraUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub beat: f32,
    pub star_density: f32,
    pub intensity: f32,
    pub cool_tone_mix: f32,
    pub drift_scale: f32,
    pub streak_count: f32,
    pub _padding: [f32; 3],
}

pub struct AuroraScene {
    config: AuroraConfig,
    beat: BeatEnvelope,
}

impl AuroraScene {
    pub fn new(config: AuroraConfig) -> Self {
        let beat = BeatEnvelope::new(config.beat);
        Self { config, beat }
    }
}

impl Scene for AuroraScene {
    fn update(&mut self, input: &FrameInput<'_>) -> Option<Layer> {
        if input.viewport.is_empty() {
            return None;
        }
        let beat = self.beat.update(input.stats);

        Some(Layer::Aurora(AuroraUniforms {
            resolution: input.viewport.resolution(),
            time: input.time_s * self.config.time_scale,
            beat,
            star_density: self.config.star_density.max(1.0),
            intensity: self.config.intensity,
            cool_tone_mix: self.config.cool_tone_mix,
            drift_scale: self.config.drift_scale,
            streak_count: self.config.streak_count.min(5) as f32,
            _padding: [0.0; 3],
        }))
    }

    fn reset(&mut self) {
        self.beat.reset();
    }
}
