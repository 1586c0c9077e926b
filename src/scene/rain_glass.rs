//! Rain-on-glass bokeh scene.

use bytemuck::{Pod, Zeroable};

use super::{BeatEnvelope, FrameInput, Layer, Scene};
use crate::params::RainGlassConfig;

/// Uniform buffer for the rain-glass shader
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct RainGlassUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub beat: f32,
    /// Rain amount before the shader's clamp to 1.0
    pub rain_amount: f32,
    pub brightness: f32,
    pub light_count: u32,
    pub cheap_normals: u32,
}

pub struct RainGlassScene {
    config: RainGlassConfig,
    beat: BeatEnvelope,
}

impl RainGlassScene {
    pub fn new(config: RainGlassConfig) -> Self {
        let beat = BeatEnvelope::new(config.beat);
        Self { config, beat }
    }
}

impl Scene for RainGlassScene {
    fn update(&mut self, input: &FrameInput<'_>) -> Option<Layer> {
        if input.viewport.is_empty() {
            return None;
        }
        let beat = self.beat.update(input.stats);

        Some(Layer::RainGlass(RainGlassUniforms {
            resolution: input.viewport.resolution(),
            time: input.time_s * self.config.time_scale,
            beat,
            rain_amount: self.config.base_rain + beat * self.config.beat_rain_boost,
            brightness: self.config.brightness,
            light_count: self.config.light_count,
            cheap_normals: u32::from(self.config.cheap_normals),
        }))
    }

    fn reset(&mut self) {
        self.beat.reset();
    }
}
