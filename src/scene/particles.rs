//! Star-particle field.
//!
//! A fixed cloud of coloured points in a cube, rotated and translated per
//! theme. The smoothed beat scales the cloud, brightens its tint and grows the
//! sprites; smoothed bass drives the violet halo light in front of it.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use super::{BeatEnvelope, FrameInput, Layer, Scene, Theme};
use crate::params::ParticleConfig;

/// Per-instance vertex data
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Uniform buffer for the particle shader
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleUniforms {
    pub model: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    /// rgb tint and opacity
    pub tint: [f32; 4],
    pub viewport: [f32; 2],
    pub point_size: f32,
    pub halo: f32,
}

/// Static point cloud
pub struct ParticleField {
    instances: Vec<ParticleInstance>,
}

impl ParticleField {
    /// Uniform positions in a cube and purple/cyan/pink colours
    pub fn generate(count: usize, extent: f32, seed: u64) -> Self {
        let mut rng = Pcg64::seed_from_u64(seed);
        let instances = (0..count)
            .map(|_| {
                let position = [
                    (rng.gen::<f32>() - 0.5) * extent,
                    (rng.gen::<f32>() - 0.5) * extent,
                    (rng.gen::<f32>() - 0.5) * extent,
                ];
                let hue = (0.55 + rng.gen::<f32>() * 0.5) % 1.0;
                let saturation = 0.55 + rng.gen::<f32>() * 0.25;
                let lightness = 0.55 + rng.gen::<f32>() * 0.25;
                ParticleInstance {
                    position,
                    color: hsl_to_rgb(hue, saturation, lightness),
                }
            })
            .collect();
        Self { instances }
    }

    pub fn instances(&self) -> &[ParticleInstance] {
        &self.instances
    }
}

/// Theme-dependent rigid motion of the cloud
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    /// Euler angles (XYZ order, radians)
    pub rotation: Vec3,
    pub position: Vec3,
}

/// Cloud motion at time `t` for a particle theme
pub fn drift(theme: Theme, t: f32) -> Drift {
    match theme {
        // Gentle vertical flow
        Theme::Rain => Drift {
            rotation: Vec3::new(-PI / 2.0, t * 0.004, 0.0),
            position: Vec3::new(0.0, (-t * 0.12) % 10.0, 0.0),
        },
        // Softer and slower than rain
        Theme::Snow => Drift {
            rotation: Vec3::new(-PI / 3.0, t * 0.002, 0.0),
            position: Vec3::new((t * 0.12).sin() * 0.25, (-t * 0.05) % 10.0, 0.0),
        },
        // Slow swirl
        Theme::Halo => Drift {
            rotation: Vec3::new((t * 0.08).sin() * 0.08, t * 0.01, (t * 0.06).sin() * 0.05),
            position: Vec3::ZERO,
        },
        _ => Drift {
            rotation: Vec3::new(t * 0.004, t * 0.012, 0.0),
            position: Vec3::ZERO,
        },
    }
}

/// HSL to RGB, all components in [0, 1]
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);
    if s == 0.0 {
        return [l, l, l];
    }
    let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    [
        hue_channel(p, q, h + 1.0 / 3.0),
        hue_channel(p, q, h),
        hue_channel(p, q, h - 1.0 / 3.0),
    ]
}

fn hue_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

pub struct ParticleScene {
    config: ParticleConfig,
    field: ParticleField,
    beat: BeatEnvelope,
    bass: BeatEnvelope,
    /// Phase offset of the float wobble
    float_offset: f32,
}

impl ParticleScene {
    pub fn new(config: ParticleConfig) -> Self {
        let field = ParticleField::generate(config.point_count, config.field_extent, config.seed);
        let float_offset = Pcg64::seed_from_u64(config.seed ^ 0xf10a7).gen::<f32>() * 10_000.0;
        let beat = BeatEnvelope::new(config.beat);
        let bass = BeatEnvelope::new(config.beat);
        Self {
            config,
            field,
            beat,
            bass,
            float_offset,
        }
    }

    pub fn instances(&self) -> &[ParticleInstance] {
        self.field.instances()
    }

    /// Float wobble group transform; rain and snow never float
    fn float_transform(&self, theme: Theme, t: f32) -> Mat4 {
        if matches!(theme, Theme::Rain | Theme::Snow) || self.config.float_speed == 0.0 {
            return Mat4::IDENTITY;
        }
        let phase = (self.float_offset + t) / 4.0 * self.config.float_speed;
        let ri = self.config.float_rotation_intensity;
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            phase.cos() / 8.0 * ri,
            phase.sin() / 8.0 * ri,
            phase.sin() / 20.0 * ri,
        );
        let lift = phase.sin() / 10.0 * self.config.float_intensity;
        Mat4::from_rotation_translation(rotation, Vec3::new(0.0, lift, 0.0))
    }

    fn view_proj(&self, aspect: f32) -> Mat4 {
        let projection = Mat4::perspective_rh(self.config.fov_degrees.to_radians(), aspect, 0.1, 1000.0);
        let view = Mat4::look_at_rh(
            Vec3::new(0.0, 0.0, self.config.camera_distance),
            Vec3::ZERO,
            Vec3::Y,
        );
        projection * view
    }
}

impl Scene for ParticleScene {
    fn update(&mut self, input: &FrameInput<'_>) -> Option<Layer> {
        if input.viewport.is_empty() {
            return None;
        }
        let t = input.time_s;
        let beat = self.beat.update(input.stats);
        let bass = self.bass.follow(input.stats.map_or(0.0, |s| s.bass / 255.0));
        let c = &self.config;

        let motion = drift(input.theme, t);
        let scale = 1.0 + beat * c.scale_boost;
        let points = Mat4::from_scale_rotation_translation(
            Vec3::splat(scale),
            Quat::from_euler(EulerRot::XYZ, motion.rotation.x, motion.rotation.y, motion.rotation.z),
            motion.position,
        );
        let model = self.float_transform(input.theme, t) * points;

        let hue_shift = (t * c.hue_drift_rate).sin() * c.hue_drift + beat * c.hue_beat_shift;
        let hue = (input.mood.base_hue() + hue_shift + 1.0).rem_euclid(1.0);
        let [r, g, b] = hsl_to_rgb(hue, c.saturation, c.lightness + beat * c.lightness_boost);
        let opacity = c.base_opacity + beat * c.opacity_boost;

        Some(Layer::Particles(ParticleUniforms {
            model: model.to_cols_array_2d(),
            view_proj: self.view_proj(input.viewport.aspect()).to_cols_array_2d(),
            tint: [r, g, b, opacity],
            viewport: input.viewport.resolution(),
            point_size: c.base_point_size + beat * c.beat_point_boost,
            halo: c.halo_base + bass * c.halo_bass_boost,
        }))
    }

    fn reset(&mut self) {
        self.beat.reset();
        self.bass.reset();
    }
}
