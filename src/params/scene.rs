//! Scene tuning parameters.
//!
//! Thresholds and colour curves are configuration, not logic: every scene
//! reads its constants from one of these structs so a test (or a TOML file)
//! can substitute deterministic values.

use serde::{Deserialize, Deserializer};

use crate::error::{Result, VizError};

/// Beat shaping curve: threshold + power curve + exponential smoothing
///
/// In TOML a `beat` table may set any subset of its fields; the rest keep the
/// owning scene's curve, not [`BeatCurve::default`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatCurve {
    /// Normalized intensity below which the beat is 0 (range [0, 1))
    pub threshold: f32,

    /// Power curve exponent applied after normalization
    /// Formula: beat = ((intensity - threshold) / (1 - threshold)) ^ exponent
    pub exponent: f32,

    /// Per-frame interpolation gain toward the target (range (0, 1])
    pub gain: f32,
}

impl Default for BeatCurve {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            exponent: 1.6,
            gain: 0.08,
        }
    }
}

/// Fields present in a `beat` table
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BeatCurvePatch {
    threshold: Option<f32>,
    exponent: Option<f32>,
    gain: Option<f32>,
}

impl BeatCurvePatch {
    fn apply(self, base: BeatCurve) -> BeatCurve {
        BeatCurve {
            threshold: self.threshold.unwrap_or(base.threshold),
            exponent: self.exponent.unwrap_or(base.exponent),
            gain: self.gain.unwrap_or(base.gain),
        }
    }
}

fn patch_beat<'de, D: Deserializer<'de>>(
    deserializer: D,
    base: BeatCurve,
) -> std::result::Result<BeatCurve, D::Error> {
    BeatCurvePatch::deserialize(deserializer).map(|patch| patch.apply(base))
}

fn particle_beat<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<BeatCurve, D::Error> {
    patch_beat(d, ParticleConfig::default().beat)
}

fn galaxy_beat<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<BeatCurve, D::Error> {
    patch_beat(d, GalaxyConfig::default().beat)
}

fn rain_glass_beat<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<BeatCurve, D::Error> {
    patch_beat(d, RainGlassConfig::default().beat)
}

fn aurora_beat<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<BeatCurve, D::Error> {
    patch_beat(d, AuroraConfig::default().beat)
}

impl BeatCurve {
    pub fn new(threshold: f32, exponent: f32, gain: f32) -> Self {
        Self {
            threshold,
            exponent,
            gain,
        }
    }

    pub fn validate(&self, scene: &str) -> Result<()> {
        if !(0.0..1.0).contains(&self.threshold) {
            return Err(VizError::Config(format!(
                "{scene}: beat threshold must be in [0, 1), got {}",
                self.threshold
            )));
        }
        if !(self.gain > 0.0 && self.gain <= 1.0) {
            return Err(VizError::Config(format!(
                "{scene}: beat gain must be in (0, 1], got {}",
                self.gain
            )));
        }
        if !(self.exponent > 0.0) {
            return Err(VizError::Config(format!(
                "{scene}: beat exponent must be positive, got {}",
                self.exponent
            )));
        }
        Ok(())
    }
}

/// Star-particle field parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Number of points (lower = cheaper)
    pub point_count: usize,

    /// Side length of the cube the points are scattered in (world units)
    pub field_extent: f32,

    /// Seed for point positions and colours
    pub seed: u64,

    #[serde(deserialize_with = "particle_beat")]
    pub beat: BeatCurve,

    /// Sprite size in world units at rest
    pub base_point_size: f32,

    /// Extra sprite size at full beat
    pub beat_point_boost: f32,

    /// Extra uniform scale at full beat
    /// Formula: scale = 1 + beat * scale_boost
    pub scale_boost: f32,

    /// Material opacity at rest
    pub base_opacity: f32,

    /// Extra opacity at full beat
    pub opacity_boost: f32,

    /// Global tint saturation (HSL)
    pub saturation: f32,

    /// Global tint lightness at rest (HSL)
    pub lightness: f32,

    /// Extra lightness at full beat
    pub lightness_boost: f32,

    /// Hue drift amplitude (fraction of the colour wheel)
    pub hue_drift: f32,

    /// Hue drift rate (radians per second)
    pub hue_drift_rate: f32,

    /// Extra hue rotation at full beat
    pub hue_beat_shift: f32,

    /// Float wobble speed for stars/halo (rain and snow never float)
    pub float_speed: f32,

    /// Float wobble rotation intensity
    pub float_rotation_intensity: f32,

    /// Float wobble vertical intensity
    pub float_intensity: f32,

    /// Centre glow at rest
    pub halo_base: f32,

    /// Extra centre glow at full (smoothed) bass
    /// Formula: halo = halo_base + bass * halo_bass_boost
    pub halo_bass_boost: f32,

    /// Camera distance from the origin (world units)
    pub camera_distance: f32,

    /// Vertical field of view (degrees)
    pub fov_degrees: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            point_count: 900,
            field_extent: 10.0,
            seed: 0x5eed,
            beat: BeatCurve::new(0.3, 1.8, 0.08),
            base_point_size: 0.034,
            beat_point_boost: 0.012,
            scale_boost: 0.14,
            base_opacity: 0.45,
            opacity_boost: 0.2,
            saturation: 0.62,
            lightness: 0.62,
            lightness_boost: 0.05,
            hue_drift: 0.06,
            hue_drift_rate: 0.06,
            hue_beat_shift: 0.03,
            float_speed: 0.7,
            float_rotation_intensity: 0.12,
            float_intensity: 0.12,
            halo_base: 5.0,
            halo_bass_boost: 50.0,
            camera_distance: 5.0,
            fov_degrees: 75.0,
        }
    }
}

/// Milky-way backdrop parameters (shared beneath particle themes)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GalaxyConfig {
    /// Shader time multiplier (lower = slower twinkle)
    pub time_scale: f32,

    #[serde(deserialize_with = "galaxy_beat")]
    pub beat: BeatCurve,

    /// Dust tint for the halo theme (0 = warm, 1 = cool)
    pub halo_tint: f32,

    /// Dust tint for every other particle theme
    pub default_tint: f32,

    /// Brightness at rest
    pub base_brightness: f32,

    /// Extra brightness at full beat
    /// Formula: brightness = base_brightness + beat * beat_brightness
    pub beat_brightness: f32,
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        Self {
            time_scale: 0.5,
            beat: BeatCurve::new(0.3, 1.5, 0.06),
            halo_tint: 0.78,
            default_tint: 0.62,
            base_brightness: 0.9,
            beat_brightness: 0.12,
        }
    }
}

/// Rain-on-glass bokeh parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RainGlassConfig {
    /// Global rain amount on glass (0.0-1.0)
    pub base_rain: f32,

    /// Extra rain at full beat (clamped to 1.0 in the shader)
    pub beat_rain_boost: f32,

    #[serde(deserialize_with = "rain_glass_beat")]
    pub beat: BeatCurve,

    /// City bokeh light count (more = heavier shader)
    pub light_count: u32,

    /// Derivative normals (faster) instead of finite-difference normals
    pub cheap_normals: bool,

    /// Overall brightness multiplier
    pub brightness: f32,

    /// Shader time multiplier
    pub time_scale: f32,
}

impl Default for RainGlassConfig {
    fn default() -> Self {
        Self {
            base_rain: 0.52,
            beat_rain_boost: 0.15,
            beat: BeatCurve::new(0.3, 1.5, 0.08),
            light_count: 9,
            cheap_normals: true,
            brightness: 1.2,
            time_scale: 1.0,
        }
    }
}

/// Aurora sky parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AuroraConfig {
    /// Shader time multiplier (lower = slower evolution)
    pub time_scale: f32,

    #[serde(deserialize_with = "aurora_beat")]
    pub beat: BeatCurve,

    /// Slow camera tilt/drift strength
    pub drift_scale: f32,

    /// Overall aurora brightness
    pub intensity: f32,

    /// Star grid cell size in pixels (larger = fewer stars)
    pub star_density: f32,

    /// Shooting streak count (0-5)
    pub streak_count: u32,

    /// Cooler cyan/blue/green bias (0.0-1.0)
    pub cool_tone_mix: f32,
}

impl Default for AuroraConfig {
    fn default() -> Self {
        Self {
            time_scale: 0.5,
            beat: BeatCurve::new(0.35, 1.6, 0.08),
            drift_scale: 0.6,
            intensity: 1.95,
            star_density: 28.0,
            streak_count: 3,
            cool_tone_mix: 0.28,
        }
    }
}

/// Tuning for every scene
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub particles: ParticleConfig,
    pub galaxy: GalaxyConfig,
    pub rain_glass: RainGlassConfig,
    pub aurora: AuroraConfig,
}

impl SceneConfig {
    pub fn validate(&self) -> Result<()> {
        self.particles.beat.validate("particles")?;
        self.galaxy.beat.validate("galaxy")?;
        self.rain_glass.beat.validate("rain_glass")?;
        self.aurora.beat.validate("aurora")?;
        if self.particles.point_count == 0 {
            return Err(VizError::Config("particles: point_count must be > 0".into()));
        }
        if self.aurora.streak_count > 5 {
            return Err(VizError::Config(format!(
                "aurora: at most 5 streaks, got {}",
                self.aurora.streak_count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn default_exponents_stay_in_noise_suppressing_range() {
        let config = SceneConfig::default();
        for curve in [
            config.particles.beat,
            config.galaxy.beat,
            config.rain_glass.beat,
            config.aurora.beat,
        ] {
            assert!((1.5..=1.8).contains(&curve.exponent));
            assert!((0.06..=0.08).contains(&curve.gain));
        }
    }

    #[test]
    fn partial_beat_table_keeps_scene_curve() {
        let config: SceneConfig = toml::from_str(
            r#"
            [particles.beat]
            threshold = 0.4

            [galaxy.beat]
            threshold = 0.2

            [aurora.beat]
            gain = 0.07
            "#,
        )
        .unwrap();

        assert_eq!(config.particles.beat, BeatCurve::new(0.4, 1.8, 0.08));
        assert_eq!(config.galaxy.beat, BeatCurve::new(0.2, 1.5, 0.06));
        assert_eq!(config.aurora.beat, BeatCurve::new(0.35, 1.6, 0.07));
        assert_eq!(config.rain_glass.beat, RainGlassConfig::default().beat);
    }

    #[test]
    fn unknown_beat_field_rejected() {
        let parsed = toml::from_str::<SceneConfig>("[aurora.beat]
gian = 0.1
");
        assert!(parsed.is_err());
    }

    #[test]
    fn threshold_of_one_rejected() {
        let curve = BeatCurve::new(1.0, 1.5, 0.08);
        assert!(curve.validate("test").is_err());
    }

    #[test]
    fn zero_gain_rejected() {
        let curve = BeatCurve::new(0.3, 1.5, 0.0);
        assert!(curve.validate("test").is_err());
    }

    #[test]
    fn too_many_streaks_rejected() {
        let mut config = SceneConfig::default();
        config.aurora.streak_count = 9;
        assert!(config.validate().is_err());
    }
}
