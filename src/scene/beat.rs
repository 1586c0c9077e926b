//! Beat shaping and smoothing.

use crate::audio::AudioStats;
use crate::params::BeatCurve;

/// Threshold + power curve + exponential smoothing over normalized intensity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatEnvelope {
    curve: BeatCurve,
    value: f32,
}

impl BeatEnvelope {
    pub fn new(curve: BeatCurve) -> Self {
        Self { curve, value: 0.0 }
    }

    /// Instantaneous beat for a normalized intensity
    /// Formula: ((intensity - threshold) / (1 - threshold)) ^ exponent
    pub fn shape(&self, intensity: f32) -> f32 {
        let intensity = if intensity.is_finite() {
            intensity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let span = (1.0 - self.curve.threshold).max(f32::EPSILON);
        let normalized = ((intensity - self.curve.threshold) / span).max(0.0);
        normalized.powf(self.curve.exponent)
    }

    /// Advance one frame toward `target` and return the smoothed value
    pub fn step(&mut self, target: f32) -> f32 {
        self.value += (target - self.value) * self.curve.gain;
        self.value
    }

    /// Shape this frame's stats (0 when absent) and smooth
    pub fn update(&mut self, stats: Option<&AudioStats>) -> f32 {
        let target = stats.map_or(0.0, |s| self.shape(s.intensity()));
        self.step(target)
    }

    /// Smooth an already-normalized signal without shaping
    pub fn follow(&mut self, signal: f32) -> f32 {
        self.step(signal.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::BinPartition;

    #[test]
    fn below_threshold_is_zero() {
        let env = BeatEnvelope::new(BeatCurve::new(0.3, 1.8, 0.08));
        assert_eq!(env.shape(0.0), 0.0);
        assert_eq!(env.shape(0.29), 0.0);
        assert_eq!(env.shape(1.0), 1.0);
        assert!(env.shape(0.65) < 0.5);
    }

    #[test]
    fn non_finite_intensity_is_silent() {
        let env = BeatEnvelope::new(BeatCurve::default());
        assert_eq!(env.shape(f32::NAN), 0.0);
    }

    #[test]
    fn absent_stats_decay_toward_zero() {
        let mut env = BeatEnvelope::new(BeatCurve::new(0.0, 1.0, 0.5));
        env.step(1.0);
        let before = env.value();
        env.update(None);
        assert!(env.value() < before);
    }

    #[test]
    fn full_scale_stats_drive_envelope_up() {
        let mut env = BeatEnvelope::new(BeatCurve::new(0.3, 1.5, 0.08));
        let stats = AudioStats::from_bins(&[255; 128], BinPartition::default());
        let first = env.update(Some(&stats));
        assert!((first - 0.08).abs() < 1e-6);
    }

    #[test]
    fn reset_clears() {
        let mut env = BeatEnvelope::new(BeatCurve::default());
        env.step(1.0);
        env.reset();
        assert_eq!(env.value(), 0.0);
    }
}
