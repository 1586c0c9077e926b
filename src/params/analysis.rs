//! Spectral analysis configuration.

use serde::Deserialize;

use crate::audio::BinPartition;
use crate::error::{Result, VizError};

/// Analysis graph configuration (mirrors an analyser node's tunables)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Transform size in samples (must be power of 2)
    /// Produces fft_size / 2 frequency bins
    pub fft_size: usize,

    /// Temporal smoothing between transforms (0.0 = none, <1.0)
    pub smoothing_time_constant: f32,

    /// Magnitude mapped to byte 0 (decibels)
    pub min_decibels: f32,

    /// Magnitude mapped to byte 255 (decibels)
    pub max_decibels: f32,

    /// Low / mid bin counts; high covers the rest
    pub partition: BinPartition,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
            partition: BinPartition::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Number of frequency bins in every snapshot
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (transform size must be power of 2, etc.)
    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 32 {
            return Err(VizError::Config(format!(
                "fft_size must be a power of 2 >= 32, got {}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing_time_constant) {
            return Err(VizError::Config(format!(
                "smoothing_time_constant must be in [0, 1), got {}",
                self.smoothing_time_constant
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(VizError::Config(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_analyser_node() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.fft_size, 256);
        assert_eq!(config.bin_count(), 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_power_of_two() {
        let config = AnalyzerConfig {
            fft_size: 300,
            ..AnalyzerConfig::default()
        };
        assert!(matches!(config.validate(), Err(VizError::Config(_))));
    }

    #[test]
    fn rejects_inverted_decibel_range() {
        let config = AnalyzerConfig {
            min_decibels: -30.0,
            max_decibels: -100.0,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
