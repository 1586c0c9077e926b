//! Parameter definitions with units and documented semantics.
//!
//! All tuning constants live here:
//! - Units and ranges documented per field
//! - Defaults compiled in, optionally overridden from a TOML file
//! - `validate()` guards every invariant the pipeline relies on

mod analysis;
mod render;
mod scene;
mod transport;

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;

// Re-export all types
pub use analysis::AnalyzerConfig;
pub use render::RenderConfig;
pub use scene::{AuroraConfig, BeatCurve, GalaxyConfig, ParticleConfig, RainGlassConfig, SceneConfig};
pub use transport::TransportConfig;

/// Complete visualizer configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub analysis: AnalyzerConfig,
    pub transport: TransportConfig,
    pub scenes: SceneConfig,
    pub render: RenderConfig,
}

impl VisualizerConfig {
    /// Parse a TOML document; missing tables and fields keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.scenes.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VizError;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = VisualizerConfig::from_toml_str("").unwrap();
        assert_eq!(config, VisualizerConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = VisualizerConfig::from_toml_str(
            r#"
            [scenes.aurora]
            streak_count = 1

            [scenes.rain_glass.beat]
            threshold = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.scenes.aurora.streak_count, 1);
        assert_eq!(config.scenes.aurora.intensity, AuroraConfig::default().intensity);
        assert_eq!(config.scenes.rain_glass.beat.threshold, 0.5);
        assert_eq!(config.scenes.rain_glass.beat.exponent, 1.5);
    }

    #[test]
    fn invalid_values_rejected() {
        let err = VisualizerConfig::from_toml_str("[analysis]\nfft_size = 100\n").unwrap_err();
        assert!(matches!(err, VizError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[transport]\nerror_advance_delay_ms = 500").unwrap();

        let config = VisualizerConfig::load(file.path()).unwrap();
        assert_eq!(config.transport.error_advance_delay_ms, 500);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = VisualizerConfig::load(Path::new("/nonexistent/moodscope.toml")).unwrap_err();
        assert!(matches!(err, VizError::Io(_)));
    }
}
