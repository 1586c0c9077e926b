//! Error types for moodscope.

use thiserror::Error;

/// Main error type for the visualizer
#[derive(Error, Debug)]
pub enum VizError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Decode error: {0}")]
    Decode(#[from] hound::Error),

    #[error("Render error: {0}")]
    Render(String),
}

/// Result type alias for moodscope
pub type Result<T> = std::result::Result<T, VizError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = VizError::Config("fft_size must be a power of two".into());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: fft_size must be a power of two"
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.wav");
        let err: VizError = io.into();
        assert!(matches!(err, VizError::Io(_)));
        assert!(err.to_string().contains("missing.wav"));
    }

    #[test]
    fn toml_error_converts() {
        let parse = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: VizError = parse.into();
        assert!(matches!(err, VizError::Toml(_)));
    }
}
