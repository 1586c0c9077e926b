//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::audio::Track;
use crate::error::Result;
use crate::params::VisualizerConfig;
use crate::scene::{Mood, Theme};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "moodscope")]
#[command(about = "Audio-reactive mood visualizer", long_about = None)]
pub struct Args {
    /// WAV files to play, in order
    #[arg(value_name = "TRACK")]
    pub tracks: Vec<PathBuf>,

    /// Theme: stars, rain, snow, halo (default), rainGlass, aurora
    #[arg(long, value_name = "THEME", default_value = "halo")]
    pub theme: String,

    /// Mood: melancholy, happy, dynamic, neutral
    #[arg(long, value_name = "MOOD", default_value = "neutral")]
    pub mood: String,

    /// TOML file overriding the compiled-in parameters
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Start playing the first track immediately
    #[arg(long)]
    pub autoplay: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Window width (logical pixels), overrides the config file
    #[arg(long, value_name = "PIXELS")]
    pub width: Option<u32>,

    /// Window height (logical pixels), overrides the config file
    #[arg(long, value_name = "PIXELS")]
    pub height: Option<u32>,
}

impl Args {
    /// Parse the theme argument, warning on unknown names
    pub fn parse_theme(&self) -> Theme {
        let theme = Theme::parse_or_default(&self.theme);
        info!("Theme: {}", theme);
        theme
    }

    pub fn parse_mood(&self) -> Mood {
        let mood = Mood::from_label(&self.mood);
        info!("Mood: {}", mood);
        mood
    }

    /// Defaults, then the config file, then window-size flags
    pub fn load_config(&self) -> Result<VisualizerConfig> {
        let mut config = match &self.config {
            Some(path) => VisualizerConfig::load(path)?,
            None => VisualizerConfig::default(),
        };
        if let Some(width) = self.width {
            config.render.window_width = width;
        }
        if let Some(height) = self.height {
            config.render.window_height = height;
        }
        Ok(config)
    }

    pub fn track_list(&self) -> Vec<Track> {
        self.tracks.iter().map(|path| Track::local(path)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["moodscope"]);
        assert!(args.tracks.is_empty());
        assert_eq!(args.parse_theme(), Theme::Halo);
        assert_eq!(args.parse_mood(), Mood::Neutral);
        assert!(!args.autoplay);
        assert_eq!(args.load_config().unwrap(), VisualizerConfig::default());
    }

    #[test]
    fn tracks_and_overrides() {
        let args = Args::parse_from([
            "moodscope",
            "--theme",
            "aurora",
            "--mood",
            "happy",
            "--width",
            "640",
            "a.wav",
            "b.wav",
        ]);
        assert_eq!(args.parse_theme(), Theme::Aurora);
        assert_eq!(args.parse_mood(), Mood::Happy);

        let tracks = args.track_list();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[1].title, "b");

        let config = args.load_config().unwrap();
        assert_eq!(config.render.window_width, 640);
        assert_eq!(config.render.window_height, 720);
    }

    #[test]
    fn unknown_theme_falls_back() {
        let args = Args::parse_from(["moodscope", "--theme", "lava"]);
        assert_eq!(args.parse_theme(), Theme::Halo);
    }
}
