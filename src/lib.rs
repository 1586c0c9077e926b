//! Moodscope library - audio-reactive mood visualizer

pub mod audio;
pub mod cli;
pub mod error;
pub mod params;
pub mod rendering;
pub mod scene;
pub mod visualizer;

pub use error::{Result, VizError};
pub use visualizer::Visualizer;
