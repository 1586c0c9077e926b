//! Window and surface configuration.

use serde::Deserialize;

/// Rendering configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Window width (logical pixels)
    pub window_width: u32,

    /// Window height (logical pixels)
    pub window_height: u32,

    /// Present with vsync (Fifo) instead of the lowest-latency mode available
    pub vsync: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            vsync: true,
        }
    }
}
