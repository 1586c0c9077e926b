//! Playback transport configuration.

use std::time::Duration;

use serde::Deserialize;

/// Transport recovery policy
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Delay between a terminal track error and auto-advance (milliseconds)
    pub error_advance_delay_ms: u64,

    /// Retry once without cross-origin mode on a source or decode rejection
    pub cross_origin_retry: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            error_advance_delay_ms: 2000,
            cross_origin_retry: true,
        }
    }
}

impl TransportConfig {
    pub fn error_advance_delay(&self) -> Duration {
        Duration::from_millis(self.error_advance_delay_ms)
    }
}
