//! Heartbeat configuration for auto-run
//!
//! The heartbeat decides how often a tick fires while the simulation is
//! running. Training ticks are cheaper to watch, so they fire faster.

use pmm_core::{HeartbeatSettings, Mode};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatConfig {
    /// Period between inference ticks (default: 500ms)
    pub inference_interval: Duration,
    /// Period between training ticks (default: 200ms)
    pub training_interval: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            inference_interval: Duration::from_millis(500),
            training_interval: Duration::from_millis(200),
        }
    }
}

impl HeartbeatConfig {
    /// Period for the given mode.
    pub fn interval_for(&self, mode: Mode) -> Duration {
        match mode {
            Mode::Inference => self.inference_interval,
            Mode::Training => self.training_interval,
        }
    }

    /// Very fast heartbeat for testing
    pub fn testing() -> Self {
        Self {
            inference_interval: Duration::from_millis(10),
            training_interval: Duration::from_millis(5),
        }
    }
}

impl From<&HeartbeatSettings> for HeartbeatConfig {
    fn from(settings: &HeartbeatSettings) -> Self {
        Self {
            inference_interval: settings.inference_interval(),
            training_interval: settings.training_interval(),
        }
    }
}
