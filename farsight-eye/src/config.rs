//! Configuration for farsight-eye

use serde::{Deserialize, Serialize};

/// Target engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Horizontal field of view of the camera, in degrees
    pub fov_degrees: f64,
    /// Worker threads for the per-pixel stages (1 disables the pool)
    pub threads: usize,
    /// Render a debug overlay of accepted targets
    pub display: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 47.0,
            threads: 4,
            display: false,
        }
    }
}

impl EngineConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.threads == 0 {
            return Err("Thread count must be at least 1".to_string());
        }

        if !(self.fov_degrees > 0.0 && self.fov_degrees < 90.0) {
            return Err(format!(
                "Field of view must be between 0 and 90 degrees, got {}",
                self.fov_degrees
            ));
        }

        Ok(())
    }
}
