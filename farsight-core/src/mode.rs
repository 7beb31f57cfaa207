//! Operating modes of the node

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which subsystem currently owns the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Frames go through the target scoring engine
    Vision,
    /// The camera feeds a live video stream to the operator
    RemoteViewing,
    /// No device is held
    #[serde(rename = "none", alias = "idle")]
    Idle,
}

impl Mode {
    /// Name used on the control and error channels
    pub fn name(self) -> &'static str {
        match self {
            Mode::Vision => "vision",
            Mode::RemoteViewing => "remote_viewing",
            Mode::Idle => "none",
        }
    }

    pub fn from_name(name: &str) -> Option<Mode> {
        match name {
            "vision" => Some(Mode::Vision),
            "remote_viewing" => Some(Mode::RemoteViewing),
            "none" => Some(Mode::Idle),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
