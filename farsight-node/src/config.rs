//! Configuration for the farsight node
//!
//! Values come from defaults, then an optional TOML file, then `FARSIGHT_*`
//! environment variables, then command-line flags.

use crate::lease::StreamSettings;
use farsight_core::{Mode, TargetSet};
use farsight_eye::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Camera used for vision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device or image file; the default capture device when unset
    pub device: Option<String>,
    pub width: u32,
    pub height: u32,
    pub max_fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: None,
            width: 320,
            height: 240,
            max_fps: 120,
        }
    }
}

/// Frame size and engine settings for target scoring
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Frames are resized to this width; camera width when unset
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(flatten)]
    pub engine: EngineConfig,
}

impl ProcessingConfig {
    pub fn size(&self, camera: &CameraConfig) -> (u32, u32) {
        (
            self.width.unwrap_or(camera.width),
            self.height.unwrap_or(camera.height),
        )
    }
}

/// Message bus connection and topics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Without a bus, reports are only logged
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// Prefix of the client id; the process id is appended
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub data_topic: String,
    pub control_topic: String,
    pub error_topic: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".to_string(),
            port: 1883,
            client_id: "vision".to_string(),
            keep_alive_secs: 60,
            data_topic: "pi/cv/data".to_string(),
            control_topic: "pi/cv/control".to_string(),
            error_topic: "pi/cv/error".to_string(),
        }
    }
}

/// Mode and targets in effect before any control command arrives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    pub mode: Mode,
    pub targets: TargetSet,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Vision,
            targets: TargetSet::all(),
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub camera: CameraConfig,
    pub processing: ProcessingConfig,
    pub stream: StreamSettings,
    pub bus: BusConfig,
    pub startup: StartupConfig,
    /// Directory holding one `<kind>-template.png` per target kind
    pub template_dir: Option<PathBuf>,
}

impl FromStr for NodeConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
        content.parse()
    }

    /// Apply `FARSIGHT_*` overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`. Unparseable values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("FARSIGHT_MQTT_HOST") {
            self.bus.host = host;
            self.bus.enabled = true;
        }

        if let Some(port) = lookup("FARSIGHT_MQTT_PORT") {
            if let Ok(p) = port.parse::<u16>() {
                self.bus.port = p;
            }
        }

        if let Some(dir) = lookup("FARSIGHT_TEMPLATE_DIR") {
            self.template_dir = Some(PathBuf::from(dir));
        }
    }

    /// Size frames are processed at
    pub fn processing_size(&self) -> (u32, u32) {
        self.processing.size(&self.camera)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.camera.max_fps == 0 || self.camera.max_fps > 240 {
            return Err("Frame rate must be between 1 and 240".to_string());
        }

        if self.camera.width == 0 || self.camera.height == 0 {
            return Err("Camera resolution must be non-zero".to_string());
        }

        let (width, height) = self.processing_size();
        if width == 0 || height == 0 {
            return Err("Processing resolution must be non-zero".to_string());
        }

        self.processing.engine.validate()?;
        self.stream.validate()?;

        if self.bus.port == 0 {
            return Err("MQTT port must be non-zero".to_string());
        }

        let topics = [&self.bus.data_topic, &self.bus.control_topic, &self.bus.error_topic];
        if topics.iter().any(|t| t.is_empty()) {
            return Err("MQTT topics must not be empty".to_string());
        }
        if topics[0] == topics[1] || topics[0] == topics[2] || topics[1] == topics[2] {
            return Err("MQTT data, control and error topics must be distinct".to_string());
        }

        if self.template_dir.is_none() {
            return Err("A template directory is required".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid() -> NodeConfig {
        NodeConfig {
            template_dir: Some(PathBuf::from("templates")),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.camera.max_fps, 120);
        assert_eq!(config.processing_size(), (320, 240));
        assert_eq!(config.bus.port, 1883);
        assert_eq!(config.startup.mode, Mode::Vision);
        assert_eq!(config.startup.targets, TargetSet::all());
        assert!(!config.bus.enabled);
    }

    #[test]
    fn test_template_dir_required() {
        assert!(NodeConfig::default().validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config: NodeConfig = r#"
            template_dir = "/opt/farsight/templates"

            [camera]
            device = "/dev/video2"
            max_fps = 60

            [processing]
            width = 160
            height = 120
            fov_degrees = 62.2
            threads = 2

            [bus]
            enabled = true
            host = "rio.local"

            [startup]
            mode = "remote_viewing"
            targets = ["blue_ball"]
        "#
        .parse()
        .unwrap();

        assert_eq!(config.camera.device.as_deref(), Some("/dev/video2"));
        assert_eq!(config.camera.width, 320);
        assert_eq!(config.processing_size(), (160, 120));
        assert_eq!(config.processing.engine.threads, 2);
        assert_eq!(config.processing.engine.fov_degrees, 62.2);
        assert!(config.bus.enabled);
        assert_eq!(config.bus.control_topic, "pi/cv/control");
        assert_eq!(config.startup.mode, Mode::RemoteViewing);
        assert_eq!(config.startup.targets, TargetSet::only(farsight_core::TargetKind::BlueBall));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_error() {
        let err = "camera = 3".parse::<NodeConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("farsight.toml");
        std::fs::write(&path, "[bus]\nport = 1884\n").unwrap();
        assert_eq!(NodeConfig::from_file(&path).unwrap().bus.port, 1884);
        assert!(matches!(
            NodeConfig::from_file(&dir.path().join("missing.toml")),
            Err(ConfigError::IoError(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("FARSIGHT_MQTT_HOST", "broker"),
            ("FARSIGHT_MQTT_PORT", "not-a-port"),
            ("FARSIGHT_TEMPLATE_DIR", "/tmp/templates"),
        ]
        .into_iter()
        .collect();

        let mut config = NodeConfig::default();
        config.apply_env_from(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.bus.host, "broker");
        assert!(config.bus.enabled);
        assert_eq!(config.bus.port, 1883);
        assert_eq!(config.template_dir, Some(PathBuf::from("/tmp/templates")));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = valid();
        config.camera.max_fps = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.bus.error_topic = config.bus.data_topic.clone();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.processing.engine.threads = 0;
        assert!(config.validate().is_err());
    }
}
