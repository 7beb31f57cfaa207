//! Typed description of the remote-viewing video pipeline
//!
//! Settings are modelled as data; stream leases render them to whatever their
//! transport needs (launcher arguments or an in-process pipeline description).

use serde::{Deserialize, Serialize};

/// Video pipeline configuration: capture → scale → H.264 → RTP → UDP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// V4L2 capture device
    pub device: String,
    pub capture_width: u32,
    pub capture_height: u32,
    pub output_width: u32,
    pub output_height: u32,
    /// Capture framerate; left to the device when unset
    pub framerate: Option<u32>,
    pub bitrate_kbps: u32,
    /// Receiver of the RTP stream
    pub host: String,
    pub port: u16,
    /// Program run by the process-backed stream lease
    pub launcher: String,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            capture_width: 320,
            capture_height: 240,
            output_width: 320,
            output_height: 240,
            framerate: None,
            bitrate_kbps: 500,
            host: "127.0.0.1".to_string(),
            port: 5000,
            launcher: "gst-launch-1.0".to_string(),
        }
    }
}

/// One link of a rendered pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Element {
        factory: &'static str,
        properties: Vec<(&'static str, String)>,
    },
    Caps {
        media: &'static str,
        fields: Vec<(&'static str, String)>,
    },
}

impl Stage {
    fn element(factory: &'static str) -> Self {
        Stage::Element { factory, properties: Vec::new() }
    }

    fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        match &mut self {
            Stage::Element { properties, .. } => properties.push((key, value.to_string())),
            Stage::Caps { fields, .. } => fields.push((key, value.to_string())),
        }
        self
    }

    fn raw_video() -> Self {
        Stage::Caps { media: "video/x-raw", fields: Vec::new() }
    }

    /// Tokens of this stage as separate launcher arguments
    fn tokens(&self) -> Vec<String> {
        match self {
            Stage::Element { factory, properties } => std::iter::once(factory.to_string())
                .chain(properties.iter().map(|(k, v)| format!("{}={}", k, v)))
                .collect(),
            Stage::Caps { media, fields } => {
                let mut caps = media.to_string();
                for (k, v) in fields {
                    caps.push_str(&format!(",{}={}", k, v));
                }
                vec![caps]
            }
        }
    }
}

impl StreamSettings {
    pub fn stages(&self) -> Vec<Stage> {
        let mut capture = Stage::raw_video()
            .with("width", self.capture_width)
            .with("height", self.capture_height);
        if let Some(fps) = self.framerate {
            capture = capture.with("framerate", format!("{}/1", fps));
        }

        vec![
            Stage::element("v4l2src").with("device", &self.device),
            capture,
            Stage::element("videoscale"),
            Stage::raw_video()
                .with("width", self.output_width)
                .with("height", self.output_height),
            Stage::element("videoconvert"),
            Stage::element("x264enc")
                .with("tune", "zerolatency")
                .with("bitrate", self.bitrate_kbps)
                .with("speed-preset", "superfast"),
            Stage::element("rtph264pay")
                .with("config-interval", 10)
                .with("pt", 96),
            Stage::element("udpsink")
                .with("host", &self.host)
                .with("port", self.port),
        ]
    }

    /// Arguments for a `gst-launch`-style launcher, one token per argument
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (i, stage) in self.stages().iter().enumerate() {
            if i > 0 {
                args.push("!".to_string());
            }
            args.extend(stage.tokens());
        }
        args
    }

    /// Single-string pipeline description
    pub fn description(&self) -> String {
        self.launch_args().join(" ")
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.capture_width == 0
            || self.capture_height == 0
            || self.output_width == 0
            || self.output_height == 0
        {
            return Err("Stream resolution must be non-zero".to_string());
        }
        if self.framerate == Some(0) {
            return Err("Stream framerate must be greater than 0".to_string());
        }
        if self.port == 0 {
            return Err("Stream port must be non-zero".to_string());
        }
        if self.host.is_empty() || self.device.is_empty() || self.launcher.is_empty() {
            return Err("Stream host, device and launcher must be set".to_string());
        }
        Ok(())
    }
}
