//! farsight-node: onboard vision node
//!
//! Arbitrates the single camera between vision (target scoring) and remote
//! viewing (a live video stream), takes commands from a control topic and
//! reports detections and failures over a message bus.

pub mod bus;
pub mod config;
pub mod control;
pub mod display;
pub mod lease;
pub mod node;
pub mod orchestrator;
pub mod pacing;
pub mod report;
pub mod shutdown;
pub mod telemetry;

pub use bus::{LoopbackBus, MessageBus, MqttBus, Subscriptions};
pub use config::{ConfigError, NodeConfig};
pub use lease::{CameraLease, Lease, StreamLease, StreamSettings};
pub use node::VisionNode;
pub use orchestrator::{ModeState, Orchestrator, StateHandle};
pub use pacing::{FrameStats, Pacer};
pub use report::Reporter;
