// farsight vision node

use anyhow::Context;
use clap::{Parser, ValueEnum};
use farsight_core::{Mode, TargetKind, TargetSet};
use farsight_node::shutdown;
use farsight_node::telemetry::{self, CRITICAL};
use farsight_node::{NodeConfig, Pacer, VisionNode};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TargetType {
    RedBall,
    BlueBall,
    All,
}

impl From<TargetType> for TargetSet {
    fn from(target: TargetType) -> Self {
        match target {
            TargetType::RedBall => TargetSet::only(TargetKind::RedBall),
            TargetType::BlueBall => TargetSet::only(TargetKind::BlueBall),
            TargetType::All => TargetSet::all(),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "farsight")]
#[command(about = "Onboard vision node: finds colored targets and reports them over MQTT", long_about = None)]
#[command(version)]
struct Args {
    /// How much to log: 0 nothing, 1 critical, 2 errors, 3 warnings, 4 info
    #[arg(short = 'l', long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(0..=4))]
    log_level: u8,

    /// TOML configuration file, applied before environment and flags
    #[arg(long)]
    config: Option<PathBuf>,

    /// Publish targets to the MQTT broker on this host
    #[arg(short = 'm', long)]
    mqtt: Option<String>,

    /// MQTT broker port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Topic to publish target data on
    #[arg(short = 't', long)]
    topic: Option<String>,

    /// Topic to receive mode and target commands from
    #[arg(short = 'c', long)]
    control_topic: Option<String>,

    /// Topic to send errors on
    #[arg(short = 'e', long)]
    error_topic: Option<String>,

    /// Host receiving the remote viewing stream
    #[arg(long)]
    rtp_host: Option<String>,

    /// Port receiving the remote viewing stream
    #[arg(long)]
    rtp_port: Option<u16>,

    /// Start in remote viewing instead of vision
    #[arg(short = 'r', long)]
    remote_viewing: bool,

    /// Targets to look for at startup
    #[arg(long, value_enum)]
    target_type: Option<TargetType>,

    /// Maximum frames per second
    #[arg(short = 'f', long)]
    fps: Option<u32>,

    /// Width of frames used for vision and remote viewing
    #[arg(short = 'w', long)]
    image_width: Option<u32>,

    /// Height of frames used for vision and remote viewing
    #[arg(short = 'H', long)]
    image_height: Option<u32>,

    /// Width read from the camera
    #[arg(long)]
    cam_width: Option<u32>,

    /// Height read from the camera
    #[arg(long)]
    cam_height: Option<u32>,

    /// Horizontal field of view of the camera, in degrees
    #[arg(long)]
    fov: Option<f64>,

    /// Display processed frames
    #[arg(short = 'd', long)]
    display: bool,

    /// Threads used for parallel processing
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Camera device or image file; the default camera when omitted
    #[arg(short = 'a', long)]
    camera: Option<String>,

    /// Directory with one 8-bit RGB `<kind>-template.png` per target kind
    template_dir: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut NodeConfig) {
        if let Some(host) = &self.mqtt {
            config.bus.enabled = true;
            config.bus.host = host.clone();
        }
        if let Some(port) = self.port {
            config.bus.port = port;
        }
        if let Some(topic) = &self.topic {
            config.bus.data_topic = topic.clone();
        }
        if let Some(topic) = &self.control_topic {
            config.bus.control_topic = topic.clone();
        }
        if let Some(topic) = &self.error_topic {
            config.bus.error_topic = topic.clone();
        }

        if let Some(host) = &self.rtp_host {
            config.stream.host = host.clone();
        }
        if let Some(port) = self.rtp_port {
            config.stream.port = port;
        }

        if self.remote_viewing {
            config.startup.mode = Mode::RemoteViewing;
        }
        if let Some(target) = self.target_type {
            config.startup.targets = target.into();
        }

        if let Some(fps) = self.fps {
            config.camera.max_fps = fps;
            config.stream.framerate = Some(fps);
        }
        if let Some(width) = self.image_width {
            config.processing.width = Some(width);
            config.stream.output_width = width;
        }
        if let Some(height) = self.image_height {
            config.processing.height = Some(height);
            config.stream.output_height = height;
        }
        if let Some(width) = self.cam_width {
            config.camera.width = width;
            config.stream.capture_width = width;
        }
        if let Some(height) = self.cam_height {
            config.camera.height = height;
            config.stream.capture_height = height;
        }

        if let Some(fov) = self.fov {
            config.processing.engine.fov_degrees = fov;
        }
        if self.display {
            config.processing.engine.display = true;
        }
        if let Some(threads) = self.threads {
            config.processing.engine.threads = threads;
        }
        if let Some(camera) = &self.camera {
            config.camera.device = Some(camera.clone());
        }
        if let Some(dir) = &self.template_dir {
            config.template_dir = Some(dir.clone());
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<NodeConfig> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    config.apply_env();
    args.apply(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = load_config(args)?;
    info!(
        "Starting farsight in {} mode, searching for {}",
        config.startup.mode, config.startup.targets
    );

    let mut node = VisionNode::from_config(&config)?;
    let mut pacer = Pacer::new(config.camera.max_fps);
    let stop = Arc::new(AtomicBool::new(false));
    if let Err(e) = shutdown::on_signal(stop.clone()) {
        warn!("Running without signal handling: {}", e);
    }
    node.run(&mut pacer, &stop);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    telemetry::init(args.log_level);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(target: CRITICAL, "{:#}", e);
            ExitCode::FAILURE
        }
    }
}
