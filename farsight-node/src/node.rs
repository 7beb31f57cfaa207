//! The vision node: one paced loop driving orchestration and scoring

use crate::bus::{MessageBus, MqttBus};
use crate::config::NodeConfig;
use crate::control;
use crate::display::Display;
use crate::lease::{CameraLease, StreamLease};
use crate::orchestrator::{Orchestrator, StateHandle};
use crate::pacing::{FrameStats, Pacer};
use crate::report::Reporter;
use farsight_core::{ErrorKind, FatalError, Mode};
use farsight_eye::{process_templates, Frame, ProfileParams, TargetEngine};
use image::imageops::{self, FilterType};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Frames between FPS summaries at info level
const STATS_SUMMARY_FRAMES: u64 = 300;

pub struct VisionNode {
    orchestrator: Orchestrator,
    engine: TargetEngine,
    reporter: Reporter,
    display: Display,
    processing_size: (u32, u32),
    stats: FrameStats,
}

impl VisionNode {
    pub fn new(
        orchestrator: Orchestrator,
        engine: TargetEngine,
        reporter: Reporter,
        display: Display,
        processing_size: (u32, u32),
        max_fps: u32,
    ) -> Self {
        Self {
            orchestrator,
            engine,
            reporter,
            display,
            processing_size,
            stats: FrameStats::new(max_fps),
        }
    }

    /// Build the node from configuration. Every failure here is fatal.
    pub fn from_config(config: &NodeConfig) -> Result<Self, FatalError> {
        let template_dir = config.template_dir.as_deref().ok_or_else(|| {
            FatalError::from(farsight_core::Error::invalid_args("no template directory configured"))
        })?;
        let profiles = process_templates(&ProfileParams::builtin(), template_dir)?;
        let engine = TargetEngine::new(config.processing.engine.clone(), profiles)?;

        let state = StateHandle::new(config.startup.mode, config.startup.targets);

        let bus: Option<Arc<dyn MessageBus>> = if config.bus.enabled {
            let bus = MqttBus::connect(&config.bus)?;
            if let Err(e) = control::subscribe(&bus, &config.bus.control_topic, state.clone()) {
                warn!("Could not subscribe to control topic {}: {}", config.bus.control_topic, e);
            }
            Some(Arc::new(bus))
        } else {
            info!("No message bus configured, reports are only logged");
            None
        };

        let orchestrator = Orchestrator::new(state, build_camera(config), build_stream(config)?);

        Ok(Self::new(
            orchestrator,
            engine,
            Reporter::new(bus, &config.bus),
            Display::new(config.processing.engine.display),
            config.processing_size(),
            config.camera.max_fps,
        ))
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn state(&self) -> &StateHandle {
        self.orchestrator.state()
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// One loop iteration, without pacing
    pub fn run_once(&mut self) {
        if let Some(change) = self.orchestrator.step() {
            self.reporter.mode_change(&change);
        }

        match self.orchestrator.active() {
            Mode::Vision => match self.orchestrator.camera_mut().read() {
                Ok(frame) => self.process_frame(frame),
                Err(e) if e.is(ErrorKind::ResourceUnavailable) => {
                    warn!("Could not read frame from camera, skipping vision processing: {}", e);
                }
                Err(e) => {
                    let change = self.orchestrator.fail(e);
                    self.reporter.mode_change(&change);
                }
            },
            Mode::RemoteViewing => {
                if let Err(e) = self.orchestrator.stream_mut().update() {
                    let change = self.orchestrator.fail(e);
                    self.reporter.mode_change(&change);
                }
            }
            Mode::Idle => {}
        }

        self.display.poll();
    }

    /// Run paced iterations until `stop` is set
    pub fn run(&mut self, pacer: &mut Pacer, stop: &AtomicBool) {
        info!("Vision node running at up to {:?} per frame", pacer.interval());
        while !stop.load(Ordering::Relaxed) {
            pacer.begin();
            self.run_once();
            pacer.wait();
        }
        info!("Vision node stopped after {} frames", self.stats.frames());
    }

    fn process_frame(&mut self, frame: Frame) {
        let frame = fit(frame, self.processing_size);
        let targets = self.orchestrator.state().targets();

        let start = Instant::now();
        let detections = if self.display.is_enabled() {
            let (detections, overlay) = self.engine.process_with_overlay(&frame, targets);
            self.display.show("Targets", &overlay);
            detections
        } else {
            self.engine.process(&frame, targets)
        };
        self.stats.record(start.elapsed());

        debug!(
            instantaneous_fps = self.stats.instantaneous_fps(),
            average_fps = self.stats.average_fps(),
            "frame processed"
        );
        if self.stats.frames() % STATS_SUMMARY_FRAMES == 0 {
            info!(
                "Processed {} frames, average {:.1} fps",
                self.stats.frames(),
                self.stats.average_fps()
            );
        }

        self.reporter.detections(&detections);
    }
}

/// Resize `frame` to the processing size if it differs
fn fit(frame: Frame, (width, height): (u32, u32)) -> Frame {
    if frame.dimensions() == (width, height) {
        frame
    } else {
        imageops::resize(&frame, width, height, FilterType::Triangle)
    }
}

#[cfg(feature = "opencv")]
fn build_camera(config: &NodeConfig) -> Box<dyn CameraLease> {
    use crate::lease::{CaptureSettings, OpenCvCamera};
    Box::new(OpenCvCamera::new(CaptureSettings {
        device: config.camera.device.clone(),
        width: config.camera.width,
        height: config.camera.height,
        fps: config.camera.max_fps,
    }))
}

#[cfg(not(feature = "opencv"))]
fn build_camera(config: &NodeConfig) -> Box<dyn CameraLease> {
    use crate::lease::StillCamera;
    Box::new(StillCamera::new(config.camera.device.as_ref().map(Into::into)))
}

#[cfg(feature = "gstreamer")]
fn build_stream(config: &NodeConfig) -> Result<Box<dyn StreamLease>, FatalError> {
    Ok(Box::new(crate::lease::GstStream::new(config.stream.clone())?))
}

#[cfg(not(feature = "gstreamer"))]
fn build_stream(config: &NodeConfig) -> Result<Box<dyn StreamLease>, FatalError> {
    Ok(Box::new(crate::lease::LaunchStream::new(config.stream.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_resizes_only_when_needed() {
        let frame = Frame::new(64, 48);
        assert_eq!(fit(frame.clone(), (64, 48)).dimensions(), (64, 48));
        assert_eq!(fit(frame, (32, 24)).dimensions(), (32, 24));
    }
}
