//! In-process GStreamer video stream lease

use super::{already_started, already_stopped, Lease, StreamLease, StreamSettings};
use farsight_core::Error;
use gstreamer as gst;
use gstreamer::prelude::*;
use tracing::{info, warn};

struct Running {
    pipeline: gst::Element,
    bus: gst::Bus,
}

/// Builds the pipeline from [`StreamSettings`] and drives it in-process
pub struct GstStream {
    settings: StreamSettings,
    running: Option<Running>,
}

impl GstStream {
    pub fn new(settings: StreamSettings) -> Result<Self, Error> {
        gst::init().map_err(|e| Error::library(format!("could not initialize gstreamer: {}", e)))?;
        Ok(Self { settings, running: None })
    }
}

impl Lease for GstStream {
    fn name(&self) -> &'static str {
        "video stream"
    }

    fn start(&mut self) -> Result<(), Error> {
        if self.running.is_some() {
            return Err(already_started(self.name()));
        }

        let pipeline = gst::parse_launch(&self.settings.description())
            .map_err(|e| Error::library(format!("could not build video pipeline: {}", e)))?;
        let bus = pipeline
            .bus()
            .ok_or_else(|| Error::internal("video pipeline has no bus"))?;

        if let Err(e) = pipeline.set_state(gst::State::Playing) {
            let _ = pipeline.set_state(gst::State::Null);
            return Err(Error::resource_unavailable(format!("could not start video stream: {}", e)));
        }

        info!("Video stream started to {}:{}", self.settings.host, self.settings.port);
        self.running = Some(Running { pipeline, bus });
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        let running = self.running.take().ok_or_else(|| already_stopped(self.name()))?;
        match running.pipeline.set_state(gst::State::Null) {
            Ok(_) => {
                info!("Video stream stopped");
                Ok(())
            }
            Err(e) => {
                warn!("Could not stop video pipeline: {}", e);
                Err(Error::library(format!("could not stop video stream: {}", e)))
            }
        }
    }

    fn is_started(&self) -> bool {
        self.running.is_some()
    }
}

impl StreamLease for GstStream {
    fn update(&mut self) -> Result<(), Error> {
        let running = self
            .running
            .as_ref()
            .ok_or_else(|| Error::invalid_operation("video stream is not running"))?;

        let Some(message) = running
            .bus
            .pop_filtered(&[gst::MessageType::Error, gst::MessageType::Eos])
        else {
            return Ok(());
        };

        match message.view() {
            gst::MessageView::Error(err) => Err(Error::library(format!(
                "video pipeline error: {} ({:?})",
                err.error(),
                err.debug()
            ))),
            gst::MessageView::Eos(_) => Err(Error::library("video stream ended")),
            _ => Ok(()),
        }
    }
}

impl Drop for GstStream {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            if running.pipeline.set_state(gst::State::Null).is_err() {
                warn!("Could not set video pipeline state to null");
            }
        }
    }
}
