//! Video stream lease backed by an external launcher process

use super::{already_started, already_stopped, Lease, StreamLease, StreamSettings};
use farsight_core::Error;
use std::process::{Child, Command, Stdio};
use tracing::{debug, info, warn};

/// Runs the configured launcher (`gst-launch-1.0` by default) with the
/// pipeline rendered as arguments. The stream lives as long as the process.
pub struct LaunchStream {
    settings: StreamSettings,
    child: Option<Child>,
}

impl LaunchStream {
    pub fn new(settings: StreamSettings) -> Self {
        Self { settings, child: None }
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }
}

impl Lease for LaunchStream {
    fn name(&self) -> &'static str {
        "video stream"
    }

    fn start(&mut self) -> Result<(), Error> {
        if self.child.is_some() {
            return Err(already_started(self.name()));
        }

        let args = self.settings.launch_args();
        debug!("Launching {} {}", self.settings.launcher, args.join(" "));
        let child = Command::new(&self.settings.launcher)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| {
                Error::resource_unavailable(format!(
                    "could not launch video stream with {}: {}",
                    self.settings.launcher, e
                ))
            })?;

        info!(
            "Video stream started (pid {}) to {}:{}",
            child.id(),
            self.settings.host,
            self.settings.port
        );
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        let mut child = self.child.take().ok_or_else(|| already_stopped(self.name()))?;

        // Fails if the process already exited, which is fine here
        if let Err(e) = child.kill() {
            debug!("Video stream process was not running: {}", e);
        }
        match child.wait() {
            Ok(status) => {
                info!("Video stream stopped ({})", status);
                Ok(())
            }
            Err(e) => {
                warn!("Could not reap video stream process: {}", e);
                Err(Error::library(format!("could not stop video stream: {}", e)))
            }
        }
    }

    fn is_started(&self) -> bool {
        self.child.is_some()
    }
}

impl StreamLease for LaunchStream {
    fn update(&mut self) -> Result<(), Error> {
        let child = self
            .child
            .as_mut()
            .ok_or_else(|| Error::invalid_operation("video stream is not running"))?;

        match child.try_wait() {
            Ok(None) => Ok(()),
            Ok(Some(status)) => Err(Error::library(format!("video stream ended ({})", status))),
            Err(e) => Err(Error::library(format!("could not poll video stream: {}", e))),
        }
    }
}

impl Drop for LaunchStream {
    fn drop(&mut self) {
        if self.child.is_some() {
            let _ = self.stop();
        }
    }
}
