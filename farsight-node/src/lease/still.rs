//! Camera lease replaying a still image

use super::{already_started, already_stopped, CameraLease, Lease};
use farsight_core::Error;
use farsight_eye::Frame;
use std::path::PathBuf;
use tracing::info;

/// Serves the same image file as every frame. Used when the node is built
/// without a capture backend, and for bench runs against recorded frames.
pub struct StillCamera {
    path: Option<PathBuf>,
    frame: Option<Frame>,
}

impl StillCamera {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path, frame: None }
    }
}

impl Lease for StillCamera {
    fn name(&self) -> &'static str {
        "still camera"
    }

    fn start(&mut self) -> Result<(), Error> {
        if self.frame.is_some() {
            return Err(already_started(self.name()));
        }
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| Error::resource_unavailable("no camera source configured"))?;
        let frame = image::open(path)
            .map_err(|e| {
                Error::resource_unavailable(format!(
                    "could not open camera source {}: {}",
                    path.display(),
                    e
                ))
            })?
            .to_rgb8();
        info!("Still camera started from {} ({}x{})", path.display(), frame.width(), frame.height());
        self.frame = Some(frame);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        match self.frame.take() {
            Some(_) => {
                info!("Still camera stopped");
                Ok(())
            }
            None => Err(already_stopped(self.name())),
        }
    }

    fn is_started(&self) -> bool {
        self.frame.is_some()
    }
}

impl CameraLease for StillCamera {
    fn read(&mut self) -> Result<Frame, Error> {
        self.frame
            .clone()
            .ok_or_else(|| Error::invalid_operation("can not read from the camera while it is stopped"))
    }
}
