//! Exclusive holds on the camera and the video stream
//!
//! A lease is either started (it holds its device) or stopped. Starting a
//! started lease and stopping a stopped one are `InvalidOperation` errors and
//! leave the lease unchanged; the caller decides whether that matters.

use farsight_core::Error;
use farsight_eye::Frame;

pub mod launch;
pub mod pipeline;
pub mod still;

#[cfg(feature = "opencv")]
pub mod capture;
#[cfg(feature = "gstreamer")]
pub mod gst;

pub use launch::LaunchStream;
pub use pipeline::StreamSettings;
pub use still::StillCamera;

#[cfg(feature = "opencv")]
pub use capture::{CaptureSettings, OpenCvCamera};
#[cfg(feature = "gstreamer")]
pub use gst::GstStream;

/// Start/stop lifecycle shared by every lease
pub trait Lease: Send {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Acquire the device; `ResourceUnavailable` if it cannot be opened
    fn start(&mut self) -> Result<(), Error>;

    /// Release the device. After this returns the lease is stopped, even if
    /// releasing the underlying device reported an error.
    fn stop(&mut self) -> Result<(), Error>;

    fn is_started(&self) -> bool;
}

/// A lease on the camera used for vision
pub trait CameraLease: Lease {
    /// Next frame. `ResourceUnavailable` means this frame could not be read
    /// and the next one may succeed.
    fn read(&mut self) -> Result<Frame, Error>;
}

/// A lease on the outgoing video stream
pub trait StreamLease: Lease {
    /// Surface asynchronous stream failures without blocking
    fn update(&mut self) -> Result<(), Error>;
}

pub(crate) fn already_started(name: &str) -> Error {
    Error::invalid_operation(format!("{} is already started", name))
}

pub(crate) fn already_stopped(name: &str) -> Error {
    Error::invalid_operation(format!("{} is already stopped", name))
}
