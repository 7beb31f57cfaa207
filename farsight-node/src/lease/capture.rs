//! V4L2 camera lease through OpenCV

use super::{already_started, already_stopped, CameraLease, Lease};
use farsight_core::Error;
use farsight_eye::Frame;
use opencv::{
    core::{Mat, Scalar, CV_8UC3},
    imgproc,
    prelude::*,
    videoio::{VideoCapture, CAP_PROP_FPS, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH, CAP_V4L2},
};
use tracing::{info, warn};

/// Capture device settings
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// Device file; camera index 0 when unset
    pub device: Option<String>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

pub struct OpenCvCamera {
    settings: CaptureSettings,
    capture: Option<VideoCapture>,
}

impl OpenCvCamera {
    pub fn new(settings: CaptureSettings) -> Self {
        Self { settings, capture: None }
    }

    fn open(&self) -> Result<VideoCapture, opencv::Error> {
        // V4L2 explicitly: the default backend may pick GStreamer, which
        // fails to open plain devices
        match &self.settings.device {
            Some(device) => VideoCapture::from_file(device, CAP_V4L2),
            None => {
                let mut capture = VideoCapture::new(0, CAP_V4L2)?;
                capture.set(CAP_PROP_FRAME_WIDTH, self.settings.width as f64)?;
                capture.set(CAP_PROP_FRAME_HEIGHT, self.settings.height as f64)?;
                capture.set(CAP_PROP_FPS, self.settings.fps as f64)?;
                Ok(capture)
            }
        }
    }
}

impl Lease for OpenCvCamera {
    fn name(&self) -> &'static str {
        "vision camera"
    }

    fn start(&mut self) -> Result<(), Error> {
        if self.capture.is_some() {
            return Err(already_started(self.name()));
        }

        let capture = self
            .open()
            .map_err(|e| Error::resource_unavailable(format!("could not start vision camera: {}", e)))?;
        if !capture.is_opened().unwrap_or(false) {
            return Err(Error::resource_unavailable("could not start vision camera"));
        }

        info!(
            "Vision camera {} started at {}x{} @ {}fps",
            self.settings.device.as_deref().unwrap_or("0"),
            self.settings.width,
            self.settings.height,
            self.settings.fps
        );
        self.capture = Some(capture);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        let mut capture = self.capture.take().ok_or_else(|| already_stopped(self.name()))?;
        if let Err(e) = capture.release() {
            warn!("Error releasing vision camera: {}", e);
            return Err(Error::library(format!("could not release vision camera: {}", e)));
        }
        info!("Vision camera stopped");
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.capture.is_some()
    }
}

impl CameraLease for OpenCvCamera {
    fn read(&mut self) -> Result<Frame, Error> {
        let capture = self
            .capture
            .as_mut()
            .ok_or_else(|| Error::invalid_operation("can not read from vision camera if it is stopped"))?;

        let mut bgr = Mat::default();
        let grabbed = capture
            .read(&mut bgr)
            .map_err(|e| Error::library(format!("camera read failed: {}", e)))?;
        if !grabbed || bgr.empty() {
            return Err(Error::resource_unavailable("could not read next frame from camera"));
        }

        mat_to_frame(&bgr)
    }
}

/// Convert an 8-bit BGR `Mat` into an RGB frame
pub fn mat_to_frame(bgr: &Mat) -> Result<Frame, Error> {
    let mut rgb = Mat::default();
    imgproc::cvt_color(bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0)
        .map_err(|e| Error::library(format!("failed to convert color: {}", e)))?;

    let (cols, rows) = (rgb.cols() as u32, rgb.rows() as u32);
    let bytes = rgb
        .data_bytes()
        .map_err(|e| Error::library(format!("failed to get frame data: {}", e)))?
        .to_vec();
    Frame::from_raw(cols, rows, bytes)
        .ok_or_else(|| Error::internal("camera frame size does not match its dimensions"))
}

/// Convert an RGB frame into a BGR `Mat` for display
pub fn frame_to_mat(frame: &Frame) -> Result<Mat, Error> {
    let mut rgb = Mat::new_rows_cols_with_default(
        frame.height() as i32,
        frame.width() as i32,
        CV_8UC3,
        Scalar::all(0.0),
    )
    .map_err(|e| Error::memory(format!("failed to allocate frame: {}", e)))?;
    rgb.data_bytes_mut()
        .map_err(|e| Error::library(format!("failed to get frame data: {}", e)))?
        .copy_from_slice(frame.as_raw());

    let mut bgr = Mat::default();
    imgproc::cvt_color(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0)
        .map_err(|e| Error::library(format!("failed to convert color: {}", e)))?;
    Ok(bgr)
}
