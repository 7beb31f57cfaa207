//! Debug display of processed frames

use farsight_eye::Frame;
use tracing::warn;

/// Shows overlay frames in a window when the node is built with the
/// `opencv` feature; otherwise a requested display is only warned about.
pub struct Display {
    enabled: bool,
}

impl Display {
    pub fn new(requested: bool) -> Self {
        let enabled = requested && cfg!(feature = "opencv");
        if requested && !enabled {
            warn!("Display requested, but this build has no window support (feature `opencv`)");
        }
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn show(&self, name: &str, frame: &Frame) {
        if !self.enabled {
            return;
        }
        #[cfg(feature = "opencv")]
        {
            use crate::lease::capture::frame_to_mat;
            let shown = frame_to_mat(frame).and_then(|mat| {
                opencv::highgui::imshow(name, &mat)
                    .map_err(|e| farsight_core::Error::library(format!("imshow failed: {}", e)))
            });
            if let Err(e) = shown {
                warn!("Could not display {}: {}", name, e);
            }
        }
        #[cfg(not(feature = "opencv"))]
        let _ = (name, frame);
    }

    /// Service window events; call once per loop iteration
    pub fn poll(&self) {
        #[cfg(feature = "opencv")]
        if self.enabled {
            let _ = opencv::highgui::poll_key();
        }
    }
}
