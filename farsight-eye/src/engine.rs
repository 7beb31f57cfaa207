//! Target scoring engine
//!
//! For every profile whose kind is requested, a frame goes through
//! threshold → opening → contour extraction → scoring → localization.
//! A region's score is the weighted sum of three features compared against
//! the profile's template:
//!
//! - shape distance (Hu invariants, 0 for a perfect match) × `contour_match`
//! - `similarity(area / bbox area, template area fraction, 70)` × `area_fraction`
//! - `similarity(log2(bbox w / bbox h), template log aspect, 100)` × `aspect_ratio`
//!
//! Regions scoring at least the profile's `min_score` become detections.

use crate::color;
use crate::config::EngineConfig;
use crate::contour::{self, BoundingBox, CandidateRegion};
use crate::overlay::Overlay;
use crate::profile::TargetProfile;
use crate::shape::{self, HuMoments};
use crate::similarity::similarity;
use crate::utils::timed;
use crate::Frame;
use farsight_core::{Detection, Error, TargetSet};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::info;

/// Sensitivity of the area-fraction feature
pub const AREA_FRACTION_SENSITIVITY: f64 = 70.0;
/// Sensitivity of the log aspect ratio feature
pub const ASPECT_RATIO_SENSITIVITY: f64 = 100.0;

/// Camera geometry of one frame size, used to turn a bounding box into a
/// distance and an angle (pinhole model, no distortion correction)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    width: f64,
    height: f64,
    fovx: f64,
    /// Height of the whole frame at unit distance
    unit_frame_height: f64,
}

impl FrameGeometry {
    pub fn new(width: u32, height: u32, fov_degrees: f64) -> Self {
        let (width, height) = (width as f64, height as f64);
        let fovy = fov_degrees * width / height;
        Self {
            width,
            height,
            fovx: fov_degrees,
            unit_frame_height: 2.0 * fovy.to_radians().tan(),
        }
    }

    /// Vertical field of view in degrees
    pub fn fovy(&self) -> f64 {
        self.fovx * self.width / self.height
    }

    /// `(distance, angle)` of a target of physical height `target_height`
    /// whose bounding box is `bbox`. Angle is in degrees, positive right of
    /// the optical axis.
    pub fn locate(&self, bbox: &BoundingBox, target_height: f64) -> (f64, f64) {
        let (center_x, _) = bbox.center();
        let x_normalized = (center_x - self.width / 2.0) * (2.0 / self.width);
        let angle = x_normalized * self.fovx;

        let unit_fraction = target_height / self.unit_frame_height;
        let fraction = bbox.height as f64 / self.height;
        (unit_fraction / fraction, angle)
    }
}

/// Scores candidate regions of a frame against the loaded profiles
pub struct TargetEngine {
    config: EngineConfig,
    profiles: Vec<TargetProfile>,
    pool: Option<ThreadPool>,
}

impl TargetEngine {
    pub fn new(config: EngineConfig, profiles: Vec<TargetProfile>) -> Result<Self, Error> {
        config.validate().map_err(Error::invalid_args)?;

        let pool = if config.threads > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .thread_name(|i| format!("farsight-eye-{}", i))
                .build()
                .map_err(|e| Error::library(format!("could not build worker pool: {}", e)))?;
            Some(pool)
        } else {
            None
        };

        info!(
            "Target engine ready: {} profiles, {} threads, fov {}°",
            profiles.len(),
            config.threads,
            config.fov_degrees
        );

        Ok(Self { config, profiles, pool })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn profiles(&self) -> &[TargetProfile] {
        &self.profiles
    }

    /// Detections of the requested kinds, grouped by profile in load order
    pub fn process(&self, frame: &Frame, targets: TargetSet) -> Vec<Detection> {
        let mut out = Vec::new();
        self.scan(frame, targets, |_, _, detection| out.push(detection));
        out
    }

    /// Like [`TargetEngine::process`], also returning a copy of the frame
    /// with every accepted region outlined
    pub fn process_with_overlay(&self, frame: &Frame, targets: TargetSet) -> (Vec<Detection>, Frame) {
        let mut out = Vec::new();
        let mut overlay = Overlay::new(frame.clone());
        self.scan(frame, targets, |profile, region, detection| {
            overlay.mark(region, profile.params.overlay_color);
            out.push(detection);
        });
        (out, overlay.into_image())
    }

    fn scan(
        &self,
        frame: &Frame,
        targets: TargetSet,
        mut accept: impl FnMut(&TargetProfile, &CandidateRegion, Detection),
    ) {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return;
        }
        let geometry = FrameGeometry::new(width, height, self.config.fov_degrees);

        for profile in &self.profiles {
            if !targets.contains(profile.kind()) {
                continue;
            }
            let name = profile.params.name.as_str();

            let mask = timed(name, "threshold", || {
                color::threshold(frame, &profile.params.thresholds, self.pool.as_ref())
            });
            let mask = timed(name, "morphology", || contour::open(&mask));
            let mut regions = timed(name, "contours", || contour::find_regions(&mask));

            timed(name, "matching", || {
                for region in &mut regions {
                    region.score = score_region(profile, region);
                }
            });

            for region in &regions {
                if region.score < profile.params.min_score {
                    continue;
                }
                let (distance, angle) =
                    geometry.locate(&region.bounding_box, profile.params.target_height);
                let detection = Detection {
                    kind: profile.kind(),
                    distance,
                    angle,
                    score: region.score,
                };
                accept(profile, region, detection);
            }
        }
    }
}

/// Weighted closeness of `region` to the profile's template
pub fn score_region(profile: &TargetProfile, region: &CandidateRegion) -> f64 {
    let template = &profile.template;
    let weights = &profile.params.weights;

    let shape_distance = shape::match_shapes(&template.hu, &HuMoments::of_contour(&region.contour));
    let area_score = similarity(
        region.area_fraction(),
        template.area_fraction,
        AREA_FRACTION_SENSITIVITY,
    );
    let aspect_score = similarity(
        region.bounding_box.log_aspect_ratio(),
        template.log_aspect_ratio,
        ASPECT_RATIO_SENSITIVITY,
    );

    shape_distance * weights.contour_match
        + area_score * weights.area_fraction
        + aspect_score * weights.aspect_ratio
}
