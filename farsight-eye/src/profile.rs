//! Per-kind target profiles and template loading
//!
//! A profile is built once at startup from its [`ProfileParams`] and the
//! template image named there, then shared read-only by the engine.

use crate::color::{self, HsvRange};
use crate::contour::{self, CandidateRegion};
use crate::shape::HuMoments;
use crate::Frame;
use farsight_core::{Error, TargetKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Weights applied to each closeness feature before summing.
///
/// Weights are not normalized. The contour weight multiplies a shape
/// *distance* (0 for a perfect match), so it is normally negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub contour_match: f64,
    pub area_fraction: f64,
    pub aspect_ratio: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            contour_match: -1.0,
            area_fraction: 2.0,
            aspect_ratio: 2.0,
        }
    }
}

/// Static tuning of one target kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileParams {
    pub kind: TargetKind,
    /// Display name, also used to label timing logs
    pub name: String,
    pub thresholds: HsvRange,
    /// File name inside the template directory
    pub template_file: String,
    /// Physical height of the target, in scene units
    pub target_height: f64,
    pub min_score: f64,
    pub weights: ScoreWeights,
    /// RGB colour of the bounding box drawn in the overlay
    pub overlay_color: [u8; 3],
}

impl ProfileParams {
    pub fn red_ball() -> Self {
        Self {
            kind: TargetKind::RedBall,
            name: "Red Ball".to_string(),
            thresholds: HsvRange::new([0, 120, 70], [10, 255, 255]),
            template_file: "red_ball-template.png".to_string(),
            target_height: 0.24,
            min_score: 1.5,
            weights: ScoreWeights::default(),
            overlay_color: [255, 0, 0],
        }
    }

    pub fn blue_ball() -> Self {
        Self {
            kind: TargetKind::BlueBall,
            name: "Blue Ball".to_string(),
            thresholds: HsvRange::new([100, 120, 70], [130, 255, 255]),
            template_file: "blue_ball-template.png".to_string(),
            target_height: 0.24,
            min_score: 1.5,
            weights: ScoreWeights::default(),
            overlay_color: [0, 0, 255],
        }
    }

    /// One profile per supported kind
    pub fn builtin() -> Vec<ProfileParams> {
        vec![Self::red_ball(), Self::blue_ball()]
    }
}

/// Reference outline a candidate region is compared against
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateShape {
    pub hu: HuMoments,
    pub area_fraction: f64,
    pub log_aspect_ratio: f64,
}

impl TemplateShape {
    /// Derive the template from the largest region of `image` within `range`
    pub fn from_image(image: &Frame, range: &HsvRange) -> Option<TemplateShape> {
        let mask = contour::open(&color::threshold(image, range, None));
        let largest = contour::find_regions(&mask)
            .into_iter()
            .filter(|region| region.area > 0.0)
            .max_by(|a, b| a.area.total_cmp(&b.area))?;
        Some(TemplateShape::from_region(&largest))
    }

    pub fn from_region(region: &CandidateRegion) -> TemplateShape {
        TemplateShape {
            hu: HuMoments::of_contour(&region.contour),
            area_fraction: region.area_fraction(),
            log_aspect_ratio: region.bounding_box.log_aspect_ratio(),
        }
    }
}

/// A fully loaded profile, ready for scoring
#[derive(Debug, Clone)]
pub struct TargetProfile {
    pub params: ProfileParams,
    pub template: TemplateShape,
}

impl TargetProfile {
    pub fn new(params: ProfileParams, template: TemplateShape) -> Self {
        Self { params, template }
    }

    pub fn kind(&self) -> TargetKind {
        self.params.kind
    }

    /// Load the template image named by `params` from `dir`
    pub fn load(params: ProfileParams, dir: &Path) -> Result<TargetProfile, Error> {
        let path = dir.join(&params.template_file);
        let image = image::open(&path)
            .map_err(|e| {
                Error::resource_unavailable(format!(
                    "could not open template file {}: {}",
                    path.display(),
                    e
                ))
            })?
            .to_rgb8();

        let template = TemplateShape::from_image(&image, &params.thresholds).ok_or_else(|| {
            Error::resource_unavailable(format!(
                "could not find any contours in template file {}",
                path.display()
            ))
        })?;

        debug!(
            profile = %params.name,
            area_fraction = template.area_fraction,
            log_aspect_ratio = template.log_aspect_ratio,
            "Template processed"
        );

        Ok(TargetProfile::new(params, template))
    }
}

/// Load every profile's template from `dir`. Any missing or unusable template
/// fails the whole call.
pub fn process_templates(params: &[ProfileParams], dir: &Path) -> Result<Vec<TargetProfile>, Error> {
    let profiles = params
        .iter()
        .cloned()
        .map(|p| TargetProfile::load(p, dir))
        .collect::<Result<Vec<_>, _>>()?;
    info!("Loaded {} target templates from {}", profiles.len(), dir.display());
    Ok(profiles)
}
