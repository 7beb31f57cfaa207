//! farsight-eye: colored target scoring for the farsight vision node
//!
//! Finds targets of the requested kinds in an RGB frame. Each kind has a
//! [`TargetProfile`]: an HSV threshold range, a reference template shape and
//! per-feature score weights. Regions that pass the threshold are scored
//! against the template and accepted ones are localized into a
//! [`farsight_core::Detection`] with distance and angle.

pub mod color;
pub mod config;
pub mod contour;
pub mod engine;
pub mod overlay;
pub mod profile;
pub mod shape;
pub mod similarity;
mod utils;

pub use config::EngineConfig;
pub use contour::{BoundingBox, CandidateRegion};
pub use engine::{FrameGeometry, TargetEngine};
pub use profile::{process_templates, ProfileParams, ScoreWeights, TargetProfile, TemplateShape};
pub use similarity::similarity;

/// Frames are 8-bit, 3-channel, RGB channel order
pub type Frame = image::RgbImage;
