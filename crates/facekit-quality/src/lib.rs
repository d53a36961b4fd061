//! facekit-quality — face acquisition quality scoring.
//!
//! Combines head-pose alignment, blur, brightness, contrast, and
//! eye-openness into a single normalized score in [0, 1]. Quality is
//! advisory: any internal failure collapses to the worst score (0.0)
//! instead of propagating.

pub mod analysis;
pub mod engine;
pub mod params;
pub mod scoring;
pub mod stats;

pub use engine::{calculate_face_quality, detection_quality, QualityOptions};
pub use params::{QualityParameters, QualityWeights};
