use serde::{Deserialize, Serialize};

/// Relative weights of the quality metrics.
///
/// Weights are non-negative and need not sum to 1 — normalization happens
/// at evaluation time over the metrics that actually apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    pub alignment: f64,
    pub blur: f64,
    pub brightness: f64,
    pub contrast: f64,
    pub eye_openness: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            alignment: 0.3,
            blur: 0.3,
            brightness: 0.3,
            contrast: 0.1,
            eye_openness: 0.0,
        }
    }
}

/// Thresholds for the quality metrics, in each metric's native units:
/// degrees for angles, Laplacian variance for blur, gray levels (0–255)
/// for brightness, gray-level standard deviation for contrast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityParameters {
    /// Angle beyond which an individual pose component scores 0.
    pub max_alignment_angle: f64,
    /// Hard limit — any single angle beyond this rejects the face outright.
    pub max_individual_angle: f64,
    pub min_blur: f64,
    pub max_blur: f64,
    pub min_brightness: f64,
    pub optimal_brightness_low: f64,
    pub optimal_brightness_high: f64,
    pub max_brightness: f64,
    pub brightness_steepness: f64,
    pub min_contrast: f64,
    pub max_contrast: f64,
}

impl Default for QualityParameters {
    fn default() -> Self {
        Self {
            max_alignment_angle: 20.0,
            max_individual_angle: 25.0,
            min_blur: 50_000.0,
            max_blur: 100_000.0,
            min_brightness: 30.0,
            optimal_brightness_low: 80.0,
            optimal_brightness_high: 150.0,
            max_brightness: 190.0,
            brightness_steepness: 0.3,
            min_contrast: 30.0,
            max_contrast: 47.0,
        }
    }
}
