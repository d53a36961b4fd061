//! Per-metric quality analyses.

use crate::scoring::{plateau_score, ramp_score};
use crate::stats;
use image::RgbImage;

/// Head-pose alignment score from pitch, yaw, and roll (degrees).
///
/// Any single angle beyond `max_individual_angle` rejects the face
/// outright; otherwise each angle contributes `max(0, 1 - |angle| /
/// max_angle)` and the three are averaged.
pub fn alignment_score(
    pitch: f64,
    yaw: f64,
    roll: f64,
    max_angle: f64,
    max_individual_angle: f64,
) -> f64 {
    if pitch.abs() > max_individual_angle
        || yaw.abs() > max_individual_angle
        || roll.abs() > max_individual_angle
    {
        return 0.0;
    }

    let pitch_score = (1.0 - pitch.abs() / max_angle).max(0.0);
    let yaw_score = (1.0 - yaw.abs() / max_angle).max(0.0);
    let roll_score = (1.0 - roll.abs() / max_angle).max(0.0);

    (pitch_score + yaw_score + roll_score) / 3.0
}

/// Sharpness score: ramp over the Laplacian variance.
pub fn blur_score(image: &RgbImage, min_blur: f64, max_blur: f64) -> f64 {
    ramp_score(stats::laplacian_variance(image), min_blur, max_blur)
}

/// Brightness score: plateau over the mean gray level.
pub fn brightness_score(
    image: &RgbImage,
    edge_low: f64,
    center_low: f64,
    center_high: f64,
    edge_high: f64,
    steepness: f64,
) -> f64 {
    plateau_score(
        stats::mean_brightness(image),
        center_low,
        center_high,
        edge_low,
        edge_high,
        steepness,
    )
}

/// Contrast score: ramp over the gray-level standard deviation.
pub fn contrast_score(image: &RgbImage, min_contrast: f64, max_contrast: f64) -> f64 {
    ramp_score(stats::contrast_stddev(image), min_contrast, max_contrast)
}
