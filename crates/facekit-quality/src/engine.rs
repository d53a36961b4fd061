//! Aggregate face quality scoring.

use crate::analysis;
use crate::params::{QualityParameters, QualityWeights};
use facekit_core::imageops::{self, ImageOpsError};
use facekit_core::types::FaceDetection;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Fixed working area for quality analysis, in pixels (nominal 256×256).
const WORKING_AREA: f64 = 65_536.0;

/// Cropping and threshold configuration for a quality evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityOptions {
    /// Fraction of the working image analyzed, centered (0–1].
    pub center_crop: f32,
    /// Horizontal shift of the analysis window, as a fraction of width.
    pub horizontal_displacement: f32,
    /// Vertical shift of the analysis window, as a fraction of height.
    pub vertical_displacement: f32,
    pub weights: QualityWeights,
    pub parameters: QualityParameters,
}

impl Default for QualityOptions {
    fn default() -> Self {
        Self {
            center_crop: 0.5,
            horizontal_displacement: 0.0,
            vertical_displacement: 0.0,
            weights: QualityWeights::default(),
            parameters: QualityParameters::default(),
        }
    }
}

/// Calculate the overall face quality score in [0, 1].
///
/// Pose angles are in degrees. The eye-openness metric participates only
/// when both probabilities are provided; with one or none, the metric and
/// its weight are excluded from the aggregate entirely (never treated as
/// zero).
///
/// Quality is advisory, so failure fails safe: any internal error
/// (degenerate crop, empty input) yields exactly 0.0 rather than
/// propagating. The result is deterministic for identical inputs.
#[allow(clippy::too_many_arguments)]
pub fn calculate_face_quality(
    image: &RgbImage,
    pitch: f64,
    yaw: f64,
    roll: f64,
    left_eye_openness: Option<f64>,
    right_eye_openness: Option<f64>,
    options: &QualityOptions,
) -> f32 {
    match try_calculate(
        image,
        pitch,
        yaw,
        roll,
        left_eye_openness,
        right_eye_openness,
        options,
    ) {
        Ok(score) => score.clamp(0.0, 1.0) as f32,
        Err(error) => {
            tracing::debug!(%error, "face quality computation failed, scoring worst case");
            0.0
        }
    }
}

/// Quality for one detector result, pulling pose and eye-openness from it.
pub fn detection_quality(
    image: &RgbImage,
    detection: &FaceDetection,
    options: &QualityOptions,
) -> f32 {
    calculate_face_quality(
        image,
        detection.pitch as f64,
        detection.yaw as f64,
        detection.roll as f64,
        detection.left_eye_openness.map(f64::from),
        detection.right_eye_openness.map(f64::from),
        options,
    )
}

fn try_calculate(
    image: &RgbImage,
    pitch: f64,
    yaw: f64,
    roll: f64,
    left_eye_openness: Option<f64>,
    right_eye_openness: Option<f64>,
    options: &QualityOptions,
) -> Result<f64, ImageOpsError> {
    let resized = imageops::resize_to_area(image, WORKING_AREA)?;
    let cropped = imageops::center_crop(
        &resized,
        options.center_crop,
        options.horizontal_displacement,
        options.vertical_displacement,
    )?;

    let weights = &options.weights;
    let parameters = &options.parameters;
    let mut total_score = 0.0;
    let mut total_weight = 0.0;

    total_score += weights.alignment
        * analysis::alignment_score(
            pitch,
            yaw,
            roll,
            parameters.max_alignment_angle,
            parameters.max_individual_angle,
        );
    total_weight += weights.alignment;

    total_score +=
        weights.blur * analysis::blur_score(&cropped, parameters.min_blur, parameters.max_blur);
    total_weight += weights.blur;

    total_score += weights.brightness
        * analysis::brightness_score(
            &cropped,
            parameters.min_brightness,
            parameters.optimal_brightness_low,
            parameters.optimal_brightness_high,
            parameters.max_brightness,
            parameters.brightness_steepness,
        );
    total_weight += weights.brightness;

    total_score += weights.contrast
        * analysis::contrast_score(&cropped, parameters.min_contrast, parameters.max_contrast);
    total_weight += weights.contrast;

    if let (Some(left), Some(right)) = (left_eye_openness, right_eye_openness) {
        total_score += weights.eye_openness * ((left + right) / 2.0);
        total_weight += weights.eye_openness;
    }

    Ok(if total_weight > 0.0 {
        total_score / total_weight
    } else {
        0.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// 256×256, mid-gray: resize is a no-op, every image metric is fully
    /// predictable (blur 0, brightness 1, contrast 0).
    fn flat_gray() -> RgbImage {
        RgbImage::from_pixel(256, 256, Rgb([128, 128, 128]))
    }

    /// 256×256 half-black/half-white: blur, brightness, and contrast all
    /// score 1.0 after the default center crop.
    fn sharp_contrasty() -> RgbImage {
        RgbImage::from_fn(256, 256, |x, _| {
            if x < 128 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn test_flat_gray_scores_brightness_and_alignment_only() {
        // alignment 1.0, blur 0.0, brightness 1.0, contrast 0.0 under
        // default weights: (0.3 + 0.3) / 1.0
        let score =
            calculate_face_quality(&flat_gray(), 0.0, 0.0, 0.0, None, None, &QualityOptions::default());
        assert!((score - 0.6).abs() < 1e-6, "score = {score}");
    }

    #[test]
    fn test_ideal_image_scores_one() {
        let score = calculate_face_quality(
            &sharp_contrasty(),
            0.0,
            0.0,
            0.0,
            None,
            None,
            &QualityOptions::default(),
        );
        assert!((score - 1.0).abs() < 1e-6, "score = {score}");
    }

    #[test]
    fn test_extreme_angle_drops_alignment_contribution() {
        // Pitch past the individual limit: alignment sub-score is exactly
        // 0 no matter the other angles.
        let frontal = calculate_face_quality(
            &sharp_contrasty(),
            0.0,
            0.0,
            0.0,
            None,
            None,
            &QualityOptions::default(),
        );
        let tilted = calculate_face_quality(
            &sharp_contrasty(),
            26.0,
            0.0,
            0.0,
            None,
            None,
            &QualityOptions::default(),
        );
        assert!((frontal - 1.0).abs() < 1e-6);
        assert!((tilted - 0.7).abs() < 1e-6, "tilted = {tilted}");
    }

    #[test]
    fn test_eye_openness_requires_both_probabilities() {
        let options = QualityOptions {
            weights: QualityWeights {
                alignment: 0.0,
                blur: 0.0,
                brightness: 0.0,
                contrast: 0.0,
                eye_openness: 1.0,
            },
            ..QualityOptions::default()
        };

        let both = calculate_face_quality(
            &flat_gray(),
            0.0,
            0.0,
            0.0,
            Some(0.8),
            Some(0.6),
            &options,
        );
        assert!((both - 0.7).abs() < 1e-6, "both = {both}");

        // One eye missing → the metric is excluded, not zeroed; with no
        // other weighted metric the total weight is 0 and the score is 0.
        let left_only =
            calculate_face_quality(&flat_gray(), 0.0, 0.0, 0.0, Some(0.8), None, &options);
        assert_eq!(left_only, 0.0);

        let neither = calculate_face_quality(&flat_gray(), 0.0, 0.0, 0.0, None, None, &options);
        assert_eq!(neither, 0.0);
    }

    #[test]
    fn test_zero_total_weight_scores_zero() {
        let options = QualityOptions {
            weights: QualityWeights {
                alignment: 0.0,
                blur: 0.0,
                brightness: 0.0,
                contrast: 0.0,
                eye_openness: 0.0,
            },
            ..QualityOptions::default()
        };
        let score =
            calculate_face_quality(&sharp_contrasty(), 0.0, 0.0, 0.0, None, None, &options);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_degenerate_crop_fails_safe_to_zero() {
        let options = QualityOptions {
            center_crop: 0.0,
            ..QualityOptions::default()
        };
        let score = calculate_face_quality(&flat_gray(), 0.0, 0.0, 0.0, None, None, &options);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_displaced_crop_out_of_bounds_fails_safe_to_zero() {
        let options = QualityOptions {
            horizontal_displacement: 1.0,
            ..QualityOptions::default()
        };
        let score = calculate_face_quality(&flat_gray(), 0.0, 0.0, 0.0, None, None, &options);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_empty_image_fails_safe_to_zero() {
        let image = RgbImage::new(0, 0);
        let score =
            calculate_face_quality(&image, 0.0, 0.0, 0.0, None, None, &QualityOptions::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_determinism() {
        let image = sharp_contrasty();
        let options = QualityOptions::default();
        let first = calculate_face_quality(&image, 3.0, -7.5, 12.25, Some(0.9), Some(0.95), &options);
        let second = calculate_face_quality(&image, 3.0, -7.5, 12.25, Some(0.9), Some(0.95), &options);
        assert_eq!(first, second);
    }

    #[test]
    fn test_detection_quality_uses_detection_fields() {
        use facekit_core::types::BoundingBox;

        let detection = FaceDetection {
            source_width: 256,
            source_height: 256,
            bounding_box: BoundingBox {
                x: 0,
                y: 0,
                width: 256,
                height: 256,
            },
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            confidence: 1.0,
            left_eye_openness: None,
            right_eye_openness: None,
            landmarks: None,
        };
        let from_detection =
            detection_quality(&sharp_contrasty(), &detection, &QualityOptions::default());
        let direct = calculate_face_quality(
            &sharp_contrasty(),
            0.0,
            0.0,
            0.0,
            None,
            None,
            &QualityOptions::default(),
        );
        assert_eq!(from_detection, direct);
    }
}
