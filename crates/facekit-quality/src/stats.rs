//! Grayscale image statistics backing the quality metrics.
//!
//! Reproduces the numerics of the OpenCV-based analyzer this engine was
//! calibrated against: Rec.601 luma conversion, population statistics, and
//! an aperture-5 Laplacian with reflect-101 border handling.

use image::{GrayImage, RgbImage};

/// Binomial smoothing kernel for the aperture-5 Laplacian.
const SMOOTH_KERNEL: [f64; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];
/// Second-derivative kernel for the aperture-5 Laplacian.
const DERIV_KERNEL: [f64; 5] = [1.0, 0.0, -2.0, 0.0, 1.0];

/// Convert to grayscale with Rec.601 luma coefficients
/// (`0.299 R + 0.587 G + 0.114 B`).
pub fn grayscale(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let luma = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
        image::Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// Mean gray level (0–255). Empty images yield 0.0.
pub fn mean_brightness(image: &RgbImage) -> f64 {
    let gray = grayscale(image);
    let count = gray.len();
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = gray.pixels().map(|p| p.0[0] as u64).sum();
    sum as f64 / count as f64
}

/// Population standard deviation of the gray levels. Empty images yield 0.0.
pub fn contrast_stddev(image: &RgbImage) -> f64 {
    let gray = grayscale(image);
    let count = gray.len();
    if count == 0 {
        return 0.0;
    }
    let mut sum = 0u64;
    let mut sum_sq = 0u64;
    for p in gray.pixels() {
        let v = p.0[0] as u64;
        sum += v;
        sum_sq += v * v;
    }
    let mean = sum as f64 / count as f64;
    let variance = sum_sq as f64 / count as f64 - mean * mean;
    variance.max(0.0).sqrt()
}

/// Variance of the aperture-5 Laplacian response — a sharpness measure
/// (higher = sharper). Empty images yield 0.0.
///
/// The Laplacian is the sum of the two separable second derivatives,
/// `[1, 0, -2, 0, 1]` against `[1, 4, 6, 4, 1]` smoothing on the opposite
/// axis, unnormalized, with reflect-101 borders. The engine's default blur
/// thresholds are calibrated to this aperture.
pub fn laplacian_variance(image: &RgbImage) -> f64 {
    let gray = grayscale(image);
    let (width, height) = gray.dimensions();
    let (width, height) = (width as i64, height as i64);
    if width == 0 || height == 0 {
        return 0.0;
    }

    let value = |x: i64, y: i64| -> f64 {
        let x = reflect_101(x, width);
        let y = reflect_101(y, height);
        gray.get_pixel(x as u32, y as u32).0[0] as f64
    };

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for y in 0..height {
        for x in 0..width {
            let mut response = 0.0;
            for (i, (si, di)) in SMOOTH_KERNEL.iter().zip(DERIV_KERNEL.iter()).enumerate() {
                for (j, (sj, dj)) in SMOOTH_KERNEL.iter().zip(DERIV_KERNEL.iter()).enumerate() {
                    let weight = si * dj + di * sj;
                    if weight != 0.0 {
                        response += weight * value(x + j as i64 - 2, y + i as i64 - 2);
                    }
                }
            }
            sum += response;
            sum_sq += response * response;
        }
    }

    let count = (width * height) as f64;
    let mean = sum / count;
    sum_sq / count - mean * mean
}

/// Reflect an out-of-range coordinate back into `[0, len)` without
/// repeating the border sample (OpenCV's `BORDER_REFLECT_101`).
fn reflect_101(mut p: i64, len: i64) -> i64 {
    if len == 1 {
        return 0;
    }
    while p < 0 || p >= len {
        if p < 0 {
            p = -p;
        } else {
            p = 2 * len - 2 - p;
        }
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn half_and_half(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn test_grayscale_rec601_weights() {
        let image = RgbImage::from_pixel(1, 1, Rgb([100, 50, 200]));
        let gray = grayscale(&image);
        // 0.299*100 + 0.587*50 + 0.114*200 = 82.05 → 82
        assert_eq!(gray.get_pixel(0, 0).0[0], 82);
    }

    #[test]
    fn test_mean_brightness_uniform() {
        let image = RgbImage::from_pixel(16, 16, Rgb([128, 128, 128]));
        assert!((mean_brightness(&image) - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_brightness_half_and_half() {
        let image = half_and_half(64, 64);
        assert!((mean_brightness(&image) - 127.5).abs() < 1e-9);
    }

    #[test]
    fn test_contrast_uniform_is_zero() {
        let image = RgbImage::from_pixel(16, 16, Rgb([77, 77, 77]));
        assert!(contrast_stddev(&image).abs() < 1e-9);
    }

    #[test]
    fn test_contrast_half_and_half() {
        let image = half_and_half(64, 64);
        assert!((contrast_stddev(&image) - 127.5).abs() < 1e-9);
    }

    #[test]
    fn test_laplacian_variance_uniform_is_zero() {
        let image = RgbImage::from_pixel(32, 32, Rgb([128, 128, 128]));
        assert!(laplacian_variance(&image).abs() < 1e-9);
    }

    #[test]
    fn test_laplacian_variance_step_edge() {
        // A hard vertical edge produces a ±4080 response in the four
        // columns around it and zero elsewhere: 128×128 half-and-half has
        // variance (4·128 / 128²) · 4080² = 520 200 under this aperture.
        let image = half_and_half(128, 128);
        let variance = laplacian_variance(&image);
        assert!(
            (variance - 520_200.0).abs() < 1.0,
            "variance = {variance}"
        );
    }

    #[test]
    fn test_laplacian_sharper_beats_smoother() {
        let sharp = half_and_half(64, 64);
        // Smooth ramp over the same range.
        let smooth = RgbImage::from_fn(64, 64, |x, _| {
            let v = (x as f64 / 63.0 * 255.0).round() as u8;
            Rgb([v, v, v])
        });
        assert!(laplacian_variance(&sharp) > laplacian_variance(&smooth));
    }

    #[test]
    fn test_empty_image_statistics() {
        let image = RgbImage::new(0, 0);
        assert_eq!(mean_brightness(&image), 0.0);
        assert_eq!(contrast_stddev(&image), 0.0);
        assert_eq!(laplacian_variance(&image), 0.0);
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 10), 1);
        assert_eq!(reflect_101(-2, 10), 2);
        assert_eq!(reflect_101(0, 10), 0);
        assert_eq!(reflect_101(9, 10), 9);
        assert_eq!(reflect_101(10, 10), 8);
        assert_eq!(reflect_101(11, 10), 7);
        assert_eq!(reflect_101(5, 1), 0);
    }
}
