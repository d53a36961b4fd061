//! Face alignment via non-reflective similarity transform.
//!
//! Fits a 4-DOF similarity (scale, rotation, translation — no shear, no
//! reflection) from detected landmarks to the canonical 112×112 reference
//! positions using SVD least squares, then warps the face with a standard
//! affine resample. Degenerate fits degrade to the identity transform, and
//! warping with the identity returns the input unchanged, so a failed
//! alignment never aborts the pipeline.

use crate::types::{FacialLandmarks, Point2D};
use image::RgbImage;
use nalgebra::{DMatrix, DVector, Matrix2x3, Matrix3, Vector3};

/// Reference landmarks for a 112×112 output: left eye, right eye, nose,
/// mouth left, mouth right. Process-wide constant.
pub const REFERENCE_LANDMARKS_112: [Point2D; 5] = [
    Point2D { x: 38.2946, y: 51.6963 },
    Point2D { x: 73.5318, y: 51.5014 },
    Point2D { x: 56.0252, y: 71.7366 },
    Point2D { x: 41.5493, y: 92.3655 },
    Point2D { x: 70.7299, y: 92.2041 },
];

/// Edge length of the canonical aligned output.
pub const ALIGNED_SIZE: u32 = 112;

/// Rank tolerance for the least-squares design matrix.
const RANK_TOLERANCE: f64 = 1e-6;

/// Tolerance when testing a transform against the identity.
const IDENTITY_TOLERANCE: f64 = 1e-8;

/// Determinant threshold below which a linear part is treated as singular.
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// A 2×3 affine transform `[a, b, tx; c, d, ty]` mapping column points
/// `(x, y)` to `(a*x + b*y + tx, c*x + d*y + ty)`.
pub type AffineTransform = Matrix2x3<f64>;

/// Estimate the similarity transform mapping `landmarks` onto
/// `reference` points.
///
/// A pure similarity fit cannot express reflection, so the fit is run twice
/// — once against the reference set and once against the reference set
/// mirrored across the vertical axis — and the candidate with the lower
/// residual is kept. Ties and NaN residuals prefer the non-mirrored
/// solution, and an identity-valued direct solution always wins over its
/// mirrored counterpart. Degenerate fits yield the identity transform.
pub fn estimate_similarity_transform(
    landmarks: &FacialLandmarks,
    reference: &[Point2D; 5],
) -> AffineTransform {
    let src: Vec<(f64, f64)> = landmarks
        .to_points()
        .iter()
        .map(|p| (p.x as f64, p.y as f64))
        .collect();
    let dst: Vec<(f64, f64)> = reference.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    let dst_mirrored: Vec<(f64, f64)> = dst.iter().map(|&(x, y)| (-x, y)).collect();

    let direct = find_non_reflective_similarity(&src, &dst);

    let mirrored_fit = find_non_reflective_similarity(&src, &dst_mirrored);
    let reflect_y = Matrix3::new(-1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
    let mirrored = reflect_y * mirrored_fit;

    let norm_direct = residual(&apply_transform(&direct, &src), &dst_mirrored);
    let norm_mirrored = residual(&apply_transform(&mirrored, &src), &dst_mirrored);

    let chosen = if norm_direct.is_nan() && norm_mirrored.is_nan() {
        direct
    } else if norm_direct.is_nan() {
        mirrored
    } else if norm_mirrored.is_nan() {
        direct
    } else if norm_direct <= norm_mirrored {
        direct
    } else if is_identity3(&direct) {
        direct
    } else {
        mirrored
    };

    chosen.fixed_view::<2, 3>(0, 0).into_owned()
}

/// Least-squares non-reflective similarity mapping `landmarks` onto
/// `reference`, as a homogeneous 3×3 matrix.
///
/// The overdetermined system is built from the reference points with the
/// landmarks as the right-hand side — the fitted map runs reference →
/// landmarks and is inverted at the end. Rank deficiency or a singular fit
/// returns the identity.
fn find_non_reflective_similarity(
    landmarks: &[(f64, f64)],
    reference: &[(f64, f64)],
) -> Matrix3<f64> {
    let n = reference.len();
    let mut design = DMatrix::<f64>::zeros(2 * n, 4);
    let mut rhs = DVector::<f64>::zeros(2 * n);
    for i in 0..n {
        let (x, y) = reference[i];
        let (u, v) = landmarks[i];
        design[(i, 0)] = x;
        design[(i, 1)] = y;
        design[(i, 2)] = 1.0;
        design[(n + i, 0)] = y;
        design[(n + i, 1)] = -x;
        design[(n + i, 3)] = 1.0;
        rhs[i] = u;
        rhs[n + i] = v;
    }

    let svd = design.svd(true, true);
    if svd.rank(RANK_TOLERANCE) < 4 {
        tracing::debug!("rank-deficient landmark system, degrading to identity transform");
        return Matrix3::identity();
    }
    let solution = match svd.solve(&rhs, f64::EPSILON) {
        Ok(solution) => solution,
        Err(reason) => {
            tracing::debug!(reason, "least-squares solve failed, degrading to identity");
            return Matrix3::identity();
        }
    };
    let (sc, ss, tx, ty) = (solution[0], solution[1], solution[2], solution[3]);

    // Reference → landmark similarity; determinant of the linear part is
    // sc² + ss², which collapses when the landmarks carry no spatial extent.
    let inverse_map = Matrix3::new(sc, ss, tx, -ss, sc, ty, 0.0, 0.0, 1.0);
    if sc * sc + ss * ss < SINGULAR_TOLERANCE {
        tracing::debug!("collapsed similarity fit, degrading to identity transform");
        return Matrix3::identity();
    }
    let Some(mut forward) = inverse_map.try_inverse() else {
        tracing::debug!("singular similarity fit, degrading to identity transform");
        return Matrix3::identity();
    };

    // Scrub numerical noise out of the homogeneous row.
    forward[(2, 0)] = 0.0;
    forward[(2, 1)] = 0.0;
    forward[(2, 2)] = 1.0;
    forward
}

fn apply_transform(transform: &Matrix3<f64>, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|&(x, y)| {
            let mapped = transform * Vector3::new(x, y, 1.0);
            (mapped[0], mapped[1])
        })
        .collect()
}

/// Frobenius norm of the pointwise difference between two point sets.
fn residual(a: &[(f64, f64)], b: &[(f64, f64)]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&(ax, ay), &(bx, by))| {
            let dx = ax - bx;
            let dy = ay - by;
            dx * dx + dy * dy
        })
        .sum::<f64>()
        .sqrt()
}

fn is_identity3(m: &Matrix3<f64>) -> bool {
    (m - Matrix3::identity()).abs().max() <= IDENTITY_TOLERANCE
}

fn is_identity_affine(m: &AffineTransform) -> bool {
    (m - AffineTransform::identity()).abs().max() <= IDENTITY_TOLERANCE
}

/// Apply a 2×3 affine warp, producing an `out_width × out_height` output.
///
/// An identity transform (within tolerance) short-circuits to a clone of
/// the input — the upstream fit failed, and resampling would be a
/// meaningless no-op. Note the resulting image keeps the input dimensions
/// in that case, not the requested output size.
///
/// Otherwise this reproduces standard `warpAffine` semantics: the matrix
/// maps source to output coordinates (top-left origin, x right, y down),
/// each output pixel samples the source through the inverted mapping with
/// bilinear interpolation, and samples outside the source are black.
pub fn warp_affine(
    image: &RgbImage,
    transform: &AffineTransform,
    out_width: u32,
    out_height: u32,
) -> RgbImage {
    if is_identity_affine(transform) {
        return image.clone();
    }

    let (a, b, tx) = (transform[(0, 0)], transform[(0, 1)], transform[(0, 2)]);
    let (c, d, ty) = (transform[(1, 0)], transform[(1, 1)], transform[(1, 2)]);

    let det = a * d - b * c;
    if det.abs() < SINGULAR_TOLERANCE {
        return RgbImage::new(out_width, out_height);
    }
    let inv_a = d / det;
    let inv_b = -b / det;
    let inv_c = -c / det;
    let inv_d = a / det;

    let (src_width, src_height) = image.dimensions();
    let mut output = RgbImage::new(out_width, out_height);

    for oy in 0..out_height {
        for ox in 0..out_width {
            let dx = ox as f64 - tx;
            let dy = oy as f64 - ty;
            let sx = inv_a * dx + inv_b * dy;
            let sy = inv_c * dx + inv_d * dy;

            let x0 = sx.floor() as i64;
            let y0 = sy.floor() as i64;
            let fx = sx - x0 as f64;
            let fy = sy - y0 as f64;

            let sample = |x: i64, y: i64, channel: usize| -> f64 {
                if x >= 0 && x < src_width as i64 && y >= 0 && y < src_height as i64 {
                    image.get_pixel(x as u32, y as u32).0[channel] as f64
                } else {
                    0.0
                }
            };

            let mut pixel = [0u8; 3];
            for (channel, value) in pixel.iter_mut().enumerate() {
                let interpolated = sample(x0, y0, channel) * (1.0 - fx) * (1.0 - fy)
                    + sample(x0 + 1, y0, channel) * fx * (1.0 - fy)
                    + sample(x0, y0 + 1, channel) * (1.0 - fx) * fy
                    + sample(x0 + 1, y0 + 1, channel) * fx * fy;
                *value = interpolated.round().clamp(0.0, 255.0) as u8;
            }
            output.put_pixel(ox, oy, image::Rgb(pixel));
        }
    }

    output
}

/// Warp a face to the canonical 112×112 landmark layout.
///
/// Absent landmarks, or a fit that degraded to the identity, return the
/// input unchanged — callers must treat an unwarped result as "alignment
/// unavailable", not success.
pub fn warp_align_face(image: &RgbImage, landmarks: Option<&FacialLandmarks>) -> RgbImage {
    let Some(landmarks) = landmarks else {
        return image.clone();
    };
    let transform = estimate_similarity_transform(landmarks, &REFERENCE_LANDMARKS_112);
    warp_affine(image, &transform, ALIGNED_SIZE, ALIGNED_SIZE)
}
