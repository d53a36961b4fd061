//! Generic scoring primitives shared by the quality metrics.

/// Ramp score: 0.0 below `min`, 1.0 above `max`, linear in between.
///
/// Requires `max > min`.
pub fn ramp_score(x: f64, min: f64, max: f64) -> f64 {
    if x < min {
        0.0
    } else if x > max {
        1.0
    } else {
        (x - min) / (max - min)
    }
}

/// Plateau score: 1.0 inside `[center_low, center_high]`, logistic falloff
/// towards `edge_low`/`edge_high` outside, clamped to [0, 1].
///
/// Symmetric by construction when the edge/center pairs are symmetric
/// around the plateau.
pub fn plateau_score(
    x: f64,
    center_low: f64,
    center_high: f64,
    edge_low: f64,
    edge_high: f64,
    steepness: f64,
) -> f64 {
    let score = if x >= center_low && x <= center_high {
        1.0
    } else if x < center_low {
        1.0 / (1.0 + (-steepness * (x - edge_low)).exp())
    } else {
        1.0 / (1.0 + (steepness * (x - edge_high)).exp())
    };
    score.clamp(0.0, 1.0)
}
