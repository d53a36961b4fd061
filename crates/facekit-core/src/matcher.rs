//! Cosine-similarity embedding comparison.
//!
//! Operates on the transcoded byte buffers the external surface carries
//! (see [`Embedding::from_bytes`]); scores are mapped from cosine
//! similarity into [0, 1], with 1.0 identical, 0.5 orthogonal, 0.0
//! opposite.

use crate::types::Embedding;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("embedding length mismatch: probe has {probe} floats, reference has {reference}")]
    LengthMismatch { probe: usize, reference: usize },
    #[error("zero-magnitude embedding cannot be scored")]
    ZeroMagnitude,
}

/// Verification score between a probe and a single reference embedding.
///
/// Both buffers are native-endian f32 vectors. Fails on mismatched vector
/// lengths and on zero-magnitude vectors.
pub fn verification_score(probe: &[u8], match_against: &[u8]) -> Result<f32, MatchError> {
    let probe = Embedding::from_bytes(probe);
    let reference = Embedding::from_bytes(match_against);

    if probe.len() != reference.len() {
        return Err(MatchError::LengthMismatch {
            probe: probe.len(),
            reference: reference.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut magnitude_probe = 0.0f64;
    let mut magnitude_reference = 0.0f64;
    for (a, b) in probe.values.iter().zip(reference.values.iter()) {
        dot += (*a as f64) * (*b as f64);
        magnitude_probe += (*a as f64) * (*a as f64);
        magnitude_reference += (*b as f64) * (*b as f64);
    }
    let magnitude_probe = magnitude_probe.sqrt();
    let magnitude_reference = magnitude_reference.sqrt();

    if magnitude_probe == 0.0 || magnitude_reference == 0.0 {
        return Err(MatchError::ZeroMagnitude);
    }

    let cosine = dot / (magnitude_probe * magnitude_reference);
    Ok((1.0 - (1.0 - cosine) / 2.0) as f32)
}

/// Score a probe against every reference in a gallery.
///
/// Returns `(index into match_references, score)` pairs sorted by
/// descending score; relative order of ties is unspecified. This is a
/// linear scan — gallery sizes in this domain are per-device match lists,
/// not large-scale search indexes.
pub fn identification_score<T: AsRef<[u8]>>(
    probe: &[u8],
    match_references: &[T],
) -> Result<Vec<(usize, f32)>, MatchError> {
    let mut scores = Vec::with_capacity(match_references.len());
    for (index, reference) in match_references.iter().enumerate() {
        scores.push((index, verification_score(probe, reference.as_ref())?));
    }
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(scores)
}
