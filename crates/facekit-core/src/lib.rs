//! facekit-core — geometric face normalization and embedding matching.
//!
//! Consumes the output of an external face detector (bounding box, five
//! landmarks, pose angles) and produces canonical 112×112 face crops for an
//! external embedding extractor, plus cosine-based comparison of the
//! resulting embedding vectors.

pub mod alignment;
pub mod imageops;
pub mod matcher;
pub mod types;

pub use types::{
    BoundingBox, Embedding, EmbeddingExtractor, FaceDetection, FaceDetector, FaceNormalization,
    FacialLandmarks, Point2D,
};
