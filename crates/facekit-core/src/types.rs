use crate::alignment;
use crate::imageops::{self, ImageOpsError};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// A 2-D point in image-space coordinates (origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The five named facial landmarks used as alignment anchors.
///
/// The sequence left eye, right eye, nose, mouth left, mouth right is paired
/// positionally against the reference constellation and must not be
/// reordered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacialLandmarks {
    pub eye_left: Point2D,
    pub eye_right: Point2D,
    pub nose: Point2D,
    pub mouth_left: Point2D,
    pub mouth_right: Point2D,
}

impl FacialLandmarks {
    /// Landmarks in canonical order.
    pub fn to_points(&self) -> [Point2D; 5] {
        [
            self.eye_left,
            self.eye_right,
            self.nose,
            self.mouth_left,
            self.mouth_right,
        ]
    }
}

/// A detector-supplied face bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// One face reported by the external detector.
///
/// Pose angles are in degrees; eye-openness probabilities, when the detector
/// provides them, are in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceDetection {
    pub source_width: u32,
    pub source_height: u32,
    pub bounding_box: BoundingBox,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub confidence: f32,
    pub left_eye_openness: Option<f32>,
    pub right_eye_openness: Option<f32>,
    pub landmarks: Option<FacialLandmarks>,
}

/// Which of the two mutually exclusive normalization paths to take for a
/// face: a plain bounding-box crop, or a landmark-driven similarity warp to
/// the canonical 112×112 layout. Exactly one path is used per face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceNormalization {
    CropToBox,
    WarpToLandmarks,
}

impl FaceDetection {
    /// Produce the normalized face image for this detection.
    ///
    /// `CropToBox` validates the box strictly and fails if it falls outside
    /// the image. `WarpToLandmarks` never fails: missing landmarks or a
    /// degenerate fit return the input unchanged, which callers must treat
    /// as "alignment unavailable" rather than success.
    pub fn normalized_face(
        &self,
        image: &RgbImage,
        method: FaceNormalization,
    ) -> Result<RgbImage, ImageOpsError> {
        match method {
            FaceNormalization::CropToBox => imageops::crop_to_box(image, &self.bounding_box),
            FaceNormalization::WarpToLandmarks => {
                Ok(alignment::warp_align_face(image, self.landmarks.as_ref()))
            }
        }
    }
}

/// A face embedding vector produced by the external extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// Version of the template/model that produced this embedding. Carried
    /// as metadata only; never serialized into the byte buffer.
    pub template_version: Option<String>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values,
            template_version: None,
        }
    }

    /// Serialize the vector to a flat native-endian byte buffer
    /// (4 bytes per float).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.values.len() * 4);
        for value in &self.values {
            bytes.extend_from_slice(&value.to_ne_bytes());
        }
        bytes
    }

    /// Reconstruct a vector from a native-endian byte buffer.
    ///
    /// Trailing bytes that do not form a whole float are ignored. The
    /// template version is external metadata and comes back as `None`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let values = bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Self {
            values,
            template_version: None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Boundary trait for the external face detector feeding this pipeline.
pub trait FaceDetector {
    type Error;

    /// Detect faces in an image, returning one entry per face found.
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<FaceDetection>, Self::Error>;
}

/// Boundary trait for the external embedding extractor consuming normalized
/// 112×112 face images.
pub trait EmbeddingExtractor {
    type Error;

    fn extract(&mut self, face: &RgbImage) -> Result<Embedding, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_order_is_fixed() {
        let lm = FacialLandmarks {
            eye_left: Point2D::new(1.0, 2.0),
            eye_right: Point2D::new(3.0, 4.0),
            nose: Point2D::new(5.0, 6.0),
            mouth_left: Point2D::new(7.0, 8.0),
            mouth_right: Point2D::new(9.0, 10.0),
        };
        let pts = lm.to_points();
        assert_eq!(pts[0], lm.eye_left);
        assert_eq!(pts[1], lm.eye_right);
        assert_eq!(pts[2], lm.nose);
        assert_eq!(pts[3], lm.mouth_left);
        assert_eq!(pts[4], lm.mouth_right);
    }

    #[test]
    fn test_embedding_byte_roundtrip() {
        let embedding = Embedding::new(vec![1.0, -2.5, 0.0, 3.25e-3]);
        let bytes = embedding.to_bytes();
        assert_eq!(bytes.len(), 4 * 4);
        let decoded = Embedding::from_bytes(&bytes);
        assert_eq!(decoded.values, embedding.values);
    }

    #[test]
    fn test_embedding_from_bytes_ignores_trailing_bytes() {
        let mut bytes = Embedding::new(vec![1.0, 2.0]).to_bytes();
        bytes.extend_from_slice(&[0xAB, 0xCD]);
        let decoded = Embedding::from_bytes(&bytes);
        assert_eq!(decoded.values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_embedding_from_empty_bytes() {
        let decoded = Embedding::from_bytes(&[]);
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_normalized_face_crop_path() {
        let mut image = RgbImage::new(60, 40);
        image.put_pixel(25, 15, image::Rgb([200, 0, 0]));
        let detection = FaceDetection {
            source_width: 60,
            source_height: 40,
            bounding_box: BoundingBox {
                x: 20,
                y: 10,
                width: 20,
                height: 20,
            },
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            confidence: 0.9,
            left_eye_openness: None,
            right_eye_openness: None,
            landmarks: None,
        };

        let face = detection
            .normalized_face(&image, FaceNormalization::CropToBox)
            .unwrap();
        assert_eq!(face.dimensions(), (20, 20));
        assert_eq!(face.get_pixel(5, 5).0, [200, 0, 0]);
    }

    #[test]
    fn test_normalized_face_warp_without_landmarks_is_noop() {
        let image = RgbImage::from_pixel(30, 20, image::Rgb([7, 8, 9]));
        let detection = FaceDetection {
            source_width: 30,
            source_height: 20,
            bounding_box: BoundingBox {
                x: 0,
                y: 0,
                width: 30,
                height: 20,
            },
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            confidence: 0.5,
            left_eye_openness: None,
            right_eye_openness: None,
            landmarks: None,
        };

        let face = detection
            .normalized_face(&image, FaceNormalization::WarpToLandmarks)
            .unwrap();
        assert_eq!(face, image);
    }
}
