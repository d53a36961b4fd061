//! Image buffer utilities — cropping and area-preserving resize.
//!
//! Shared by the alignment path (bounding-box crops) and the quality engine
//! (working-area resize + center crop).

use crate::types::BoundingBox;
use image::imageops::{self, FilterType};
use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageOpsError {
    #[error("region {x},{y} {width}x{height} is out of bounds for a {image_width}x{image_height} image")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        image_width: u32,
        image_height: u32,
    },
    #[error("degenerate region: {width}x{height}")]
    EmptyRegion { width: i64, height: i64 },
}

/// Crop a centered region of `width*fraction × height*fraction` pixels,
/// shifted by `displacement * dimension` pixels along each axis.
///
/// Displacements are conceptually in [-1, 1] but are not enforced; a window
/// pushed outside the image is an error rather than being clamped.
/// `fraction = 1.0` with zero displacement returns the full image.
pub fn center_crop(
    image: &RgbImage,
    fraction: f32,
    horizontal_displacement: f32,
    vertical_displacement: f32,
) -> Result<RgbImage, ImageOpsError> {
    let (width, height) = image.dimensions();

    let h_abs_displacement = (width as f32 * horizontal_displacement) as i64;
    let v_abs_displacement = (height as f32 * vertical_displacement) as i64;

    let crop_width = (width as f32 * fraction) as i64;
    let crop_height = (height as f32 * fraction) as i64;
    if crop_width <= 0 || crop_height <= 0 {
        return Err(ImageOpsError::EmptyRegion {
            width: crop_width,
            height: crop_height,
        });
    }

    let start_x = h_abs_displacement + (width as i64 - crop_width) / 2;
    let start_y = v_abs_displacement + (height as i64 - crop_height) / 2;
    if start_x < 0
        || start_y < 0
        || start_x + crop_width > width as i64
        || start_y + crop_height > height as i64
    {
        return Err(ImageOpsError::OutOfBounds {
            x: start_x,
            y: start_y,
            width: crop_width,
            height: crop_height,
            image_width: width,
            image_height: height,
        });
    }

    Ok(imageops::crop_imm(
        image,
        start_x as u32,
        start_y as u32,
        crop_width as u32,
        crop_height as u32,
    )
    .to_image())
}

/// Rescale preserving aspect ratio so that `width * height ≈ target_area`.
///
/// New height is `sqrt(target_area / aspect)`, new width `aspect * height`,
/// each rounded to the nearest integer independently. The rounding may
/// drift the area and aspect slightly; the drift is accepted, not
/// corrected.
pub fn resize_to_area(image: &RgbImage, target_area: f64) -> Result<RgbImage, ImageOpsError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageOpsError::EmptyRegion {
            width: width as i64,
            height: height as i64,
        });
    }

    let aspect_ratio = width as f64 / height as f64;
    let target_height = (target_area / aspect_ratio).sqrt();
    let new_height = target_height.round() as i64;
    let new_width = (aspect_ratio * target_height).round() as i64;
    if new_width <= 0 || new_height <= 0 {
        return Err(ImageOpsError::EmptyRegion {
            width: new_width,
            height: new_height,
        });
    }

    Ok(imageops::resize(
        image,
        new_width as u32,
        new_height as u32,
        FilterType::Triangle,
    ))
}

/// Exact rectangular extraction, strictly validated.
///
/// Fails if the box has non-positive dimensions or extends outside the
/// image on any edge. No clamping — see [`crop_to_box_clamped`] for the
/// lenient variant.
pub fn crop_to_box(image: &RgbImage, bbox: &BoundingBox) -> Result<RgbImage, ImageOpsError> {
    let (width, height) = image.dimensions();
    let right = bbox.x as i64 + bbox.width as i64;
    let bottom = bbox.y as i64 + bbox.height as i64;

    if bbox.width <= 0 || bbox.height <= 0 {
        return Err(ImageOpsError::EmptyRegion {
            width: bbox.width as i64,
            height: bbox.height as i64,
        });
    }
    if bbox.x < 0 || bbox.y < 0 || right > width as i64 || bottom > height as i64 {
        return Err(ImageOpsError::OutOfBounds {
            x: bbox.x as i64,
            y: bbox.y as i64,
            width: bbox.width as i64,
            height: bbox.height as i64,
            image_width: width,
            image_height: height,
        });
    }

    Ok(imageops::crop_imm(
        image,
        bbox.x as u32,
        bbox.y as u32,
        bbox.width as u32,
        bbox.height as u32,
    )
    .to_image())
}

/// Lenient crop: intersect the box with the image and extract whatever
/// remains. Never fails; a box fully outside the image yields a 0×0 image.
pub fn crop_to_box_clamped(image: &RgbImage, bbox: &BoundingBox) -> RgbImage {
    let (width, height) = image.dimensions();
    let x0 = (bbox.x as i64).clamp(0, width as i64);
    let y0 = (bbox.y as i64).clamp(0, height as i64);
    let x1 = (bbox.x as i64 + bbox.width as i64).clamp(x0, width as i64);
    let y1 = (bbox.y as i64 + bbox.height as i64).clamp(y0, height as i64);

    imageops::crop_imm(
        image,
        x0 as u32,
        y0 as u32,
        (x1 - x0) as u32,
        (y1 - y0) as u32,
    )
    .to_image()
}
