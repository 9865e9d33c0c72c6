//! Image processing implementation
//!
//! Handles the actual image transformation: decode → resize → encode

use fast_image_resize::{Image, PixelType, ResizeAlg, Resizer};
use image::DynamicImage;
use std::io::Write;
use std::num::NonZeroU32;

use super::params::{Interpolation, ResizeSpec};
use crate::error::ImagineError;

/// Dimensions observed while transforming one image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformSummary {
    /// Decoded source dimensions (width, height)
    pub source_size: (u32, u32),
    /// Encoded output dimensions (width, height)
    pub output_size: (u32, u32),
}

impl Interpolation {
    fn resize_alg(self) -> ResizeAlg {
        match self {
            Interpolation::NearestNeighbor => ResizeAlg::Nearest,
        }
    }
}

/// Decode `data`, resize it and encode the result into `out`
///
/// Stages short-circuit on the first failure. Nothing is buffered between
/// the encoder and `out`.
pub fn transform<W: Write>(
    data: &[u8],
    spec: &ResizeSpec,
    out: &mut W,
) -> Result<TransformSummary, ImagineError> {
    let decoded = spec.decoder.decode(data)?;
    let source_size = (decoded.width(), decoded.height());

    let (target_width, target_height) = target_dimensions(
        source_size.0,
        source_size.1,
        spec.width,
        spec.height,
        spec.max_dimensions,
    );

    let resized = if (target_width, target_height) != source_size {
        resize_image(&decoded, target_width, target_height, spec.interpolation)?
    } else {
        decoded
    };

    spec.encoder.encode(&resized, out)?;

    Ok(TransformSummary {
        source_size,
        output_size: (target_width, target_height),
    })
}

/// Resolve requested dimensions against the source size
///
/// A 0 axis is derived from the other one, keeping the aspect ratio. The
/// derived axis is rounded as `floor(0.7 + length / scale)` and never drops
/// below one pixel. Both axes are clamped to `max`.
pub fn target_dimensions(
    src_width: u32,
    src_height: u32,
    width: u32,
    height: u32,
    max: (u32, u32),
) -> (u32, u32) {
    let old_width = src_width as f64;
    let old_height = src_height as f64;

    let (scale_x, scale_y) = match (width, height) {
        (0, 0) => (1.0, 1.0),
        (0, h) => {
            let scale = old_height / h as f64;
            (scale, scale)
        }
        (w, 0) => {
            let scale = old_width / w as f64;
            (scale, scale)
        }
        (w, h) => (old_width / w as f64, old_height / h as f64),
    };

    // `as` saturates, so an extreme aspect ratio lands on u32::MAX before the clamp
    let target_width = if width == 0 {
        (0.7 + old_width / scale_x) as u32
    } else {
        width
    };
    let target_height = if height == 0 {
        (0.7 + old_height / scale_y) as u32
    } else {
        height
    };

    (
        target_width.clamp(1, max.0.max(1)),
        target_height.clamp(1, max.1.max(1)),
    )
}

/// Resize image using fast-image-resize
fn resize_image(
    img: &DynamicImage,
    target_w: u32,
    target_h: u32,
    interpolation: Interpolation,
) -> Result<DynamicImage, ImagineError> {
    let src_width =
        NonZeroU32::new(img.width()).ok_or_else(|| ImagineError::resize_failed("Source width is 0"))?;
    let src_height = NonZeroU32::new(img.height())
        .ok_or_else(|| ImagineError::resize_failed("Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| ImagineError::resize_failed("Target width is 0"))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| ImagineError::resize_failed("Target height is 0"))?;

    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        img.to_rgba8().into_raw(),
        PixelType::U8x4,
    )
    .map_err(|e| ImagineError::resize_failed(format!("Failed to create source image: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(interpolation.resize_alg());

    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| ImagineError::resize_failed(format!("Resize operation failed: {:?}", e)))?;

    let rgba_image = image::RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| ImagineError::resize_failed("Failed to create output image buffer"))?;

    Ok(DynamicImage::ImageRgba8(rgba_image))
}
