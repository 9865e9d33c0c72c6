//! Format registry
//!
//! Closed sets of decode and encode capabilities, and the lookup tables that
//! map a source file extension or an `encode` parameter onto them. The
//! registry is built once at startup and shared read-only by every request.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, ImageEncoder, ImageFormat};
use std::collections::HashMap;
use std::io::Write;

use super::config::ImagingConfig;
use crate::error::ImagineError;

/// Source formats that can be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFormat {
    Jpeg,
    Png,
    Gif,
}

impl DecodeFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Gif => ImageFormat::Gif,
        }
    }

    /// Decode raw bytes, trusting the format picked from the extension
    ///
    /// GIF sources yield their first frame.
    pub fn decode(&self, data: &[u8]) -> Result<DynamicImage, ImagineError> {
        image::load_from_memory_with_format(data, self.image_format())
            .map_err(|e| ImagineError::decode_failed(self.name(), e))
    }
}

/// Output formats that can be encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeFormat {
    /// Baseline JPEG; alpha is dropped
    Jpeg { quality: u8 },
    /// Lossless PNG with alpha
    Png,
}

impl EncodeFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpeg",
            Self::Png => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Encode `image` straight into `writer`
    pub fn encode<W: Write>(
        &self,
        image: &DynamicImage,
        writer: &mut W,
    ) -> Result<(), ImagineError> {
        let result = match *self {
            Self::Jpeg { quality } => {
                let rgb = image.to_rgb8();
                JpegEncoder::new_with_quality(writer, quality).write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    ColorType::Rgb8,
                )
            }
            Self::Png => {
                let rgba = image.to_rgba8();
                PngEncoder::new(writer).write_image(
                    rgba.as_raw(),
                    rgba.width(),
                    rgba.height(),
                    ColorType::Rgba8,
                )
            }
        };

        result.map_err(|e| ImagineError::encode_failed(self.name(), e))
    }
}

/// Extension and format-name lookup tables, plus the output size limits
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    decoders: HashMap<&'static str, DecodeFormat>,
    encoders: HashMap<&'static str, EncodeFormat>,
    fallback_encoder: EncodeFormat,
    max_dimensions: (u32, u32),
}

impl FormatRegistry {
    pub fn new(config: &ImagingConfig) -> Self {
        let jpeg = EncodeFormat::Jpeg {
            quality: config.jpeg_quality,
        };

        let decoders = [
            (".jpg", DecodeFormat::Jpeg),
            (".jpeg", DecodeFormat::Jpeg),
            (".png", DecodeFormat::Png),
            (".gif", DecodeFormat::Gif),
        ]
        .into_iter()
        .collect();

        let encoders = [("jpeg", jpeg), ("png", EncodeFormat::Png)]
            .into_iter()
            .collect();

        Self {
            decoders,
            encoders,
            // Unknown or empty `encode` values
            fallback_encoder: jpeg,
            max_dimensions: (config.max_width, config.max_height),
        }
    }

    /// Largest output (width, height) a request may produce
    pub fn max_dimensions(&self) -> (u32, u32) {
        self.max_dimensions
    }

    /// Decoder for a source extension (leading dot included, case-sensitive)
    pub fn decoder_for(&self, extension: &str) -> Result<DecodeFormat, ImagineError> {
        self.decoders
            .get(extension)
            .copied()
            .ok_or_else(|| ImagineError::unsupported_format(extension))
    }

    /// Encoder for a format name; unknown or empty names get the fallback
    pub fn encoder_for(&self, name: &str) -> EncodeFormat {
        self.encoders
            .get(name)
            .copied()
            .unwrap_or(self.fallback_encoder)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new(&ImagingConfig::default())
    }
}
