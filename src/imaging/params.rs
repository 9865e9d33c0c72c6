//! Resize request parsing
//!
//! Turns the raw `/imagine` query parameters into a validated
//! [`ResizeSpec`]. Construction is all-or-nothing: any invalid parameter
//! fails the whole request.
//!
//! ```text
//! /imagine?source=http://host/a.png&width=200&height=0&encode=png
//! ```

use std::collections::HashMap;
use url::Url;

use super::format::{DecodeFormat, EncodeFormat, FormatRegistry};
use crate::error::ImagineError;

/// Resampling algorithm; a single selection is supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    NearestNeighbor,
}

/// Validated description of one resize request
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSpec {
    pub source: Url,
    /// Target width; 0 means derived from height
    pub width: u32,
    /// Target height; 0 means derived from width
    pub height: u32,
    pub decoder: DecodeFormat,
    pub encoder: EncodeFormat,
    pub interpolation: Interpolation,
    /// Upper bound for either output axis (width, height)
    pub max_dimensions: (u32, u32),
}

impl ResizeSpec {
    /// Parse and validate query parameters
    ///
    /// Empty values are treated as absent, like a missing key.
    pub fn from_query(
        params: &HashMap<String, String>,
        registry: &FormatRegistry,
    ) -> Result<Self, ImagineError> {
        let raw_source = non_empty(params, "source").ok_or(ImagineError::MissingParameter)?;
        let source = Url::parse(raw_source).map_err(|e| ImagineError::invalid_url(raw_source, e))?;

        let (max_width, max_height) = registry.max_dimensions();
        let width = parse_dimension(params, "width", max_width)?;
        let height = parse_dimension(params, "height", max_height)?;

        // Percent-escapes in the path are decoded before looking at the extension
        let path = urlencoding::decode_binary(source.path().as_bytes());
        let path = String::from_utf8_lossy(&path);
        let decoder = registry.decoder_for(extension(&path))?;
        let encoder = registry.encoder_for(non_empty(params, "encode").unwrap_or_default());

        Ok(Self {
            source,
            width,
            height,
            decoder,
            encoder,
            interpolation: Interpolation::default(),
            max_dimensions: (max_width, max_height),
        })
    }

    /// Neither axis requested: serve the source untouched
    pub fn is_passthrough(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}

fn non_empty<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

/// Parse an optional dimension, defaulting to 0
///
/// The value is parsed signed first so that negative input is rejected
/// explicitly instead of wrapping when narrowed to `u32`.
fn parse_dimension(
    params: &HashMap<String, String>,
    key: &'static str,
    max: u32,
) -> Result<u32, ImagineError> {
    let Some(raw) = non_empty(params, key) else {
        return Ok(0);
    };

    let value: i64 = raw
        .parse()
        .map_err(|e: std::num::ParseIntError| ImagineError::invalid_dimension(key, raw, e.to_string()))?;

    if value < 0 {
        return Err(ImagineError::invalid_dimension(
            key,
            raw,
            "must be 0 or positive",
        ));
    }

    u32::try_from(value)
        .ok()
        .filter(|value| *value <= max)
        .ok_or_else(|| {
            ImagineError::invalid_dimension(key, raw, format!("exceeds maximum {}", max))
        })
}

/// File extension of a URL path, leading dot included
///
/// Scans backwards and stops at the first `/` or `.`; only a dot found
/// before any slash yields an extension.
pub fn extension(path: &str) -> &str {
    for (i, byte) in path.bytes().enumerate().rev() {
        match byte {
            b'/' => break,
            b'.' => return &path[i..],
            _ => {}
        }
    }
    ""
}
