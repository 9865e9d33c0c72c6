//! Imaging module
//!
//! Everything between the raw query string and the encoded bytes:
//! - Format registry mapping extensions and format names to codecs
//! - Request parsing into a validated [`ResizeSpec`]
//! - The decode → resize → encode transform
//!
//! # URL Format
//!
//! ```text
//! /imagine?source=https://host/photo.jpg&width=800&height=0&encode=png
//! ```
//!
//! Width and height default to 0. A zero axis is derived from the other one;
//! when both are zero no transform happens at all.

pub mod config;
pub mod format;
pub mod params;
pub mod processor;

pub use config::ImagingConfig;
pub use format::{DecodeFormat, EncodeFormat, FormatRegistry};
pub use params::{extension, Interpolation, ResizeSpec};
pub use processor::{target_dimensions, transform, TransformSummary};
