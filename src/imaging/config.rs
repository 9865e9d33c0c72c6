use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagingConfig {
    /// Quality used by the JPEG encoder (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Size of the encoded chunks streamed to the client
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Maximum output width, requested or derived
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// Maximum output height, requested or derived
    #[serde(default = "default_max_height")]
    pub max_height: u32,
}

impl Default for ImagingConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            chunk_size: default_chunk_size(),
            max_width: default_max_width(),
            max_height: default_max_height(),
        }
    }
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_width() -> u32 {
    DEFAULT_MAX_WIDTH
}

fn default_max_height() -> u32 {
    DEFAULT_MAX_HEIGHT
}
