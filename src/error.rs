//! Error types for the resize endpoint
//!
//! Every failure is terminal for the current request only. The transport
//! never distinguishes failure kinds: all of them surface as 400 with the
//! error message as the body.

use thiserror::Error;

/// Centralized error type for request handling
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImagineError {
    /// `source` query parameter absent or empty
    #[error("No source defined in query params")]
    MissingParameter,

    /// `source` is not an absolute URL
    #[error("Invalid source URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// `width`/`height` is not an integer, is negative, or does not fit
    #[error("Invalid {param} '{value}': {reason}")]
    InvalidDimension {
        param: &'static str,
        value: String,
        reason: String,
    },

    /// No decoder is registered for the source extension
    #[error("{}", unsupported_message(.extension))]
    UnsupportedSourceFormat { extension: String },

    /// Source could not be retrieved
    #[error("Failed to fetch {url}: {reason}")]
    FetchFailure { url: String, reason: String },

    /// Source bytes are not a valid image of the expected format
    #[error("Failed to decode {format} image: {reason}")]
    DecodeFailure { format: &'static str, reason: String },

    /// Resampler rejected the image
    #[error("Failed to resize image: {reason}")]
    ResizeFailure { reason: String },

    /// Output could not be encoded or written
    #[error("Failed to encode {format} image: {reason}")]
    EncodeFailure { format: &'static str, reason: String },
}

fn unsupported_message(extension: &str) -> String {
    if extension.is_empty() {
        "extension is empty".to_string()
    } else {
        format!("Unsupported type: {}", extension)
    }
}

impl ImagineError {
    /// Maps errors to HTTP status codes
    ///
    /// Every kind is a client error; the match stays exhaustive so a new
    /// variant has to pick its status explicitly.
    pub fn to_http_status(&self) -> u16 {
        match self {
            ImagineError::MissingParameter
            | ImagineError::InvalidUrl { .. }
            | ImagineError::InvalidDimension { .. }
            | ImagineError::UnsupportedSourceFormat { .. }
            | ImagineError::FetchFailure { .. }
            | ImagineError::DecodeFailure { .. }
            | ImagineError::ResizeFailure { .. }
            | ImagineError::EncodeFailure { .. } => 400,
        }
    }

    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ImagineError::MissingParameter => "missing_parameter",
            ImagineError::InvalidUrl { .. } => "invalid_url",
            ImagineError::InvalidDimension { .. } => "invalid_dimension",
            ImagineError::UnsupportedSourceFormat { .. } => "unsupported_source_format",
            ImagineError::FetchFailure { .. } => "fetch_failure",
            ImagineError::DecodeFailure { .. } => "decode_failure",
            ImagineError::ResizeFailure { .. } => "resize_failure",
            ImagineError::EncodeFailure { .. } => "encode_failure",
        }
    }

    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        ImagineError::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_dimension(
        param: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ImagineError::InvalidDimension {
            param,
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported_format(extension: impl Into<String>) -> Self {
        ImagineError::UnsupportedSourceFormat {
            extension: extension.into(),
        }
    }

    pub fn fetch_failed(url: impl Into<String>, reason: impl ToString) -> Self {
        ImagineError::FetchFailure {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn decode_failed(format: &'static str, reason: impl ToString) -> Self {
        ImagineError::DecodeFailure {
            format,
            reason: reason.to_string(),
        }
    }

    pub fn resize_failed(reason: impl ToString) -> Self {
        ImagineError::ResizeFailure {
            reason: reason.to_string(),
        }
    }

    pub fn encode_failed(format: &'static str, reason: impl ToString) -> Self {
        ImagineError::EncodeFailure {
            format,
            reason: reason.to_string(),
        }
    }
}
