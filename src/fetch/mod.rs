//! Source image fetching.
//!
//! The [`SourceFetcher`] trait is the seam between the resize pipeline and
//! the network. [`HttpFetcher`] is the production implementation built on a
//! shared `reqwest` connection pool.
//!
//! # Limits
//!
//! - Total and connect timeouts, so an unresponsive origin cannot hold a
//!   request forever
//! - A redirect limit
//! - A maximum body size, checked against `Content-Length` up front and
//!   against the bytes actually received
//!
//! The response is owned by `fetch`; it is released on every return path and
//! when the calling future is dropped.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::redirect::Policy;
use url::Url;

use crate::config::FetchConfig;
use crate::error::ImagineError;

/// Retrieves the raw bytes of a source image
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch `url`, failing with `FetchFailure` on transport errors and
    /// non-2xx responses
    async fn fetch(&self, url: &Url) -> Result<Bytes, ImagineError>;
}

/// HTTP(S) fetcher backed by `reqwest`
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_source_bytes: usize,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    /// (e.g., TLS configuration issues, system resource exhaustion).
    pub fn new(config: &FetchConfig) -> Result<Self, String> {
        let redirect = if config.max_redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(config.max_redirects)
        };

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .redirect(redirect)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            max_source_bytes: config.max_source_bytes,
        })
    }

    fn too_large(&self, url: &Url, size: u64) -> ImagineError {
        ImagineError::fetch_failed(
            url.as_str(),
            format!(
                "source size {} bytes exceeds maximum {} bytes",
                size, self.max_source_bytes
            ),
        )
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes, ImagineError> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ImagineError::fetch_failed(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImagineError::fetch_failed(
                url.as_str(),
                format!("upstream responded with {}", status),
            ));
        }

        let declared = response.content_length();
        if let Some(length) = declared {
            if length > self.max_source_bytes as u64 {
                return Err(self.too_large(url, length));
            }
        }

        let capacity = declared.unwrap_or(0).min(self.max_source_bytes as u64) as usize;
        let mut body = BytesMut::with_capacity(capacity);

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ImagineError::fetch_failed(url.as_str(), e))?
        {
            let received = body.len() + chunk.len();
            if received > self.max_source_bytes {
                return Err(self.too_large(url, received as u64));
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            bytes = body.len(),
            "Fetched source image"
        );

        Ok(body.freeze())
    }
}
