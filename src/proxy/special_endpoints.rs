//! Routing and fixed-response endpoints.
//!
//! - `/imagine` - resize endpoint, handled by [`crate::handler`]
//! - `/healthcheck` - liveness probe
//! - `/metrics` - Prometheus metrics export
//! - anything else - 404
//!
//! Functions return `EndpointResponse` instead of writing directly to the
//! session; the caller writes it.

use crate::constants::{HEALTHCHECK_BODY, HEALTHCHECK_PATH, IMAGINE_PATH, METRICS_PATH};
use crate::metrics::ImagineMetrics;

/// Which handler a request path is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Imagine,
    Healthcheck,
    Metrics,
    NotFound,
}

impl Endpoint {
    /// Exact path match; method is not considered
    pub fn classify(path: &str) -> Self {
        match path {
            IMAGINE_PATH => Endpoint::Imagine,
            HEALTHCHECK_PATH => Endpoint::Healthcheck,
            METRICS_PATH => Endpoint::Metrics,
            _ => Endpoint::NotFound,
        }
    }
}

/// Response from a special endpoint handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: &'static str,
    /// Response body
    pub body: String,
}

impl EndpointResponse {
    /// Create a plain text response (for Prometheus metrics).
    pub fn prometheus(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/plain; version=0.0.4",
            body,
        }
    }
}

/// Generate response for /healthcheck endpoint.
pub fn handle_healthcheck() -> EndpointResponse {
    EndpointResponse {
        status: 200,
        content_type: "text/xml",
        body: HEALTHCHECK_BODY.to_string(),
    }
}

/// Generate response for /metrics endpoint.
pub fn handle_metrics(metrics: &ImagineMetrics) -> EndpointResponse {
    EndpointResponse::prometheus(metrics.export())
}

pub fn handle_not_found() -> EndpointResponse {
    EndpointResponse {
        status: 404,
        content_type: "text/plain; charset=utf-8",
        body: "404 page not found".to_string(),
    }
}
