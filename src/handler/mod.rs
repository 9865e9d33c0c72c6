//! `/imagine` request handling.
//!
//! The handler validates the query, then either redirects to the source,
//! answers with a 400, or streams the transformed image. Responses are
//! written through [`ResponseSink`] so the same logic drives a pingora
//! session in production and a recording sink in tests.
//!
//! # Response shapes
//!
//! | Case                               | Status | Body                    |
//! |------------------------------------|--------|-------------------------|
//! | invalid query                      | 400    | error message           |
//! | width and height both 0            | 301    | empty, `Location` set   |
//! | pipeline fails before first byte   | 400    | error message           |
//! | success                            | 200    | encoded image, chunked  |
//! | pipeline fails after first byte    | 200    | truncated stream        |

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::constants::RESPONSE_CHANNEL_DEPTH;
use crate::error::ImagineError;
use crate::imaging::{FormatRegistry, ResizeSpec};
use crate::metrics::ImagineMetrics;
use crate::pipeline::ResizePipeline;

/// Destination for one HTTP response
#[async_trait]
pub trait ResponseSink: Send {
    /// Write the status line and headers
    async fn send_head(
        &mut self,
        status: u16,
        headers: Vec<(&'static str, String)>,
        end_of_stream: bool,
    ) -> io::Result<()>;

    /// Write a body chunk; an empty chunk with `end_of_stream` just ends it
    async fn send_body(&mut self, chunk: Bytes, end_of_stream: bool) -> io::Result<()>;
}

/// How a resize request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Image encoded and fully streamed
    Transformed,
    /// Passthrough redirect to the source
    Redirected,
    /// Query validation failed
    Rejected,
    /// Pipeline failed before any output was sent
    Failed,
    /// Pipeline failed after the 200 head was sent
    Truncated,
}

impl Outcome {
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::Transformed => "transformed",
            Outcome::Redirected => "redirected",
            Outcome::Rejected => "rejected",
            Outcome::Failed => "failed",
            Outcome::Truncated => "truncated",
        }
    }
}

pub struct ImagineHandler {
    registry: Arc<FormatRegistry>,
    pipeline: ResizePipeline,
}

impl ImagineHandler {
    pub fn new(registry: Arc<FormatRegistry>, pipeline: ResizePipeline) -> Self {
        Self { registry, pipeline }
    }

    /// Handle one `/imagine` request with already decoded query parameters
    ///
    /// Returns `Err` only when writing to `sink` fails, i.e. the client went
    /// away; every other failure is answered on the wire.
    pub async fn handle<S>(
        &self,
        params: &HashMap<String, String>,
        sink: &mut S,
    ) -> io::Result<Outcome>
    where
        S: ResponseSink + ?Sized,
    {
        let result = self.respond(params, sink).await;

        let metrics = ImagineMetrics::global();
        match &result {
            Ok(outcome) => metrics.record_outcome(outcome.as_label()),
            Err(_) => metrics.record_outcome("aborted"),
        }

        result
    }

    async fn respond<S>(&self, params: &HashMap<String, String>, sink: &mut S) -> io::Result<Outcome>
    where
        S: ResponseSink + ?Sized,
    {
        let spec = match ResizeSpec::from_query(params, &self.registry) {
            Ok(spec) => spec,
            Err(err) => {
                tracing::info!(
                    error_kind = err.kind(),
                    error = %err,
                    "Rejected resize request"
                );
                write_error(sink, &err).await?;
                return Ok(Outcome::Rejected);
            }
        };

        if spec.is_passthrough() {
            tracing::debug!(source = %spec.source, "No dimensions requested, redirecting to source");
            write_redirect(sink, spec.source.as_str()).await?;
            return Ok(Outcome::Redirected);
        }

        self.stream_transform(&spec, sink).await
    }

    async fn stream_transform<S>(&self, spec: &ResizeSpec, sink: &mut S) -> io::Result<Outcome>
    where
        S: ResponseSink + ?Sized,
    {
        let content_type = spec.encoder.content_type();
        let (tx, rx) = mpsc::channel(RESPONSE_CHANNEL_DEPTH);

        let (result, forwarded) = tokio::join!(
            self.pipeline.run(spec, tx),
            forward_chunks(rx, &mut *sink, content_type)
        );

        let head_sent = match forwarded {
            Ok(head_sent) => head_sent,
            Err(e) => {
                tracing::info!(
                    source = %spec.source,
                    error = %e,
                    "Client went away while streaming"
                );
                return Err(e);
            }
        };

        match result {
            Ok(report) => {
                if head_sent {
                    sink.send_body(Bytes::new(), true).await?;
                } else {
                    sink.send_head(200, success_headers(content_type), true).await?;
                }

                tracing::info!(
                    source = %spec.source,
                    source_bytes = report.source_bytes,
                    encoded_bytes = report.encoded_bytes,
                    source_width = report.transform.source_size.0,
                    source_height = report.transform.source_size.1,
                    width = report.transform.output_size.0,
                    height = report.transform.output_size.1,
                    format = spec.encoder.name(),
                    "Image transformed"
                );
                Ok(Outcome::Transformed)
            }
            Err(err) if !head_sent => {
                tracing::warn!(
                    source = %spec.source,
                    error_kind = err.kind(),
                    error = %err,
                    "Resize pipeline failed"
                );
                write_error(sink, &err).await?;
                Ok(Outcome::Failed)
            }
            Err(err) => {
                tracing::warn!(
                    source = %spec.source,
                    error_kind = err.kind(),
                    error = %err,
                    "Resize pipeline failed after response started, truncating"
                );
                sink.send_body(Bytes::new(), true).await?;
                Ok(Outcome::Truncated)
            }
        }
    }
}

/// Relay encoded chunks to the sink, sending the 200 head before the first one
///
/// Returns whether the head was sent. On a sink error the receiver is dropped
/// so the encoder stops at its next write.
async fn forward_chunks<S>(
    mut rx: mpsc::Receiver<Bytes>,
    sink: &mut S,
    content_type: &'static str,
) -> io::Result<bool>
where
    S: ResponseSink + ?Sized,
{
    let mut head_sent = false;

    while let Some(chunk) = rx.recv().await {
        if !head_sent {
            sink.send_head(200, success_headers(content_type), false).await?;
            head_sent = true;
        }
        sink.send_body(chunk, false).await?;
    }

    Ok(head_sent)
}

fn success_headers(content_type: &'static str) -> Vec<(&'static str, String)> {
    vec![
        ("Content-Type", content_type.to_string()),
        ("Transfer-Encoding", "chunked".to_string()),
    ]
}

/// 400 with the error message as a plain-text body
pub async fn write_error<S>(sink: &mut S, err: &ImagineError) -> io::Result<()>
where
    S: ResponseSink + ?Sized,
{
    let body = err.to_string();
    let headers = vec![
        ("Content-Type", "text/plain; charset=utf-8".to_string()),
        ("X-Content-Type-Options", "nosniff".to_string()),
        ("Content-Length", body.len().to_string()),
    ];

    sink.send_head(err.to_http_status(), headers, false).await?;
    sink.send_body(Bytes::from(body), true).await
}

/// 301 to `location` with an empty body
pub async fn write_redirect<S>(sink: &mut S, location: &str) -> io::Result<()>
where
    S: ResponseSink + ?Sized,
{
    let headers = vec![
        ("Location", location.to_string()),
        ("Content-Length", "0".to_string()),
    ];
    sink.send_head(301, headers, true).await
}

/// Fixed response with a known body
pub async fn write_body<S>(
    sink: &mut S,
    status: u16,
    content_type: &'static str,
    body: String,
) -> io::Result<()>
where
    S: ResponseSink + ?Sized,
{
    let headers = vec![
        ("Content-Type", content_type.to_string()),
        ("Content-Length", body.len().to_string()),
    ];

    sink.send_head(status, headers, false).await?;
    sink.send_body(Bytes::from(body), true).await
}
