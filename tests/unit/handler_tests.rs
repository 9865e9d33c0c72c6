// /imagine handler tests: real fetcher, local origin, recording sink

use async_trait::async_trait;
use bytes::Bytes;
use image::ImageFormat;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use imagine::config::{Config, FetchConfig};
use imagine::fetch::HttpFetcher;
use imagine::handler::{ImagineHandler, Outcome, ResponseSink};
use imagine::imaging::FormatRegistry;
use imagine::pipeline::ResizePipeline;
use imagine::proxy::helpers::parse_query;

use super::origin::{gif, jpeg, png, OriginServer, Route};

#[derive(Default)]
struct RecordedResponse {
    status: Option<u16>,
    headers: Vec<(&'static str, String)>,
    body: Vec<u8>,
    body_writes: usize,
    ended: bool,
}

impl RecordedResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
impl ResponseSink for RecordedResponse {
    async fn send_head(
        &mut self,
        status: u16,
        headers: Vec<(&'static str, String)>,
        end_of_stream: bool,
    ) -> io::Result<()> {
        assert!(self.status.is_none(), "head written twice");
        self.status = Some(status);
        self.headers = headers;
        self.ended = end_of_stream;
        Ok(())
    }

    async fn send_body(&mut self, chunk: Bytes, end_of_stream: bool) -> io::Result<()> {
        assert!(self.status.is_some(), "body before head");
        assert!(!self.ended, "body after end of stream");
        if !chunk.is_empty() {
            self.body_writes += 1;
        }
        self.body.extend_from_slice(&chunk);
        self.ended = end_of_stream;
        Ok(())
    }
}

fn handler_with(fetch: FetchConfig, chunk_size: usize) -> ImagineHandler {
    let config = Config::default();
    let fetcher = Arc::new(HttpFetcher::new(&fetch).unwrap());
    ImagineHandler::new(
        Arc::new(FormatRegistry::new(&config.imaging)),
        ResizePipeline::new(fetcher, chunk_size),
    )
}

fn handler() -> ImagineHandler {
    handler_with(FetchConfig::default(), Config::default().imaging.chunk_size)
}

fn params(query: &str) -> HashMap<String, String> {
    parse_query(query)
}

async fn run(handler: &ImagineHandler, query: &str) -> (Outcome, RecordedResponse) {
    let mut response = RecordedResponse::default();
    let outcome = handler.handle(&params(query), &mut response).await.unwrap();
    (outcome, response)
}

#[tokio::test]
async fn test_resize_png_width_only_to_jpeg() {
    let origin = OriginServer::start(vec![("/photo.png", Route::ok("image/png", png(100, 50)))]).await;
    let query = format!("source={}&width=50", urlencoding::encode(&origin.url("/photo.png")));

    let (outcome, response) = run(&handler(), &query).await;

    assert_eq!(outcome, Outcome::Transformed);
    assert_eq!(response.status, Some(200));
    assert_eq!(response.header("Content-Type"), Some("image/jpeg"));
    assert!(response.ended);

    let decoded = image::load_from_memory_with_format(&response.body, ImageFormat::Jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (50, 25));
}

#[tokio::test]
async fn test_resize_jpeg_height_only_to_png() {
    let origin = OriginServer::start(vec![("/photo.jpg", Route::ok("image/jpeg", jpeg(64, 32)))]).await;
    let query = format!(
        "source={}&height=16&encode=png",
        urlencoding::encode(&origin.url("/photo.jpg"))
    );

    let (outcome, response) = run(&handler(), &query).await;

    assert_eq!(outcome, Outcome::Transformed);
    assert_eq!(response.header("Content-Type"), Some("image/png"));
    let decoded = image::load_from_memory_with_format(&response.body, ImageFormat::Png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (32, 16));
}

#[tokio::test]
async fn test_resize_gif_both_dimensions() {
    let origin = OriginServer::start(vec![("/anim.gif", Route::ok("image/gif", gif(40, 40)))]).await;
    let query = format!(
        "source={}&width=10&height=30&encode=png",
        urlencoding::encode(&origin.url("/anim.gif"))
    );

    let (outcome, response) = run(&handler(), &query).await;

    assert_eq!(outcome, Outcome::Transformed);
    let decoded = image::load_from_memory(&response.body).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (10, 30));
}

#[tokio::test]
async fn test_output_streams_in_multiple_chunks() {
    let origin = OriginServer::start(vec![("/big.png", Route::ok("image/png", png(256, 256)))]).await;
    let query = format!(
        "source={}&width=200&encode=png",
        urlencoding::encode(&origin.url("/big.png"))
    );

    let (_, response) = run(&handler_with(FetchConfig::default(), 256), &query).await;

    assert_eq!(response.status, Some(200));
    assert!(response.body_writes > 1, "expected chunked output");
    assert!(image::load_from_memory(&response.body).is_ok());
}

#[tokio::test]
async fn test_unencoded_source_with_query_string() {
    // The source's own query lands in separate params when not encoded
    let origin = OriginServer::start(vec![("/a.png", Route::ok("image/png", png(10, 10)))]).await;
    let query = format!("source={}&width=5", origin.url("/a.png"));

    let (outcome, response) = run(&handler(), &query).await;

    assert_eq!(outcome, Outcome::Transformed);
    assert_eq!(response.status, Some(200));
}

#[tokio::test]
async fn test_passthrough_redirects_to_source() {
    let query = "source=http%3A%2F%2Forigin.invalid%2Fa.png";

    let (outcome, response) = run(&handler(), query).await;

    assert_eq!(outcome, Outcome::Redirected);
    assert_eq!(response.status, Some(301));
    assert_eq!(response.header("Location"), Some("http://origin.invalid/a.png"));
    assert!(response.body.is_empty());
    assert!(response.ended);
}

#[tokio::test]
async fn test_explicit_zero_dimensions_redirect() {
    let (outcome, response) = run(&handler(), "source=http://origin.invalid/a.gif&width=0&height=0").await;

    assert_eq!(outcome, Outcome::Redirected);
    assert_eq!(response.status, Some(301));
}

#[tokio::test]
async fn test_missing_source_message() {
    let (outcome, response) = run(&handler(), "width=10").await;

    assert_eq!(outcome, Outcome::Rejected);
    assert_eq!(response.status, Some(400));
    assert_eq!(response.text(), "No source defined in query params");
    assert_eq!(response.header("Content-Type"), Some("text/plain; charset=utf-8"));
}

#[tokio::test]
async fn test_negative_dimension_rejected() {
    let (outcome, response) = run(&handler(), "source=http://origin.invalid/a.png&height=-5").await;

    assert_eq!(outcome, Outcome::Rejected);
    assert_eq!(response.status, Some(400));
    assert_eq!(response.text(), "Invalid height '-5': must be 0 or positive");
}

#[tokio::test]
async fn test_oversized_dimensions_rejected_without_fetch() {
    let (outcome, response) = run(
        &handler(),
        "source=http://origin.invalid/a.png&width=4294967295&height=4294967295",
    )
    .await;

    assert_eq!(outcome, Outcome::Rejected);
    assert_eq!(response.status, Some(400));
    assert_eq!(
        response.text(),
        "Invalid width '4294967295': exceeds maximum 4096"
    );

    let (outcome, response) = run(&handler(), "source=http://origin.invalid/a.png&height=40000").await;
    assert_eq!(outcome, Outcome::Rejected);
    assert_eq!(response.text(), "Invalid height '40000': exceeds maximum 4096");
}

#[tokio::test]
async fn test_derived_axis_is_clamped_to_maximum() {
    let origin = OriginServer::start(vec![("/tall.png", Route::ok("image/png", png(2, 600)))]).await;
    let query = format!(
        "source={}&width=100&encode=png",
        urlencoding::encode(&origin.url("/tall.png"))
    );

    let (outcome, response) = run(&handler(), &query).await;

    assert_eq!(outcome, Outcome::Transformed);
    let decoded = image::load_from_memory(&response.body).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (100, 4096));
}

#[tokio::test]
async fn test_percent_encoded_extension_is_decoded() {
    let origin = OriginServer::start(vec![("/a%2Epng", Route::ok("image/png", png(8, 8)))]).await;
    let query = format!(
        "source={}&width=4&encode=png",
        urlencoding::encode(&origin.url("/a%2Epng"))
    );

    let (outcome, response) = run(&handler(), &query).await;

    assert_eq!(outcome, Outcome::Transformed);
    assert_eq!(response.status, Some(200));
}

#[tokio::test]
async fn test_unsupported_extension_rejected() {
    let (_, response) = run(&handler(), "source=http://origin.invalid/a.webp&width=10").await;

    assert_eq!(response.status, Some(400));
    assert_eq!(response.text(), "Unsupported type: .webp");
}

#[tokio::test]
async fn test_missing_extension_message() {
    let (outcome, response) = run(&handler(), "source=http://origin.invalid/noext&width=10").await;

    assert_eq!(outcome, Outcome::Rejected);
    assert_eq!(response.status, Some(400));
    assert_eq!(response.text(), "extension is empty");
}

#[tokio::test]
async fn test_extension_is_case_sensitive() {
    let (_, response) = run(&handler(), "source=http://origin.invalid/A.PNG&width=10").await;

    assert_eq!(response.status, Some(400));
    assert_eq!(response.text(), "Unsupported type: .PNG");
}

#[tokio::test]
async fn test_origin_404_is_400() {
    let origin = OriginServer::start(vec![]).await;
    let query = format!("source={}&width=10", urlencoding::encode(&origin.url("/nope.png")));

    let (outcome, response) = run(&handler(), &query).await;

    assert_eq!(outcome, Outcome::Failed);
    assert_eq!(response.status, Some(400));
    assert!(response.text().starts_with("Failed to fetch"), "got: {}", response.text());
}

#[tokio::test]
async fn test_non_image_body_is_decode_failure() {
    let origin = OriginServer::start(vec![(
        "/fake.png",
        Route::ok("text/html", b"<html>definitely not a png</html>".to_vec()),
    )])
    .await;
    let query = format!("source={}&width=10", urlencoding::encode(&origin.url("/fake.png")));

    let (outcome, response) = run(&handler(), &query).await;

    assert_eq!(outcome, Outcome::Failed);
    assert_eq!(response.status, Some(400));
    assert!(response.text().starts_with("Failed to decode png"), "got: {}", response.text());
}

#[tokio::test]
async fn test_mismatched_extension_is_decode_failure() {
    // Decoder is picked from the extension, not the bytes
    let origin = OriginServer::start(vec![("/really-png.jpg", Route::ok("image/png", png(8, 8)))]).await;
    let query = format!(
        "source={}&width=4",
        urlencoding::encode(&origin.url("/really-png.jpg"))
    );

    let (outcome, response) = run(&handler(), &query).await;

    assert_eq!(outcome, Outcome::Failed);
    assert_eq!(response.status, Some(400));
}
