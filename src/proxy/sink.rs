//! [`ResponseSink`] over a pingora downstream session.

use async_trait::async_trait;
use bytes::Bytes;
use pingora_http::ResponseHeader;
use pingora_proxy::Session;
use std::io;

use crate::handler::ResponseSink;

/// Writes handler responses to the client, tagging every head with the
/// request ID
pub struct SessionSink<'a> {
    session: &'a mut Session,
    request_id: String,
}

impl<'a> SessionSink<'a> {
    pub fn new(session: &'a mut Session, request_id: impl Into<String>) -> Self {
        Self {
            session,
            request_id: request_id.into(),
        }
    }
}

fn to_io(e: Box<pingora_core::Error>) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

#[async_trait]
impl ResponseSink for SessionSink<'_> {
    async fn send_head(
        &mut self,
        status: u16,
        headers: Vec<(&'static str, String)>,
        end_of_stream: bool,
    ) -> io::Result<()> {
        let mut header = ResponseHeader::build(status, Some(headers.len() + 1)).map_err(to_io)?;
        for (name, value) in headers {
            header.insert_header(name, value).map_err(to_io)?;
        }
        header
            .insert_header("X-Request-ID", self.request_id.as_str())
            .map_err(to_io)?;

        self.session
            .write_response_header(Box::new(header), end_of_stream)
            .await
            .map_err(to_io)
    }

    async fn send_body(&mut self, chunk: Bytes, end_of_stream: bool) -> io::Result<()> {
        let data = if chunk.is_empty() { None } else { Some(chunk) };
        self.session
            .write_response_body(data, end_of_stream)
            .await
            .map_err(to_io)
    }
}
