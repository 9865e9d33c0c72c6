// Proxy module - Pingora ProxyHttp implementation
// Every request is answered in request_filter; nothing is proxied upstream.

use async_trait::async_trait;
use pingora_core::upstreams::peer::HttpPeer;
use pingora_core::Result;
use pingora_proxy::{ProxyHttp, Session};
use std::sync::Arc;

use crate::config::Config;
use crate::fetch::{HttpFetcher, SourceFetcher};
use crate::handler::{write_body, ImagineHandler};
use crate::imaging::FormatRegistry;
use crate::metrics::ImagineMetrics;
use crate::pipeline::ResizePipeline;

pub mod context;
pub mod helpers;
pub mod sink;
pub mod special_endpoints;

pub use context::RequestContext;
pub use sink::SessionSink;
use special_endpoints::{Endpoint, EndpointResponse};

/// ImagineProxy implements the Pingora ProxyHttp trait
/// Routes requests to the resize handler or the built-in endpoints
pub struct ImagineProxy {
    handler: ImagineHandler,
}

impl ImagineProxy {
    /// Create a new ImagineProxy with the production HTTP fetcher
    pub fn new(config: &Config) -> std::result::Result<Self, String> {
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Create a new ImagineProxy around any source fetcher
    pub fn with_fetcher(config: &Config, fetcher: Arc<dyn SourceFetcher>) -> Self {
        let registry = Arc::new(FormatRegistry::new(&config.imaging));
        let pipeline = ResizePipeline::new(fetcher, config.imaging.chunk_size);

        Self {
            handler: ImagineHandler::new(registry, pipeline),
        }
    }

    async fn write_endpoint(
        sink: &mut SessionSink<'_>,
        response: EndpointResponse,
    ) -> std::io::Result<()> {
        write_body(sink, response.status, response.content_type, response.body).await
    }
}

#[async_trait]
impl ProxyHttp for ImagineProxy {
    type CTX = RequestContext;

    fn new_ctx(&self) -> Self::CTX {
        RequestContext::new()
    }

    /// Never reached: request_filter always handles the request
    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        Err(pingora_core::Error::explain(
            pingora_core::ErrorType::InternalError,
            "No upstream configured",
        ))
    }

    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        let req = session.req_header();
        ctx.set_request(req.method.as_str(), req.uri.path());
        let endpoint = Endpoint::classify(ctx.path());
        let params = helpers::extract_query_params(req);

        tracing::debug!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
            "Request received"
        );

        let mut sink = SessionSink::new(session, ctx.request_id());
        let written = match endpoint {
            Endpoint::Imagine => match self.handler.handle(&params, &mut sink).await {
                Ok(outcome) => {
                    ctx.set_outcome(outcome.as_label());
                    Ok(())
                }
                Err(e) => {
                    ctx.set_outcome("aborted");
                    Err(e)
                }
            },
            Endpoint::Healthcheck => {
                Self::write_endpoint(&mut sink, special_endpoints::handle_healthcheck()).await
            }
            Endpoint::Metrics => {
                let response = special_endpoints::handle_metrics(ImagineMetrics::global());
                Self::write_endpoint(&mut sink, response).await
            }
            Endpoint::NotFound => {
                Self::write_endpoint(&mut sink, special_endpoints::handle_not_found()).await
            }
        };

        if let Err(e) = written {
            return Err(pingora_core::Error::because(
                pingora_core::ErrorType::InternalError,
                "Failed to write response",
                e,
            ));
        }

        // Response already sent
        Ok(true)
    }

    async fn logging(
        &self,
        session: &mut Session,
        e: Option<&pingora_core::Error>,
        ctx: &mut Self::CTX,
    ) {
        let status_code = session
            .response_written()
            .map(|resp| resp.status.as_u16())
            .unwrap_or(500);
        let duration_ms = ctx.elapsed().as_secs_f64() * 1000.0;
        let client_ip = helpers::get_client_ip(session);
        let error = e.map(|e| e.to_string());

        tracing::info!(
            request_id = %ctx.request_id(),
            client_ip = %client_ip,
            method = %ctx.method(),
            path = %ctx.path(),
            status_code = status_code,
            duration_ms = duration_ms,
            outcome = ctx.outcome().unwrap_or("-"),
            error = error.as_deref(),
            "Request completed"
        );
    }
}
