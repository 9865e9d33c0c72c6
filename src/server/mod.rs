// Server module - Pingora HTTP server setup and configuration

use crate::config::Config;
use crate::proxy::ImagineProxy;
use pingora_core::server::configuration::Opt as ServerOpt;
use pingora_core::server::Server;

/// Process-level switches passed through to pingora
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerOptions {
    /// Run in the background
    pub daemon: bool,
    /// Take over listening sockets from a running instance
    pub upgrade: bool,
}

/// Imagine HTTP Server wrapper around Pingora
pub struct ImagineServer {
    config: Config,
    server_opt: ServerOpt,
}

impl ImagineServer {
    /// Create a new ImagineServer instance
    pub fn new(config: Config, options: ServerOptions) -> Self {
        let server_opt = ServerOpt {
            daemon: options.daemon,
            upgrade: options.upgrade,
            ..Default::default()
        };

        Self { config, server_opt }
    }

    /// Address the HTTP listener binds to
    pub fn listen_address(&self) -> String {
        self.config.listen_address()
    }

    /// Get the Pingora server options
    pub fn server_opt(&self) -> &ServerOpt {
        &self.server_opt
    }

    /// Bootstrap pingora and register the proxy service
    ///
    /// The returned server is ready for `run_forever`.
    pub fn build(self) -> Result<Server, String> {
        let listen_addr = self.listen_address();

        let mut server = Server::new(Some(self.server_opt))
            .map_err(|e| format!("Failed to create Pingora server: {}", e))?;
        server.bootstrap();

        let proxy = ImagineProxy::new(&self.config)?;
        let mut proxy_service = pingora_proxy::http_proxy_service(&server.configuration, proxy);
        proxy_service.add_tcp(&listen_addr);
        server.add_service(proxy_service);

        tracing::info!(address = %listen_addr, "HTTP listener registered");

        Ok(server)
    }
}
