use clap::Parser;
use imagine::config::Config;
use imagine::server::{ImagineServer, ServerOptions};
use std::path::PathBuf;

/// Imagine - fetch, resize and re-encode images on the fly
#[derive(Parser, Debug)]
#[command(name = "imagine")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Daemon mode
    #[arg(short = 'd', long)]
    daemon: bool,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,

    /// Upgrade workers gracefully
    #[arg(long)]
    upgrade: bool,
}

fn main() {
    let args = Args::parse();

    // Configuration first: it decides the log format
    let config = Config::load(args.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    imagine::logging::init_subscriber(&config.logging).unwrap_or_else(|e| {
        eprintln!("Failed to initialize logging subsystem: {}", e);
        std::process::exit(1);
    });

    let config_file = args
        .config
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<defaults>".to_string());
    tracing::info!(
        config_file = %config_file,
        server_address = %config.server.address,
        server_port = config.server.port,
        fetch_timeout_secs = config.fetch.timeout_secs,
        max_source_bytes = config.fetch.max_source_bytes,
        jpeg_quality = config.imaging.jpeg_quality,
        max_width = config.imaging.max_width,
        max_height = config.imaging.max_height,
        "Configuration loaded successfully"
    );

    if args.test {
        tracing::info!("Configuration test passed");
        return;
    }

    let options = ServerOptions {
        daemon: args.daemon,
        upgrade: args.upgrade,
    };
    let server = ImagineServer::new(config, options)
        .build()
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to start server");
            std::process::exit(1);
        });

    tracing::info!("Starting Imagine");

    // Run server forever (blocks until shutdown)
    server.run_forever();
}
