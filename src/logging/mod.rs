// Logging module for structured logging using the tracing crate

use std::error::Error;
use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

static INIT_RESULT: OnceLock<Result<(), String>> = OnceLock::new();

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - JSON (default) or pretty formatting, per `logging.format`
/// - Filtering from `RUST_LOG`, falling back to `logging.level`
/// - Output to stdout for container/cloud-native deployments
///
/// Only the first call installs a subscriber; later calls return the
/// outcome of that first attempt.
///
/// # Errors
///
/// Returns an error if the filter directive cannot be parsed or another
/// global subscriber was already installed.
///
/// # Examples
///
/// ```
/// use imagine::config::LoggingConfig;
/// use imagine::logging::init_subscriber;
///
/// init_subscriber(&LoggingConfig::default()).expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    INIT_RESULT
        .get_or_init(|| install(config).map_err(|e| e.to_string()))
        .clone()
        .map_err(Into::into)
}

fn install(config: &LoggingConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    }
}
