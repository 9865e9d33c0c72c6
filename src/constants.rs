// Constants module - centralized default values for configuration

// =============================================================================
// Server defaults
// =============================================================================

/// Default listen address
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

// =============================================================================
// Fetch defaults
// =============================================================================

/// Default total timeout for fetching a source image, in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout for the source host, in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default number of redirects followed when fetching a source
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Default maximum source image size (32 MB)
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 32 * 1024 * 1024;

// =============================================================================
// Imaging defaults
// =============================================================================

/// Default JPEG quality, matching the common libjpeg default
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Default size of the chunks streamed to the client while encoding (32 KB)
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Default upper bound for a requested or derived output width
pub const DEFAULT_MAX_WIDTH: u32 = 4096;

/// Default upper bound for a requested or derived output height
pub const DEFAULT_MAX_HEIGHT: u32 = 4096;

/// Number of encoded chunks buffered between the encoder and the client
pub const RESPONSE_CHANNEL_DEPTH: usize = 4;

// =============================================================================
// Endpoints
// =============================================================================

/// Resize endpoint path
pub const IMAGINE_PATH: &str = "/imagine";

/// Health check endpoint path
pub const HEALTHCHECK_PATH: &str = "/healthcheck";

/// Prometheus metrics endpoint path
pub const METRICS_PATH: &str = "/metrics";

/// Fixed health check body
pub const HEALTHCHECK_BODY: &str = "<healthcheck>ok</healthcheck>";
