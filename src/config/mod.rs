// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod fetch;
mod logging;
mod server;

pub use fetch::FetchConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use server::ServerConfig;

pub use crate::imaging::ImagingConfig;

/// Top-level service configuration
///
/// Every section is optional in YAML; an empty document (or no file at all)
/// yields a server listening on `0.0.0.0:8080` with default limits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub imaging: ImagingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        // An empty document deserializes to unit, not to a mapping
        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Load from an optional path, falling back to defaults, then validate
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.address.trim().is_empty() {
            return Err("server.address cannot be empty".to_string());
        }
        if self.server.port == 0 {
            return Err("server.port must be > 0".to_string());
        }

        if self.fetch.timeout_secs == 0 {
            return Err("fetch.timeout_secs must be > 0".to_string());
        }
        if self.fetch.connect_timeout_secs == 0 {
            return Err("fetch.connect_timeout_secs must be > 0".to_string());
        }
        if self.fetch.max_source_bytes == 0 {
            return Err("fetch.max_source_bytes must be > 0".to_string());
        }

        if !(1..=100).contains(&self.imaging.jpeg_quality) {
            return Err(format!(
                "imaging.jpeg_quality {} is invalid: must be 1-100",
                self.imaging.jpeg_quality
            ));
        }
        if self.imaging.chunk_size == 0 {
            return Err("imaging.chunk_size must be > 0".to_string());
        }
        if self.imaging.max_width == 0 || self.imaging.max_height == 0 {
            return Err("imaging.max_width and imaging.max_height must be > 0".to_string());
        }

        Ok(())
    }

    /// Socket address the listener binds to
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.address, self.server.port)
    }
}
