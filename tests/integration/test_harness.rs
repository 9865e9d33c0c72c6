// Test harness for integration tests
// Starts the imagine binary on a free port and stops it on drop

use std::io::Write;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Running imagine instance that is killed when dropped
pub struct ImagineTestHarness {
    process: Option<Child>,
    _config: NamedTempFile,
    pub port: u16,
    pub base_url: String,
}

/// Helper function to find an available port
pub fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

impl ImagineTestHarness {
    /// Start imagine with `extra_yaml` appended to a generated server section
    pub async fn start(extra_yaml: &str) -> Result<Self, String> {
        let port = get_available_port();
        let yaml = format!(
            "server:\n  address: \"127.0.0.1\"\n  port: {}\nlogging:\n  level: warn\n{}",
            port, extra_yaml
        );

        let mut config = NamedTempFile::new().map_err(|e| e.to_string())?;
        config
            .write_all(yaml.as_bytes())
            .map_err(|e| format!("Failed to write config: {}", e))?;

        let mut child = Command::new(env!("CARGO_BIN_EXE_imagine"))
            .arg("--config")
            .arg(config.path())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("Failed to start imagine: {}", e))?;

        let base_url = format!("http://127.0.0.1:{}", port);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        for _ in 0..50 {
            if let Ok(Some(status)) = child.try_wait() {
                return Err(format!("imagine exited immediately with status: {}", status));
            }

            if let Ok(response) = client.get(format!("{}/healthcheck", base_url)).send().await {
                if response.status().is_success() {
                    return Ok(Self {
                        process: Some(child),
                        _config: config,
                        port,
                        base_url,
                    });
                }
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let _ = child.kill();
        let _ = child.wait();
        Err(format!("imagine did not become healthy on port {}", port))
    }

    /// Get the full URL for a path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn stop(&mut self) {
        if let Some(mut child) = self.process.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for ImagineTestHarness {
    fn drop(&mut self) {
        self.stop();
    }
}
