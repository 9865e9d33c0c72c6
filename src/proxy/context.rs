// Per-request context carried through the pingora phases

use std::time::{Duration, Instant};
use uuid::Uuid;

/// Request context that holds everything logged once the request completes
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    method: String,
    path: String,
    started: Instant,
    outcome: Option<&'static str>,
}

impl RequestContext {
    /// Automatically generates a unique request ID (UUID v4) and captures the
    /// start instant
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            method: String::new(),
            path: String::new(),
            started: Instant::now(),
            outcome: None,
        }
    }

    pub fn set_request(&mut self, method: &str, path: &str) {
        self.method = method.to_string();
        self.path = path.to_string();
    }

    pub fn set_outcome(&mut self, outcome: &'static str) {
        self.outcome = Some(outcome);
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn outcome(&self) -> Option<&'static str> {
        self.outcome
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
