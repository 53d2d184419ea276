//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use finch_core::config::ProxyConfig;
use finch_core::error::FinchError;

/// Shared proxy state.
///
/// Cloned into every handler task; the HTTP client pools upstream
/// connections across requests.
#[derive(Clone)]
pub struct AppState {
    /// Proxy configuration.
    pub config: Arc<ProxyConfig>,
    /// Client used for every upstream call.
    pub http_client: reqwest::Client,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> Result<Self, FinchError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FinchError::Api(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config: Arc::new(config),
            http_client,
            start_time: Instant::now(),
        })
    }

    /// Upstream origin without trailing slashes.
    pub fn upstream(&self) -> &str {
        self.config.upstream.trim_end_matches('/')
    }
}
