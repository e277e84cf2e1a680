// Shared transport configuration for building reqwest::Client instances.

use std::time::Duration;

/// User agent sent with every agent request.
const USER_AGENT: &str = concat!("mtc/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub gzip: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            gzip: true,
        }
    }
}

impl TransportConfig {
    /// Create a config with the given request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .gzip(self.gzip)
            .build()
            .map_err(|e| crate::error::Error::ClientBuild(e.to_string()))
    }
}
