// ── Runtime client configuration ──
//
// Describes *which* agent to talk to and how often. Never touches disk;
// the CLI (via mtc-config) builds a `ClientConfig` and hands it in.

use std::time::Duration;

use mtc_api::{AgentEndpoints, SampleUrlStyle, TransportConfig};

use crate::error::CoreError;
use crate::model::DEFAULT_BUFFER_SIZE;

/// Public demo agent.
pub const DEFAULT_AGENT_URL: &str = "http://agent.mtconnect.org/";

/// Time between sample polls while streaming.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(2000);

/// Configuration for one agent session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Agent base URL (e.g., `http://agent.mtconnect.org/`).
    pub agent_url: String,
    /// Interval between sample polls while streaming.
    pub update_interval: Duration,
    /// History capacity given to every data item.
    pub default_buffer_size: usize,
    /// How request paths are joined onto `agent_url`.
    pub sample_url_style: SampleUrlStyle,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            agent_url: DEFAULT_AGENT_URL.into(),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            default_buffer_size: DEFAULT_BUFFER_SIZE,
            sample_url_style: SampleUrlStyle::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Config for `agent_url` with every other field defaulted.
    pub fn for_agent(agent_url: impl Into<String>) -> Self {
        Self {
            agent_url: agent_url.into(),
            ..Self::default()
        }
    }

    /// Check the values a session cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.default_buffer_size == 0 {
            return Err(CoreError::Config {
                message: "buffer size must be at least 1".into(),
            });
        }
        if self.update_interval.is_zero() {
            return Err(CoreError::Config {
                message: "update interval must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Validated endpoint set for this agent.
    pub fn endpoints(&self) -> Result<AgentEndpoints, CoreError> {
        AgentEndpoints::new(self.agent_url.clone(), self.sample_url_style).map_err(|e| {
            CoreError::Config {
                message: format!("invalid agent URL '{}': {e}", self.agent_url),
            }
        })
    }

    /// Transport settings derived from this config.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig::with_timeout(self.timeout)
    }
}
