//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use mtc_api::Error as ApiError;
use mtc_config::ConfigError;
use mtc_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const PROTOCOL: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to agent at {url}")]
    #[diagnostic(
        code(mtc::connection_failed),
        help(
            "Check that the agent is running and reachable.\n\
             Try: mtc probe --agent http://agent.mtconnect.org/"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request to {url} timed out")]
    #[diagnostic(
        code(mtc::timeout),
        help("Increase timeout with --timeout or check agent responsiveness.")
    )]
    Timeout { url: String },

    #[error("Agent returned HTTP {status} for {url}")]
    #[diagnostic(
        code(mtc::http_status),
        help("Check that --agent points at the agent base URL, not a device path.")
    )]
    HttpStatus { status: u16, url: String },

    // ── Protocol ─────────────────────────────────────────────────────

    #[error("Agent reported {code}: {message}")]
    #[diagnostic(code(mtc::agent_error))]
    AgentError { code: String, message: String },

    #[error("Unexpected agent response: {reason}")]
    #[diagnostic(
        code(mtc::malformed_response),
        help("Is the URL an MTConnect agent? Run with -vv to see the requests.")
    )]
    MalformedResponse { reason: String },

    #[error("Agent sent data for unknown data item '{id}'")]
    #[diagnostic(
        code(mtc::unknown_data_item),
        help("The agent's device model changed since the probe. Run the command again.")
    )]
    UnknownDataItem { id: String },

    #[error("{message}")]
    #[diagnostic(code(mtc::session))]
    Session { message: String },

    // ── Lookups ──────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(mtc::not_found),
        help("Run: mtc probe to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(mtc::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(mtc::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: mtc config init --name {name} --agent <URL>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Could not load configuration: {message}")]
    #[diagnostic(code(mtc::config), help("Config file: {path}"))]
    Config { message: String, path: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    #[diagnostic(code(mtc::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    #[diagnostic(code(mtc::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML output failed: {0}")]
    #[diagnostic(code(mtc::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::HttpStatus { status: 404, .. } | Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::AgentError { .. }
            | Self::MalformedResponse { .. }
            | Self::UnknownDataItem { .. } => exit_code::PROTOCOL,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::Fetch(fetch) => fetch.into(),

            CoreError::MalformedProbeResponse { reason }
            | CoreError::MalformedStreamResponse { reason } => {
                CliError::MalformedResponse { reason }
            }

            CoreError::MalformedTimestamp { .. } | CoreError::DuplicateDataItemId { .. } => {
                CliError::MalformedResponse { reason: message }
            }

            CoreError::AgentError { code, message } => CliError::AgentError { code, message },

            CoreError::UnknownDataItemId { id, .. } => CliError::UnknownDataItem { id },

            CoreError::DataItemNotFound { id } => CliError::NotFound {
                resource_type: "data item".into(),
                identifier: id,
            },

            CoreError::InvalidBufferSize { .. } => CliError::Validation {
                field: "buffer_size".into(),
                reason: message,
            },

            CoreError::NotProbed | CoreError::InvalidTransition { .. } => {
                CliError::Session { message }
            }

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport(e) => {
                let url = e.url().map(ToString::to_string).unwrap_or_default();
                if e.is_timeout() {
                    CliError::Timeout { url }
                } else {
                    CliError::ConnectionFailed {
                        url,
                        source: Box::new(e),
                    }
                }
            }
            ApiError::HttpStatus { status, url } => CliError::HttpStatus { status, url },
            ApiError::InvalidUrl(e) => CliError::Validation {
                field: "agent".into(),
                reason: e.to_string(),
            },
            ApiError::ClientBuild(reason) => CliError::Validation {
                field: "transport".into(),
                reason,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
                path: mtc_config::config_path().display().to_string(),
            },
        }
    }
}
