use thiserror::Error;

/// Top-level error type for the `mtc-api` crate.
///
/// Covers every failure mode of talking to an agent over HTTP.
/// `mtc-core` treats all of these as a failed fetch for a single cycle.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The agent answered with a non-success status code.
    #[error("Agent returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying on the next tick.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::HttpStatus { status: 404, .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = Error::HttpStatus {
            status: 503,
            url: "http://agent/current".into(),
        };
        assert!(err.is_transient());
        assert!(!err.is_not_found());
    }

    #[test]
    fn not_found_is_permanent() {
        let err = Error::HttpStatus {
            status: 404,
            url: "http://agent/probe".into(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_transient());
    }
}
