// Agent request targets.
//
// An agent exposes three read endpoints below its base URL: `probe`,
// `current`, and `sample?at=N`. Older clients joined the sample path
// without a separating slash; `SampleUrlStyle::Legacy` reproduces that
// byte for byte for agents that depend on it.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;

const PROBE: &str = "probe";
const CURRENT: &str = "current";
const SAMPLE: &str = "sample";
const AT_PART: &str = "?at=";

/// How request paths are joined onto the agent base URL.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SampleUrlStyle {
    /// Trailing slashes on the base are trimmed and every path is joined
    /// with exactly one `/`.
    #[default]
    Normalized,
    /// Verbatim joining: `{base}/probe`, `{base}/current`, `{base}sample?at=N`.
    Legacy,
}

/// Derives the probe/current/sample URLs for one agent.
#[derive(Debug, Clone)]
pub struct AgentEndpoints {
    base: String,
    style: SampleUrlStyle,
}

impl AgentEndpoints {
    /// Validate `base` and build the endpoint set.
    pub fn new(base: impl Into<String>, style: SampleUrlStyle) -> Result<Self, Error> {
        let base = base.into();
        Url::parse(&base)?;
        Ok(Self { base, style })
    }

    /// The agent base URL exactly as configured.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn style(&self) -> SampleUrlStyle {
        self.style
    }

    /// `{base}/probe`
    pub fn probe(&self) -> Result<Url, Error> {
        self.join(PROBE)
    }

    /// `{base}/current`
    pub fn current(&self) -> Result<Url, Error> {
        self.join(CURRENT)
    }

    /// Sample request for everything strictly after the cursor.
    ///
    /// `at` is the first sequence number wanted, i.e. `cursor + 1`.
    pub fn sample(&self, at: u64) -> Result<Url, Error> {
        let full = match self.style {
            SampleUrlStyle::Normalized => {
                format!("{}/{SAMPLE}{AT_PART}{at}", self.trimmed())
            }
            SampleUrlStyle::Legacy => format!("{}{SAMPLE}{AT_PART}{at}", self.base),
        };
        Ok(Url::parse(&full)?)
    }

    fn join(&self, request: &str) -> Result<Url, Error> {
        let full = match self.style {
            SampleUrlStyle::Normalized => format!("{}/{request}", self.trimmed()),
            SampleUrlStyle::Legacy => format!("{}/{request}", self.base),
        };
        Ok(Url::parse(&full)?)
    }

    fn trimmed(&self) -> &str {
        self.base.trim_end_matches('/')
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn normalized_joins_with_single_slash() {
        let ep = AgentEndpoints::new("http://agent.example.com:5000/", SampleUrlStyle::Normalized)
            .unwrap();

        assert_eq!(ep.probe().unwrap().as_str(), "http://agent.example.com:5000/probe");
        assert_eq!(
            ep.current().unwrap().as_str(),
            "http://agent.example.com:5000/current"
        );
        assert_eq!(
            ep.sample(11).unwrap().as_str(),
            "http://agent.example.com:5000/sample?at=11"
        );
    }

    #[test]
    fn normalized_keeps_base_path_prefix() {
        let ep =
            AgentEndpoints::new("http://host/agents/mill", SampleUrlStyle::Normalized).unwrap();

        assert_eq!(ep.probe().unwrap().as_str(), "http://host/agents/mill/probe");
        assert_eq!(ep.sample(1).unwrap().as_str(), "http://host/agents/mill/sample?at=1");
    }

    #[test]
    fn legacy_reproduces_verbatim_joining() {
        let ep = AgentEndpoints::new("http://agent.example.com/", SampleUrlStyle::Legacy).unwrap();

        assert_eq!(ep.probe().unwrap().as_str(), "http://agent.example.com//probe");
        assert_eq!(ep.current().unwrap().as_str(), "http://agent.example.com//current");
        assert_eq!(
            ep.sample(42).unwrap().as_str(),
            "http://agent.example.com/sample?at=42"
        );
    }

    #[test]
    fn rejects_unparseable_base() {
        let err = AgentEndpoints::new("not a url", SampleUrlStyle::Normalized).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn style_parses_from_config_strings() {
        assert_eq!("legacy".parse::<SampleUrlStyle>().unwrap(), SampleUrlStyle::Legacy);
        assert_eq!(SampleUrlStyle::Normalized.to_string(), "normalized");
    }
}
