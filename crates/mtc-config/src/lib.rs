//! Shared configuration for MTConnect tools.
//!
//! TOML agent profiles, `MTC_` environment overrides, and translation to
//! `mtc_core::ClientConfig`. The CLI layers its flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mtc_core::{ClientConfig, DEFAULT_BUFFER_SIZE, DEFAULT_UPDATE_INTERVAL, SampleUrlStyle};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named agent profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    ///
    /// Returns `Ok(None)` when no name was given and no default profile
    /// exists in the file.
    pub fn profile(&self, name: Option<&str>) -> Result<Option<(&str, &Profile)>, ConfigError> {
        if let Some(name) = name {
            return self
                .profiles
                .get_key_value(name)
                .map(|(k, p)| Some((k.as_str(), p)))
                .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() });
        }

        Ok(self
            .default_profile
            .as_deref()
            .and_then(|name| self.profiles.get_key_value(name))
            .map(|(k, p)| (k.as_str(), p)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Sample poll interval in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// History capacity per data item.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    #[serde(default)]
    pub url_style: SampleUrlStyle,

    /// CLI output format when `--output` is not given: "table", "json",
    /// "json-compact", "yaml", or "plain".
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            timeout: default_timeout(),
            buffer_size: default_buffer_size(),
            url_style: SampleUrlStyle::default(),
            output: default_output(),
        }
    }
}

fn default_interval_ms() -> u64 {
    u64::try_from(DEFAULT_UPDATE_INTERVAL.as_millis()).unwrap_or(2000)
}
fn default_timeout() -> u64 {
    30
}
fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}
fn default_output() -> String {
    "table".into()
}

/// A named agent profile. Unset fields fall back to [`Defaults`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Agent base URL (e.g., "http://agent.mtconnect.org/").
    pub agent: String,

    pub interval_ms: Option<u64>,

    pub timeout: Option<u64>,

    pub buffer_size: Option<usize>,

    pub url_style: Option<SampleUrlStyle>,
}

impl Profile {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            interval_ms: None,
            timeout: None,
            buffer_size: None,
            url_style: None,
        }
    }

    /// Build a validated `ClientConfig`, filling gaps from `defaults`.
    pub fn to_client_config(&self, defaults: &Defaults) -> Result<ClientConfig, ConfigError> {
        url::Url::parse(&self.agent).map_err(|e| ConfigError::Validation {
            field: "agent".into(),
            reason: format!("invalid URL '{}': {e}", self.agent),
        })?;

        let buffer_size = self.buffer_size.unwrap_or(defaults.buffer_size);
        if buffer_size == 0 {
            return Err(ConfigError::Validation {
                field: "buffer_size".into(),
                reason: "must be at least 1".into(),
            });
        }

        let interval_ms = self.interval_ms.unwrap_or(defaults.interval_ms);
        if interval_ms == 0 {
            return Err(ConfigError::Validation {
                field: "interval_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }

        Ok(ClientConfig {
            agent_url: self.agent.clone(),
            update_interval: Duration::from_millis(interval_ms),
            default_buffer_size: buffer_size,
            sample_url_style: self.url_style.unwrap_or(defaults.url_style),
            timeout: Duration::from_secs(self.timeout.unwrap_or(defaults.timeout)),
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "mtc", "mtc").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("mtc");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment.
///
/// A missing file is not an error; nested keys come from `MTC_` variables
/// split on `__` (e.g. `MTC_DEFAULTS__INTERVAL_MS=500`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MTC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.defaults.interval_ms, 2000);
        assert_eq!(config.defaults.buffer_size, DEFAULT_BUFFER_SIZE);
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn profile_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "shop"

[defaults]
interval_ms = 1000
buffer_size = 50

[profiles.shop]
agent = "http://10.0.0.5:5000/"
buffer_size = 500
url_style = "legacy"
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        let (name, profile) = config.profile(None).unwrap().unwrap();
        let client = profile.to_client_config(&config.defaults).unwrap();

        assert_eq!(name, "shop");
        assert_eq!(client.agent_url, "http://10.0.0.5:5000/");
        assert_eq!(client.update_interval, Duration::from_millis(1000));
        assert_eq!(client.default_buffer_size, 500);
        assert_eq!(client.sample_url_style, SampleUrlStyle::Legacy);
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn unknown_named_profile_is_an_error() {
        let err = Config::default().profile(Some("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile { .. }));
        assert!(Config::default().profile(None).unwrap().is_none());
    }

    #[test]
    fn invalid_agent_url_fails_validation() {
        let err = Profile::new("not a url")
            .to_client_config(&Defaults::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "agent"));
    }

    #[test]
    fn zero_buffer_size_fails_validation() {
        let mut profile = Profile::new("http://agent.mtconnect.org/");
        profile.buffer_size = Some(0);
        assert!(profile.to_client_config(&Defaults::default()).is_err());
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config
            .profiles
            .insert("default".into(), Profile::new("http://agent.mtconnect.org/"));

        save_config_to(&config, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.profiles, config.profiles);
        assert_eq!(loaded.default_profile.as_deref(), Some("default"));
    }
}
