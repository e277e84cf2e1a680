//! CLI configuration: flag overrides on top of `mtc_config` profiles.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--agent, --interval, etc.).

use clap::ValueEnum;
use mtc_core::{ClientConfig, DEFAULT_AGENT_URL, SampleUrlStyle};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use mtc_config::{Config, ConfigError, Profile, config_path, load_config, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// The profile the flags select, with every flag override applied.
///
/// With no matching profile (and no `--profile`), `--agent` or the public
/// demo agent is used.
pub fn effective_profile(global: &GlobalOpts, config: &Config) -> Result<Profile, CliError> {
    let mut profile = match config.profile(global.profile.as_deref()) {
        Ok(Some((_, profile))) => profile.clone(),
        Ok(None) => Profile::new(DEFAULT_AGENT_URL),
        Err(ConfigError::UnknownProfile { name }) => {
            let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
            names.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(ref agent) = global.agent {
        profile.agent.clone_from(agent);
    }
    if global.interval.is_some() {
        profile.interval_ms = global.interval;
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
    if global.buffer_size.is_some() {
        profile.buffer_size = global.buffer_size;
    }
    if global.legacy_urls {
        profile.url_style = Some(SampleUrlStyle::Legacy);
    }
    Ok(profile)
}

/// The output format named by `defaults.output` in the config file.
pub fn configured_output(config: &Config) -> Result<OutputFormat, CliError> {
    OutputFormat::from_str(&config.defaults.output, true).map_err(|_| CliError::Validation {
        field: "defaults.output".into(),
        reason: format!(
            "unknown output format '{}' (expected table, json, json-compact, yaml, or plain)",
            config.defaults.output
        ),
    })
}

/// Build a `ClientConfig` from the config file, profile, and CLI overrides.
pub fn resolve_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let config = load_config()?;
    let profile = effective_profile(global, &config)?;
    tracing::debug!(
        profile = %active_profile_name(global, &config),
        agent = %profile.agent,
        "resolved agent configuration"
    );
    Ok(profile.to_client_config(&config.defaults)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn configured_output_accepts_any_case() {
        let mut config = Config::default();
        config.defaults.output = "JSON-Compact".into();
        assert!(matches!(
            configured_output(&config).unwrap(),
            OutputFormat::JsonCompact
        ));
    }

    #[test]
    fn configured_output_rejects_unknown_format() {
        let mut config = Config::default();
        config.defaults.output = "xml".into();
        let err = configured_output(&config).unwrap_err();
        assert!(matches!(
            err,
            CliError::Validation { ref field, .. } if field == "defaults.output"
        ));
    }
}
