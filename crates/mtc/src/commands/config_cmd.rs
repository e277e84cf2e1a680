//! Config subcommand handlers.

use mtc_core::DEFAULT_AGENT_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Profile};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let active = config::active_profile_name(global, &cfg);
            let out = output::render_single(&global.output_format(), &cfg, |cfg| {
                let mut text = format!("# active profile: {active}\n");
                text.push_str(&toml::to_string_pretty(cfg)?);
                Ok(text)
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init { name, force } => {
            let mut cfg = config::load_config()?;
            if cfg.profiles.contains_key(&name) && !force {
                return Err(CliError::Validation {
                    field: "name".into(),
                    reason: format!("profile '{name}' already exists (use --force to replace it)"),
                });
            }

            let profile = profile_from_flags(global);
            // Validate before writing anything.
            profile.to_client_config(&cfg.defaults)?;

            cfg.profiles.insert(name.clone(), profile);
            if cfg.default_profile.as_deref().is_none_or(|d| !cfg.profiles.contains_key(d)) {
                cfg.default_profile = Some(name.clone());
            }

            let path = config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Profile '{name}' written to {}", path.display());
            }
            if matches!(global.output_format(), OutputFormat::Json | OutputFormat::JsonCompact) {
                output::print_output(&serde_json::to_string(&cfg.profiles[&name])?, global.quiet);
            }
            Ok(())
        }
    }
}

/// A new profile holding only the values given on the command line.
fn profile_from_flags(global: &GlobalOpts) -> Profile {
    let mut profile = Profile::new(global.agent.as_deref().unwrap_or(DEFAULT_AGENT_URL));
    profile.interval_ms = global.interval;
    profile.timeout = global.timeout;
    profile.buffer_size = global.buffer_size;
    if global.legacy_urls {
        profile.url_style = Some(mtc_core::SampleUrlStyle::Legacy);
    }
    profile
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;
    use crate::config::Config;

    #[test]
    fn init_profile_takes_global_flags() {
        let cli = Cli::parse_from([
            "mtc",
            "--agent",
            "http://10.0.0.5:5000/",
            "--interval",
            "500",
            "--legacy-urls",
            "config",
            "init",
        ]);
        let profile = profile_from_flags(&cli.global);

        assert_eq!(profile.agent, "http://10.0.0.5:5000/");
        assert_eq!(profile.interval_ms, Some(500));
        assert_eq!(profile.timeout, None);
        assert_eq!(profile.url_style, Some(mtc_core::SampleUrlStyle::Legacy));
    }

    #[test]
    fn empty_config_shows_as_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(text.contains("[defaults]"));
    }
}
