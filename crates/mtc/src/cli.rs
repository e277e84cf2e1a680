//! Clap derive structures for the `mtc` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// mtc -- read devices and live data from MTConnect agents
#[derive(Debug, Parser)]
#[command(
    name = "mtc",
    version,
    about = "Read devices and live data from MTConnect agents",
    long_about = "Probe an MTConnect agent for its device model, read current values,\n\
        and follow sample streams from the command line.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Agent profile to use
    #[arg(long, short = 'p', env = "MTC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Agent base URL (overrides profile)
    #[arg(long, short = 'a', env = "MTC_AGENT", global = true)]
    pub agent: Option<String>,

    /// Sample poll interval in milliseconds
    #[arg(long, short = 'i', env = "MTC_INTERVAL", global = true)]
    pub interval: Option<u64>,

    /// Request timeout in seconds
    #[arg(long, env = "MTC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Samples kept per data item
    #[arg(long, env = "MTC_BUFFER_SIZE", global = true)]
    pub buffer_size: Option<usize>,

    /// Join request paths onto the agent URL verbatim (no slash normalization)
    #[arg(long, global = true)]
    pub legacy_urls: bool,

    /// Output format [default: table, or `defaults.output` from the config]
    #[arg(long, short = 'o', env = "MTC_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

impl GlobalOpts {
    /// The selected output format, table when nothing chose one.
    pub fn output_format(&self) -> OutputFormat {
        self.output.clone().unwrap_or(OutputFormat::Table)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the agent's devices and data items
    Probe(ProbeArgs),

    /// Show the current value of every data item
    #[command(alias = "cur")]
    Current(CurrentArgs),

    /// Follow data item changes as they are sampled
    #[command(alias = "watch")]
    Stream(StreamArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Agent commands ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Only show the device with this id or name
    #[arg(long, short = 'd')]
    pub device: Option<String>,
}

#[derive(Debug, Args)]
pub struct CurrentArgs {
    /// Data item ids to show (default: all)
    pub ids: Vec<String>,
}

#[derive(Debug, Args)]
pub struct StreamArgs {
    /// Data item ids to show (default: all)
    pub ids: Vec<String>,

    /// Stop after this many batches of changes
    #[arg(long, short = 'n')]
    pub batches: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display the current resolved configuration
    Show,

    /// Create or update a profile from --agent and the other global flags
    Init {
        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Replace the profile if it already exists
        #[arg(long, short = 'f')]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
