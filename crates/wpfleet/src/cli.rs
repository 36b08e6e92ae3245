//! Clap derive structures for the `wpfleet` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::warn;

use wpfleet_config::Defaults;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// wpfleet -- keep a fleet of WordPress sites synced and up to date
#[derive(Debug, Parser)]
#[command(
    name = "wpfleet",
    version,
    about = "Sync and update a fleet of WordPress sites",
    long_about = "Keeps a local cache of every managed site's health and plugin/theme\n\
        inventory, and applies updates across the fleet with per-site failure isolation.",
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
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "WPFLEET_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Fleet state file (defaults to the platform data dir)
    #[arg(long, env = "WPFLEET_STATE", global = true)]
    pub state: Option<PathBuf>,

    /// Output format [default: table, or `output` from the config file]
    #[arg(long, short = 'o', env = "WPFLEET_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: auto, or `color` from the config file]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Diagnostic log format on stderr
    #[arg(long, env = "WPFLEET_LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Per-request timeout, e.g. "10s" or "1m" (overrides the config file)
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,
}

impl GlobalOpts {
    pub fn format(&self) -> OutputFormat {
        self.output.unwrap_or(OutputFormat::Table)
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color.unwrap_or(ColorMode::Auto)
    }

    /// Fill unset `--output` / `--color` from the config file's `[defaults]`.
    pub fn apply_defaults(&mut self, defaults: &Defaults) {
        if self.output.is_none() {
            self.output = parse_default("output", &defaults.output);
        }
        if self.color.is_none() {
            self.color = parse_default("color", &defaults.color);
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(wpfleet_config::config_path)
    }

    pub fn state_path(&self) -> PathBuf {
        self.state.clone().unwrap_or_else(wpfleet_config::state_path)
    }
}

fn parse_default<T: ValueEnum>(key: &str, value: &str) -> Option<T> {
    let parsed = T::from_str(value, true).ok();
    if parsed.is_none() {
        warn!(key, value, "ignoring unrecognised config default");
    }
    parsed
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
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

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event (for log shippers)
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Refresh health and plugin/theme inventory from the fleet
    Sync(SyncArgs),

    /// Inspect managed sites
    Sites(SitesArgs),

    /// List and apply pending plugin/theme updates
    #[command(alias = "up")]
    Updates(UpdatesArgs),

    /// List sites due for another sync
    Due(DueArgs),

    /// Show fleet notifications (offline sites, pending updates, SSL expiry)
    #[command(alias = "notes")]
    Notifications,

    /// Show the update log, newest first
    Log(LogArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SYNC
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Sync a single site instead of the whole fleet
    #[arg(long, short = 's')]
    pub site: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SITES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SitesArgs {
    #[command(subcommand)]
    pub command: SitesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SitesCommand {
    /// List sites with status, health score, and pending updates
    #[command(alias = "ls")]
    List,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  UPDATES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct UpdatesArgs {
    #[command(subcommand)]
    pub command: UpdatesCommand,
}

#[derive(Debug, Subcommand)]
pub enum UpdatesCommand {
    /// List pending updates, highest priority first
    #[command(alias = "ls")]
    List {
        /// Only this site
        #[arg(long, short = 's')]
        site: Option<String>,
    },

    /// Apply updates across the fleet
    Apply(ApplyArgs),
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Target site (required with --plugin / --theme)
    #[arg(long, short = 's')]
    pub site: Option<String>,

    /// Plugin slug to update (repeatable)
    #[arg(long = "plugin", value_name = "SLUG")]
    pub plugins: Vec<String>,

    /// Theme slug to update (repeatable)
    #[arg(long = "theme", value_name = "SLUG")]
    pub themes: Vec<String>,

    /// Apply every pending update (limited to --site when given)
    #[arg(long, conflicts_with_all = ["plugins", "themes"])]
    pub all: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SCHEDULE / LOG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DueArgs {
    /// Sync interval in minutes (overrides the config file)
    #[arg(long)]
    pub interval: Option<u64>,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Show at most this many entries
    #[arg(long, short = 'n', default_value = "50")]
    pub limit: usize,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display the resolved configuration (secrets masked)
    Show,

    /// Store a site's application password in the system keyring
    SetCredential {
        /// Site id (the key of its [sites.*] table)
        site: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
