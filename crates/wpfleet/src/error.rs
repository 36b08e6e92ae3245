//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use wpfleet_config::ConfigError;
use wpfleet_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Site access ──────────────────────────────────────────────────
    #[error("Site unreachable: {message}")]
    #[diagnostic(
        code(wpfleet::unreachable),
        help(
            "Check that the site is up and exposes the fleet REST namespace.\n\
             Try a longer --timeout, or set insecure = true for self-signed staging sites."
        )
    )]
    Unreachable { message: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(wpfleet::auth_failed),
        help(
            "Verify the site's username and application password.\n\
             Run: wpfleet config set-credential <site>"
        )
    )]
    AuthFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(wpfleet::not_found),
        help("Run: wpfleet {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Updates ──────────────────────────────────────────────────────
    #[error("{failed} of {total} updates failed")]
    #[diagnostic(
        code(wpfleet::updates_failed),
        help("Run: wpfleet log to see the failure messages")
    )]
    UpdatesFailed { failed: usize, total: usize },

    #[error("{message}")]
    #[diagnostic(code(wpfleet::core))]
    Core { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(wpfleet::validation))]
    Validation { field: String, reason: String },

    // ── Configuration / state ────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(wpfleet::config),
        help("Check the config file; `wpfleet config path` prints its location.")
    )]
    Config(#[from] ConfigError),

    #[error("Could not read fleet state at {path}: {reason}")]
    #[diagnostic(
        code(wpfleet::state),
        help("Move the file aside to start from an empty state, then run: wpfleet sync")
    )]
    State { path: String, reason: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(wpfleet::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    #[diagnostic(code(wpfleet::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    #[diagnostic(code(wpfleet::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML serialization failed: {0}")]
    #[diagnostic(code(wpfleet::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unreachable { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SiteNotFound { id } => Self::NotFound {
                resource_type: "site".into(),
                identifier: id,
                list_command: "sites list".into(),
            },
            CoreError::Validation { message } => Self::Validation {
                field: "updates".into(),
                reason: message,
            },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Credential { message } | CoreError::AuthenticationFailed { message } => {
                Self::AuthFailed { message }
            }
            CoreError::Unreachable { message } => Self::Unreachable { message },
            other => Self::Core {
                message: other.to_string(),
            },
        }
    }
}
