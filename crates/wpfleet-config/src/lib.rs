//! Configuration for wpfleet.
//!
//! TOML file + `WPFLEET_` environment overrides (via figment), credential
//! reference resolution (env + keyring + plaintext), and translation into
//! the core's `FleetConfig` and `Site` records.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use wpfleet_core::config::{
    DEFAULT_SSL_WARNING_DAYS, DEFAULT_SYNC_INTERVAL_MINUTES, DEFAULT_UPDATE_CONCURRENCY,
    DEFAULT_UPDATE_NOTIFY_THRESHOLD,
};
use wpfleet_core::{
    CoreError, CredentialCipher, FleetConfig, NotificationPolicy, RateLimitConfig, Site,
    TlsVerification,
};

/// Service name under which credentials live in the system keyring.
pub const KEYRING_SERVICE: &str = "wpfleet";

const ENV_PREFIX: &str = "WPFLEET_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("credential '{reference}' could not be resolved: {reason}")]
    Credential { reference: String, reason: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

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
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    /// Managed sites, keyed by site id.
    #[serde(default)]
    pub sites: BTreeMap<String, SiteEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Accept self-signed certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Custom CA certificate for all sites.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default = "default_update_concurrency")]
    pub update_concurrency: usize,

    #[serde(default = "default_sync_interval")]
    pub sync_interval_minutes: u64,

    #[serde(default = "default_notify_threshold")]
    pub update_notify_threshold: u32,

    #[serde(default = "default_ssl_warning_days")]
    pub ssl_warning_days: i64,

    /// Update calls per second; 0 disables throttling.
    #[serde(default)]
    pub rate_limit_per_second: f64,

    #[serde(default = "default_rate_limit_burst")]
    pub rate_limit_burst: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
            update_concurrency: default_update_concurrency(),
            sync_interval_minutes: default_sync_interval(),
            update_notify_threshold: default_notify_threshold(),
            ssl_warning_days: default_ssl_warning_days(),
            rate_limit_per_second: 0.0,
            rate_limit_burst: default_rate_limit_burst(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_update_concurrency() -> usize {
    DEFAULT_UPDATE_CONCURRENCY
}
fn default_sync_interval() -> u64 {
    DEFAULT_SYNC_INTERVAL_MINUTES
}
fn default_notify_threshold() -> u32 {
    DEFAULT_UPDATE_NOTIFY_THRESHOLD
}
fn default_ssl_warning_days() -> i64 {
    DEFAULT_SSL_WARNING_DAYS
}
fn default_rate_limit_burst() -> u32 {
    5
}

/// One managed site.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteEntry {
    /// Display name; defaults to the site id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Site root URL (e.g. "https://blog.example.com").
    pub url: String,

    /// Account the application password belongs to.
    pub username: String,

    /// Credential reference: `env:VAR`, `keyring:NAME`, or a plaintext
    /// application password. Defaults to `keyring:<site id>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl Config {
    /// Core runtime configuration from `[defaults]`.
    pub fn fleet_config(&self) -> Result<FleetConfig, ConfigError> {
        let d = &self.defaults;
        if d.update_concurrency == 0 {
            return Err(ConfigError::Validation {
                field: "update_concurrency".into(),
                reason: "must be at least 1".into(),
            });
        }
        if !d.rate_limit_per_second.is_finite() || d.rate_limit_per_second < 0.0 {
            return Err(ConfigError::Validation {
                field: "rate_limit_per_second".into(),
                reason: "must be a finite, non-negative number".into(),
            });
        }

        let tls = if d.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca) = d.ca_cert {
            TlsVerification::CustomCa(ca.clone())
        } else {
            TlsVerification::SystemDefaults
        };

        let rate_limit = (d.rate_limit_per_second > 0.0).then_some(RateLimitConfig {
            per_second: d.rate_limit_per_second,
            burst: d.rate_limit_burst,
        });

        Ok(FleetConfig {
            update_concurrency: d.update_concurrency,
            sync_interval_minutes: d.sync_interval_minutes,
            notifications: NotificationPolicy {
                update_threshold: d.update_notify_threshold,
                ssl_warning_days: d.ssl_warning_days,
            },
            request_timeout: Duration::from_secs(d.timeout),
            tls,
            rate_limit,
        })
    }

    /// `Site` records for every `[sites.*]` entry, ordered by id. Runtime
    /// state (status, timestamps) starts empty.
    pub fn site_definitions(&self) -> Result<Vec<Site>, ConfigError> {
        self.sites
            .iter()
            .map(|(id, entry)| {
                if id.trim().is_empty() {
                    return Err(ConfigError::Validation {
                        field: "sites".into(),
                        reason: "site id must not be empty".into(),
                    });
                }
                let url: url::Url = entry.url.parse().map_err(|_| ConfigError::Validation {
                    field: format!("sites.{id}.url"),
                    reason: format!("invalid URL: {}", entry.url),
                })?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(ConfigError::Validation {
                        field: format!("sites.{id}.url"),
                        reason: format!("unsupported scheme '{}'", url.scheme()),
                    });
                }
                let credential = entry
                    .credential
                    .clone()
                    .unwrap_or_else(|| format!("keyring:{id}"));
                Ok(Site::new(
                    id.as_str(),
                    entry.name.clone().unwrap_or_else(|| id.clone()),
                    entry.url.trim_end_matches('/'),
                    entry.username.clone(),
                    credential,
                ))
            })
            .collect()
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "wpfleet", "wpfleet")
}

fn dirs_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("wpfleet");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the fleet state file (sites, inventory, log).
pub fn state_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share").join("state.json"),
        |dirs| dirs.data_dir().join("state.json"),
    )
}

// ── Config loading / saving ─────────────────────────────────────────

/// Load the config from `path` merged with the environment.
///
/// A missing file yields the defaults. Environment keys use `__` as the
/// nesting separator, e.g. `WPFLEET_DEFAULTS__TIMEOUT=10`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), sites = config.sites.len(), "config loaded");
    Ok(config)
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credentials ─────────────────────────────────────────────────────

/// How a credential reference should be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource<'a> {
    Env(&'a str),
    Keyring(&'a str),
    Plaintext(&'a str),
}

impl<'a> CredentialSource<'a> {
    pub fn parse(reference: &'a str) -> Self {
        if let Some(var) = reference.strip_prefix("env:") {
            Self::Env(var)
        } else if let Some(name) = reference.strip_prefix("keyring:") {
            Self::Keyring(name)
        } else if let Some(value) = reference.strip_prefix("plain:") {
            Self::Plaintext(value)
        } else {
            Self::Plaintext(reference)
        }
    }
}

/// Resolve a credential reference to the application password.
pub fn resolve_credential(reference: &str) -> Result<SecretString, ConfigError> {
    let fail = |reason: String| ConfigError::Credential {
        reference: redact(reference),
        reason,
    };
    match CredentialSource::parse(reference) {
        CredentialSource::Env(var) => std::env::var(var)
            .map(SecretString::from)
            .map_err(|_| fail(format!("environment variable {var} is not set"))),
        CredentialSource::Keyring(name) => {
            let entry = keyring::Entry::new(KEYRING_SERVICE, name)?;
            entry
                .get_password()
                .map(SecretString::from)
                .map_err(|e| fail(e.to_string()))
        }
        CredentialSource::Plaintext(value) if value.is_empty() => {
            Err(fail("empty credential".into()))
        }
        CredentialSource::Plaintext(value) => Ok(SecretString::from(value.to_owned())),
    }
}

/// Store `secret` in the system keyring under `name`, returning the
/// reference to put in the config.
pub fn store_keyring_credential(name: &str, secret: &SecretString) -> Result<String, ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, name)?;
    entry.set_password(secret.expose_secret())?;
    Ok(format!("keyring:{name}"))
}

/// References are safe to print, plaintext credentials are not.
fn redact(reference: &str) -> String {
    match CredentialSource::parse(reference) {
        CredentialSource::Plaintext(_) => "<plaintext>".into(),
        CredentialSource::Env(_) | CredentialSource::Keyring(_) => reference.into(),
    }
}

/// [`CredentialCipher`] backed by env / keyring / plaintext references.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialResolver;

impl CredentialCipher for CredentialResolver {
    fn decrypt(&self, ciphertext: &str) -> Result<SecretString, CoreError> {
        resolve_credential(ciphertext).map_err(|e| CoreError::Credential {
            message: e.to_string(),
        })
    }
}
