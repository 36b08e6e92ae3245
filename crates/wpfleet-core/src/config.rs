// ── Runtime fleet configuration ──
//
// These types describe *how* the engines talk to the fleet and where the
// notification thresholds sit. They never touch disk: wpfleet-config
// builds a `FleetConfig` from TOML + env and hands it in.

use std::time::Duration;

/// Site-groups in flight at once during a bulk update.
pub const DEFAULT_UPDATE_CONCURRENCY: usize = 3;
/// Minutes after which a site is due for another sync.
pub const DEFAULT_SYNC_INTERVAL_MINUTES: u64 = 60;
/// Pending updates (plugins + themes) a site may carry before an
/// `updates_available` notification fires. Strictly greater triggers.
pub const DEFAULT_UPDATE_NOTIFY_THRESHOLD: u32 = 5;
/// Days before certificate expiry at which `ssl_expiring` fires.
pub const DEFAULT_SSL_WARNING_DAYS: i64 = 7;
/// Per-request timeout for remote calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// TLS verification strategy for outbound site connections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (staging sites with self-signed certs).
    DangerAcceptInvalid,
}

/// Optional outbound throttle for mutating calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    /// Tokens added per second.
    pub per_second: f64,
    /// Largest burst; zero is treated as one.
    pub burst: u32,
}

/// Thresholds for [`build_notifications`](crate::schedule::build_notifications).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationPolicy {
    pub update_threshold: u32,
    pub ssl_warning_days: i64,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            update_threshold: DEFAULT_UPDATE_NOTIFY_THRESHOLD,
            ssl_warning_days: DEFAULT_SSL_WARNING_DAYS,
        }
    }
}

/// Everything the engines need to run against a fleet.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetConfig {
    pub update_concurrency: usize,
    pub sync_interval_minutes: u64,
    pub notifications: NotificationPolicy,
    pub request_timeout: Duration,
    pub tls: TlsVerification,
    /// `None` disables throttling.
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            update_concurrency: DEFAULT_UPDATE_CONCURRENCY,
            sync_interval_minutes: DEFAULT_SYNC_INTERVAL_MINUTES,
            notifications: NotificationPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            tls: TlsVerification::default(),
            rate_limit: None,
        }
    }
}
