// ── Derived fleet notifications ──

use serde::{Deserialize, Serialize};
use strum::Display;

use super::site_id::SiteId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    Offline,
    UpdatesAvailable,
    SslExpiring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
}

/// Not persisted; rebuilt from fleet state on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub site_id: SiteId,
    pub site_name: String,
    pub kind: NotificationKind,
    pub severity: Severity,
    pub message: String,
}
