// Wire types for the `fleet/v1` management namespace.
//
// These mirror the JSON the companion endpoint emits. Optional fields are
// defaulted so older companion versions still deserialize.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `GET /health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub online: bool,
    /// WordPress core version.
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub php_version: Option<String>,
    #[serde(default)]
    pub is_ssl: bool,
    /// `notAfter` of the certificate the site serves, RFC 3339.
    #[serde(default)]
    pub ssl_expiry: Option<DateTime<Utc>>,
}

/// Activation state reported for a plugin or theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Active,
    Inactive,
    /// Network-activated plugin on a multisite install.
    #[serde(rename = "network-active")]
    NetworkActive,
    #[serde(other)]
    Unknown,
}

impl ItemStatus {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active | Self::NetworkActive)
    }
}

/// Pending update metadata attached to an installed item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateInfo {
    pub version: String,
    #[serde(default)]
    pub security: bool,
}

/// One installed plugin or theme, as listed by `GET /plugins` or `GET /themes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledItem {
    pub slug: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub update: Option<UpdateInfo>,
    pub status: ItemStatus,
}

/// `POST /{plugins,themes}/{slug}/update` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub version: String,
}

/// Error body: `{"code": "...", "message": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
