// ── Site domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::site_id::SiteId;

/// Last known reachability of a site.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SiteStatus {
    Online,
    Offline,
    /// Never checked, or the last check could not be completed.
    #[default]
    Unknown,
}

/// A managed remote site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    /// Human-friendly display name.
    pub name: String,
    /// Site root URL (e.g. `https://blog.example.com`).
    pub url: String,
    /// Account the application password belongs to.
    pub username: String,
    /// Encrypted credential reference. Only a `CredentialCipher` can turn
    /// this into a usable secret.
    pub credential: String,

    #[serde(default)]
    pub status: SiteStatus,
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_synced: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ssl_valid: bool,
    #[serde(default)]
    pub ssl_expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub wp_version: Option<String>,
    #[serde(default)]
    pub php_version: Option<String>,
}

impl Site {
    /// A freshly registered site that has never been checked.
    pub fn new(
        id: impl Into<SiteId>,
        name: impl Into<String>,
        url: impl Into<String>,
        username: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            username: username.into(),
            credential: credential.into(),
            status: SiteStatus::Unknown,
            last_checked: None,
            last_synced: None,
            ssl_valid: false,
            ssl_expiry: None,
            wp_version: None,
            php_version: None,
        }
    }

    /// Copy the observed (runtime) fields from `previous`, keeping this
    /// record's identity and connection settings.
    pub fn with_observed_state_of(mut self, previous: &Site) -> Self {
        self.status = previous.status;
        self.last_checked = previous.last_checked;
        self.last_synced = previous.last_synced;
        self.ssl_valid = previous.ssl_valid;
        self.ssl_expiry = previous.ssl_expiry;
        self.wp_version.clone_from(&previous.wp_version);
        self.php_version.clone_from(&previous.php_version);
        self
    }
}

/// Field-level health update written after a `check_health` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteHealthUpdate {
    pub status: SiteStatus,
    pub checked_at: DateTime<Utc>,
    /// `None` leaves the stored value untouched.
    pub wp_version: Option<String>,
    pub php_version: Option<String>,
    pub ssl_valid: Option<bool>,
    pub ssl_expiry: Option<DateTime<Utc>>,
}

impl SiteHealthUpdate {
    pub fn offline(checked_at: DateTime<Utc>) -> Self {
        Self {
            status: SiteStatus::Offline,
            checked_at,
            wp_version: None,
            php_version: None,
            ssl_valid: None,
            ssl_expiry: None,
        }
    }

    pub(crate) fn apply_to(&self, site: &mut Site) {
        site.status = self.status;
        site.last_checked = Some(self.checked_at);
        if let Some(ref v) = self.wp_version {
            site.wp_version = Some(v.clone());
        }
        if let Some(ref v) = self.php_version {
            site.php_version = Some(v.clone());
        }
        if let Some(valid) = self.ssl_valid {
            site.ssl_valid = valid;
        }
        if let Some(expiry) = self.ssl_expiry {
            site.ssl_expiry = Some(expiry);
        }
    }
}
