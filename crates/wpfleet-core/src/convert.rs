// ── API → domain conversions ──
//
// Bridges the raw wire types in `wpfleet_api::models` into the capability
// types the engines consume. Wire quirks (status strings, optional health
// fields) are absorbed here.

use wpfleet_api::models::{HealthResponse, InstalledItem, UpdateInfo, UpdateResponse};

use crate::remote::{AppliedUpdate, HealthCheck, RemoteItem, RemoteUpdate};

impl From<HealthResponse> for HealthCheck {
    fn from(h: HealthResponse) -> Self {
        Self {
            online: h.online,
            version: h.version,
            php_version: h.php_version,
            is_ssl: h.is_ssl,
            ssl_expiry: h.ssl_expiry,
        }
    }
}

impl From<UpdateInfo> for RemoteUpdate {
    fn from(u: UpdateInfo) -> Self {
        Self {
            version: u.version,
            security: u.security,
        }
    }
}

impl From<InstalledItem> for RemoteItem {
    fn from(i: InstalledItem) -> Self {
        Self {
            active: i.status.is_active(),
            slug: i.slug,
            name: i.name,
            version: i.version,
            update: i.update.map(RemoteUpdate::from),
        }
    }
}

impl From<UpdateResponse> for AppliedUpdate {
    fn from(r: UpdateResponse) -> Self {
        Self { version: r.version }
    }
}
