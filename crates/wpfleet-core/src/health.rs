// ── Health scoring ──
//
// Pure, deterministic 0-100 score from what the local cache knows about a
// site. No I/O; `now` is passed in so results are reproducible.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use strum::Display;

use crate::model::{InventoryItem, ItemKind, Site, SiteId, SiteStatus};

const UNKNOWN_STATUS_PENALTY: i64 = 20;
const SSL_INVALID_PENALTY: i64 = 25;
const SSL_EXPIRING_SOON_PENALTY: i64 = 20;
const SSL_EXPIRING_PENALTY: i64 = 10;
const PER_UPDATE_PENALTY: i64 = 2;
const MAX_UPDATE_PENALTY: i64 = 30;
const NEVER_CHECKED_PENALTY: i64 = 10;
const VERY_STALE_PENALTY: i64 = 15;
const STALE_PENALTY: i64 = 5;

/// The attributes of a site the scorer and the notification builder look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteHealthView {
    pub site_id: SiteId,
    pub site_name: String,
    pub status: SiteStatus,
    pub ssl_valid: bool,
    pub ssl_expiry: Option<DateTime<Utc>>,
    pub plugin_updates: u32,
    pub theme_updates: u32,
    pub last_checked: Option<DateTime<Utc>>,
}

impl SiteHealthView {
    /// Build a view from a site and its cached inventory. Items belonging
    /// to other sites are ignored.
    pub fn from_inventory(site: &Site, items: &[InventoryItem]) -> Self {
        let pending = |kind: ItemKind| {
            let n = items
                .iter()
                .filter(|i| i.site_id == site.id && i.kind == kind && i.update_available)
                .count();
            u32::try_from(n).unwrap_or(u32::MAX)
        };
        Self {
            site_id: site.id.clone(),
            site_name: site.name.clone(),
            status: site.status,
            ssl_valid: site.ssl_valid,
            ssl_expiry: site.ssl_expiry,
            plugin_updates: pending(ItemKind::Plugin),
            theme_updates: pending(ItemKind::Theme),
            last_checked: site.last_checked,
        }
    }

    pub fn total_updates(&self) -> u64 {
        u64::from(self.plugin_updates) + u64::from(self.theme_updates)
    }
}

/// Score a site in `[0, 100]`.
///
/// An offline site scores 0 outright. Otherwise every penalty is computed
/// independently and subtracted from 100:
///
/// | condition                          | penalty              |
/// |------------------------------------|----------------------|
/// | status unknown                     | 20                   |
/// | SSL invalid                        | 25                   |
/// | SSL valid, expires in < 7 days     | 20                   |
/// | SSL valid, expires in < 30 days    | 10                   |
/// | pending plugin + theme updates     | 2 each, at most 30   |
/// | never checked                      | 10                   |
/// | checked > 168 h ago                | 15                   |
/// | checked > 24 h ago                 | 5                    |
pub fn score(view: &SiteHealthView, now: DateTime<Utc>) -> u8 {
    if view.status == SiteStatus::Offline {
        return 0;
    }

    let mut score: i64 = 100;

    if view.status == SiteStatus::Unknown {
        score -= UNKNOWN_STATUS_PENALTY;
    }

    if !view.ssl_valid {
        score -= SSL_INVALID_PENALTY;
    } else if let Some(expiry) = view.ssl_expiry {
        let left = expiry - now;
        if left < TimeDelta::days(7) {
            score -= SSL_EXPIRING_SOON_PENALTY;
        } else if left < TimeDelta::days(30) {
            score -= SSL_EXPIRING_PENALTY;
        }
    }

    let pending = i64::try_from(view.total_updates()).unwrap_or(i64::MAX);
    score -= pending.saturating_mul(PER_UPDATE_PENALTY).min(MAX_UPDATE_PENALTY);

    match view.last_checked {
        None => score -= NEVER_CHECKED_PENALTY,
        Some(at) => {
            let since = now - at;
            if since > TimeDelta::hours(168) {
                score -= VERY_STALE_PENALTY;
            } else if since > TimeDelta::hours(24) {
                score -= STALE_PENALTY;
            }
        }
    }

    u8::try_from(score.clamp(0, 100)).unwrap_or(0)
}

/// Coarse label for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HealthGrade {
    Healthy,
    Degraded,
    Critical,
}

impl HealthGrade {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => Self::Healthy,
            50..80 => Self::Degraded,
            _ => Self::Critical,
        }
    }
}
