// ── Plugin / theme inventory ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::site_id::SiteId;

/// Which half of a site's inventory an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemKind {
    Plugin,
    Theme,
}

/// One installed plugin or theme, as cached locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub site_id: SiteId,
    pub kind: ItemKind,
    /// Stable identifier on the remote site.
    pub slug: String,
    pub name: String,
    /// Installed version.
    pub version: String,
    pub update_available: bool,
    pub new_version: Option<String>,
    pub is_active: bool,
    /// The pending update was flagged as a security release.
    #[serde(default)]
    pub security_update: bool,
}

/// Field-level update of one inventory row. `None` fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub version: Option<String>,
    pub update_available: Option<bool>,
    /// `Some(None)` clears the stored new version.
    pub new_version: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub security_update: Option<bool>,
}

impl ItemPatch {
    /// Patch recorded after a successful update to `version`.
    pub fn updated_to(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            update_available: Some(false),
            new_version: Some(None),
            is_active: None,
            security_update: Some(false),
        }
    }

    /// Patch that overwrites every remotely observed field with `item`'s.
    pub fn observed(item: &InventoryItem) -> Self {
        Self {
            version: Some(item.version.clone()),
            update_available: Some(item.update_available),
            new_version: Some(item.new_version.clone()),
            is_active: Some(item.is_active),
            security_update: Some(item.security_update),
        }
    }

    pub(crate) fn apply_to(&self, item: &mut InventoryItem) {
        if let Some(ref v) = self.version {
            item.version.clone_from(v);
        }
        if let Some(flag) = self.update_available {
            item.update_available = flag;
        }
        if let Some(ref v) = self.new_version {
            item.new_version.clone_from(v);
        }
        if let Some(flag) = self.is_active {
            item.is_active = flag;
        }
        if let Some(flag) = self.security_update {
            item.security_update = flag;
        }
    }
}
