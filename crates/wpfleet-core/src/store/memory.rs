// ── In-memory inventory store ──
//
// DashMap-backed implementation of `InventoryStore`. A site's inventory is
// held as one value, so `replace_inventory` is a single swap and readers
// never observe a mix of two snapshots. Serializable via `StoreSnapshot`
// so callers can persist it between runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::InventoryStore;
use super::collection::EntityCollection;
use crate::error::CoreError;
use crate::model::{
    InventoryItem, ItemKind, ItemPatch, Site, SiteHealthUpdate, SiteId, UpdateLogEntry,
};

/// Plain-data image of a [`MemoryStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub sites: Vec<Site>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub update_log: Vec<UpdateLogEntry>,
}

pub struct MemoryStore {
    sites: EntityCollection<Site>,
    inventory: EntityCollection<Vec<InventoryItem>>,
    update_log: Mutex<Vec<UpdateLogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            sites: EntityCollection::new(),
            inventory: EntityCollection::new(),
            update_log: Mutex::new(Vec::new()),
        }
    }

    /// Rebuild a store from a snapshot. Inventory rows whose site is not
    /// in the snapshot are dropped.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let store = Self::new();
        for site in snapshot.sites {
            store.sites.upsert(site.id.to_string(), site);
        }

        let mut by_site: indexmap::IndexMap<SiteId, Vec<InventoryItem>> =
            indexmap::IndexMap::new();
        for item in snapshot.inventory {
            by_site.entry(item.site_id.clone()).or_default().push(item);
        }
        for (site_id, items) in by_site {
            if store.sites.contains(site_id.as_str()) {
                store.inventory.upsert(site_id.as_str(), items);
            }
        }

        Self {
            update_log: Mutex::new(snapshot.update_log),
            ..store
        }
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let sites: Vec<Site> = self.sites.snapshot().iter().map(|s| (**s).clone()).collect();
        let inventory = self
            .inventory
            .snapshot()
            .iter()
            .flat_map(|items| items.iter().cloned())
            .collect();
        let update_log = self.update_log.lock().await.clone();
        StoreSnapshot {
            sites,
            inventory,
            update_log,
        }
    }

    /// Inventory version counter; bumped once per replace or row patch.
    pub fn inventory_version(&self) -> u64 {
        self.inventory.version()
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    fn require_site(&self, id: &SiteId) -> Result<(), CoreError> {
        if self.sites.contains(id.as_str()) {
            Ok(())
        } else {
            Err(CoreError::SiteNotFound { id: id.to_string() })
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn list_sites(&self) -> Result<Vec<Site>, CoreError> {
        Ok(self.sites.snapshot().iter().map(|s| (**s).clone()).collect())
    }

    async fn get_sites(&self, ids: &[SiteId]) -> Result<Vec<Site>, CoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.sites.get(id.as_str()))
            .map(|s| (*s).clone())
            .collect())
    }

    async fn upsert_site(&self, site: Site) -> Result<(), CoreError> {
        self.sites.upsert(site.id.to_string(), site);
        Ok(())
    }

    async fn record_health(
        &self,
        id: &SiteId,
        update: &SiteHealthUpdate,
    ) -> Result<(), CoreError> {
        self.sites
            .modify(id.as_str(), |site| update.apply_to(site))
            .ok_or_else(|| CoreError::SiteNotFound { id: id.to_string() })
    }

    async fn mark_synced(&self, id: &SiteId, at: DateTime<Utc>) -> Result<(), CoreError> {
        self.sites
            .modify(id.as_str(), |site| site.last_synced = Some(at))
            .ok_or_else(|| CoreError::SiteNotFound { id: id.to_string() })
    }

    async fn replace_inventory(
        &self,
        id: &SiteId,
        items: Vec<InventoryItem>,
    ) -> Result<(), CoreError> {
        self.require_site(id)?;
        if let Some(stray) = items.iter().find(|i| &i.site_id != id) {
            return Err(CoreError::Store {
                message: format!(
                    "inventory item {} belongs to site {}, not {id}",
                    stray.slug, stray.site_id
                ),
            });
        }
        self.inventory.upsert(id.as_str(), items);
        Ok(())
    }

    async fn inventory(&self, id: &SiteId) -> Result<Vec<InventoryItem>, CoreError> {
        Ok(self
            .inventory
            .get(id.as_str())
            .map(|items| (*items).clone())
            .unwrap_or_default())
    }

    async fn update_item(
        &self,
        id: &SiteId,
        kind: ItemKind,
        slug: &str,
        patch: &ItemPatch,
    ) -> Result<bool, CoreError> {
        self.require_site(id)?;
        let updated = self.inventory.modify(id.as_str(), |items| {
            match items.iter_mut().find(|i| i.kind == kind && i.slug == slug) {
                Some(item) => {
                    patch.apply_to(item);
                    true
                }
                None => false,
            }
        });
        Ok(updated.unwrap_or(false))
    }

    async fn append_update_log(&self, entry: UpdateLogEntry) -> Result<(), CoreError> {
        self.update_log.lock().await.push(entry);
        Ok(())
    }

    async fn update_log(&self) -> Result<Vec<UpdateLogEntry>, CoreError> {
        Ok(self.update_log.lock().await.clone())
    }
}
