// ── Inventory store ──
//
// The only shared mutable resource. Engines write a site's rows only from
// the task handling that site, so implementations need per-call atomicity,
// not cross-call locking.

mod collection;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::model::{
    InventoryItem, ItemKind, ItemPatch, Site, SiteHealthUpdate, SiteId, UpdateLogEntry,
};

pub use memory::{MemoryStore, StoreSnapshot};

/// Persistent repository of sites, their inventory, and the update log.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// All known sites, ordered by id.
    async fn list_sites(&self) -> Result<Vec<Site>, CoreError>;

    /// Batch lookup. Unknown ids are simply absent from the result.
    async fn get_sites(&self, ids: &[SiteId]) -> Result<Vec<Site>, CoreError>;

    async fn upsert_site(&self, site: Site) -> Result<(), CoreError>;

    /// Write status, `last_checked`, and any observed versions / SSL flag.
    async fn record_health(&self, id: &SiteId, update: &SiteHealthUpdate)
    -> Result<(), CoreError>;

    async fn mark_synced(&self, id: &SiteId, at: DateTime<Utc>) -> Result<(), CoreError>;

    /// Atomically swap the site's whole plugin + theme set for `items`.
    async fn replace_inventory(
        &self,
        id: &SiteId,
        items: Vec<InventoryItem>,
    ) -> Result<(), CoreError>;

    async fn inventory(&self, id: &SiteId) -> Result<Vec<InventoryItem>, CoreError>;

    /// Patch one row by (site, kind, slug). Returns `false` if no such row.
    async fn update_item(
        &self,
        id: &SiteId,
        kind: ItemKind,
        slug: &str,
        patch: &ItemPatch,
    ) -> Result<bool, CoreError>;

    async fn append_update_log(&self, entry: UpdateLogEntry) -> Result<(), CoreError>;

    /// Log entries, oldest first.
    async fn update_log(&self) -> Result<Vec<UpdateLogEntry>, CoreError>;
}
