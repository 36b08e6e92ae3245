// ── Domain model ──
//
// Canonical types shared by the sync engine, the update orchestrator, and
// the pure scorers. Remote wire shapes never leak past `convert`.

pub mod inventory;
pub mod notification;
pub mod site;
pub mod site_id;
pub mod update;

pub use inventory::{InventoryItem, ItemKind, ItemPatch};
pub use notification::{Notification, NotificationKind, Severity};
pub use site::{Site, SiteHealthUpdate, SiteStatus};
pub use site_id::SiteId;
pub use update::{
    PendingUpdate, UpdateBatchReport, UpdateLogEntry, UpdateRequest, UpdateResult, UpdateStatus,
    UpdateSummary,
};
