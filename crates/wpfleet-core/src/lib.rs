//! Fleet reconciliation and bulk update orchestration for managed sites.
//!
//! This crate owns the domain model and the business logic of the wpfleet
//! workspace. The remote sites are reached only through the
//! [`RemoteSite`] capability and the local cache only through
//! [`InventoryStore`]:
//!
//! - **[`FleetSyncEngine`]**: Full-fleet health + inventory refresh. Each
//!   site runs as its own task; failures and panics are captured per site
//!   into a [`FleetSyncSummary`].
//!
//! - **[`BulkUpdateOrchestrator`]**: Applies a batch of
//!   [`UpdateRequest`]s. Site-groups run in bounded batches, updates within
//!   a site run sequentially, and each group ends with a reconciliation
//!   re-read of the site's inventory.
//!
//! - **Pure scorers**: [`health::score`], [`priority::prioritize`], and the
//!   [`schedule`] functions. No I/O, `now` passed in.
//!
//! - **[`MemoryStore`]**: `DashMap`-backed [`InventoryStore`] whose
//!   per-site inventory replace is a single atomic swap, serializable via
//!   [`StoreSnapshot`].

pub mod config;
pub mod convert;
pub mod error;
pub mod health;
pub mod model;
pub mod orchestrator;
pub mod priority;
pub mod rate_limit;
pub mod remote;
pub mod schedule;
pub mod store;
pub mod sync;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{FleetConfig, NotificationPolicy, RateLimitConfig, TlsVerification};
pub use error::CoreError;
pub use health::{HealthGrade, SiteHealthView};
pub use orchestrator::BulkUpdateOrchestrator;
pub use priority::{PrioritizedUpdate, Priority};
pub use rate_limit::RateLimiter;
pub use remote::{CredentialCipher, HttpConnector, RemoteSite, SiteAccess, SiteConnector};
pub use store::{InventoryStore, MemoryStore, StoreSnapshot};
pub use sync::{FleetSyncEngine, FleetSyncSummary, SiteSyncOutcome, SiteSyncStatus};

pub use model::{
    InventoryItem, ItemKind, Notification, NotificationKind, PendingUpdate, Severity, Site,
    SiteId, SiteStatus, UpdateBatchReport, UpdateLogEntry, UpdateRequest, UpdateResult,
    UpdateStatus, UpdateSummary,
};
