// ── Fleet sync engine ──
//
// Full-fleet health + inventory refresh. Every site runs as its own task
// and its outcome is captured, never propagated: a slow, broken, or
// panicking site cannot disturb any other site or the summary.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{InventoryItem, ItemKind, Site, SiteHealthUpdate, SiteId, SiteStatus};
use crate::remote::{HealthCheck, RemoteSite, SiteAccess};
use crate::store::InventoryStore;

// ── Outcomes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SiteSyncStatus {
    /// Health recorded and inventory replaced.
    Synced { plugins: usize, themes: usize },
    /// Site reported (or was assumed) offline; inventory left as is.
    Offline,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteSyncOutcome {
    pub site_id: SiteId,
    pub site_name: String,
    #[serde(flatten)]
    pub status: SiteSyncStatus,
}

impl SiteSyncOutcome {
    fn new(site: &Site, status: SiteSyncStatus) -> Self {
        Self {
            site_id: site.id.clone(),
            site_name: site.name.clone(),
            status,
        }
    }

    fn failed(site_id: SiteId, site_name: String, reason: impl Into<String>) -> Self {
        Self {
            site_id,
            site_name,
            status: SiteSyncStatus::Failed {
                reason: reason.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FleetSyncSummary {
    pub total: usize,
    pub synced: usize,
    pub offline: usize,
    pub failed: usize,
    /// One entry per site, ordered by site id.
    pub outcomes: Vec<SiteSyncOutcome>,
}

impl FleetSyncSummary {
    fn from_outcomes(mut outcomes: Vec<SiteSyncOutcome>) -> Self {
        outcomes.sort_by(|a, b| a.site_id.cmp(&b.site_id));
        let mut summary = Self {
            total: outcomes.len(),
            ..Self::default()
        };
        for outcome in &outcomes {
            match outcome.status {
                SiteSyncStatus::Synced { .. } => summary.synced += 1,
                SiteSyncStatus::Offline => summary.offline += 1,
                SiteSyncStatus::Failed { .. } => summary.failed += 1,
            }
        }
        summary.outcomes = outcomes;
        summary
    }
}

// ── Engine ───────────────────────────────────────────────────────────

/// Refreshes site health and inventory from the remote sites.
///
/// Cheap to clone; clones share the store, connector, and cancellation
/// token.
#[derive(Clone)]
pub struct FleetSyncEngine {
    store: Arc<dyn InventoryStore>,
    access: SiteAccess,
    cancel: CancellationToken,
}

impl FleetSyncEngine {
    pub fn new(store: Arc<dyn InventoryStore>, access: SiteAccess) -> Self {
        Self {
            store,
            access,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop launching site tasks once `cancel` fires. Sites already in
    /// flight run to completion.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Sync every known site concurrently. Never fails: store or remote
    /// errors surface as per-site `Failed` outcomes.
    pub async fn sync_all(&self) -> FleetSyncSummary {
        let sites = match self.store.list_sites().await {
            Ok(sites) => sites,
            Err(e) => {
                warn!(error = %e, "could not list sites, nothing synced");
                return FleetSyncSummary::default();
            }
        };

        let mut outcomes = Vec::with_capacity(sites.len());
        let mut tasks = JoinSet::new();
        let mut launched: HashMap<tokio::task::Id, (SiteId, String)> = HashMap::new();

        for site in sites {
            if self.cancel.is_cancelled() {
                outcomes.push(SiteSyncOutcome::failed(site.id, site.name, "cancelled"));
                continue;
            }
            let key = (site.id.clone(), site.name.clone());
            let engine = self.clone();
            let handle = tasks.spawn(async move { engine.sync_one(&site).await });
            launched.insert(handle.id(), key);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, outcome)) => outcomes.push(outcome),
                Err(e) => {
                    let Some((site_id, site_name)) = launched.remove(&e.id()) else {
                        continue;
                    };
                    warn!(site = %site_id, error = %e, "site sync task aborted");
                    outcomes.push(SiteSyncOutcome::failed(
                        site_id,
                        site_name,
                        format!("sync task aborted: {e}"),
                    ));
                }
            }
        }

        let summary = FleetSyncSummary::from_outcomes(outcomes);
        info!(
            total = summary.total,
            synced = summary.synced,
            offline = summary.offline,
            failed = summary.failed,
            "fleet sync complete"
        );
        summary
    }

    /// Sync a single site by id.
    pub async fn sync_site(&self, id: &SiteId) -> Result<SiteSyncOutcome, CoreError> {
        let site = self
            .store
            .get_sites(std::slice::from_ref(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::SiteNotFound { id: id.to_string() })?;
        Ok(self.sync_one(&site).await)
    }

    async fn sync_one(&self, site: &Site) -> SiteSyncOutcome {
        let status = match self.access.open(site) {
            Ok(remote) => match self.refresh(site, remote.as_ref()).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(site = %site.id, error = %e, "site sync failed");
                    SiteSyncStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            },
            Err(e) => {
                warn!(site = %site.id, error = %e, "cannot open site");
                SiteSyncStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };
        SiteSyncOutcome::new(site, status)
    }

    async fn refresh(
        &self,
        site: &Site,
        remote: &dyn RemoteSite,
    ) -> Result<SiteSyncStatus, CoreError> {
        let health = remote.check_health().await.unwrap_or_else(|e| {
            debug!(site = %site.id, error = %e, "health check failed, treating as offline");
            HealthCheck::offline()
        });

        let checked_at = Utc::now();
        let update = if health.online {
            SiteHealthUpdate {
                status: SiteStatus::Online,
                checked_at,
                wp_version: health.version,
                php_version: health.php_version,
                ssl_valid: Some(health.is_ssl),
                ssl_expiry: health.ssl_expiry,
            }
        } else {
            SiteHealthUpdate::offline(checked_at)
        };
        self.store.record_health(&site.id, &update).await?;

        if update.status != SiteStatus::Online {
            debug!(site = %site.id, "offline, inventory left untouched");
            return Ok(SiteSyncStatus::Offline);
        }

        let (plugins, themes) = tokio::join!(remote.list_plugins(), remote.list_themes());
        let (plugins, themes) = (plugins?, themes?);
        let counts = (plugins.len(), themes.len());

        let items: Vec<InventoryItem> = plugins
            .into_iter()
            .map(|p| p.into_inventory_item(&site.id, ItemKind::Plugin))
            .chain(
                themes
                    .into_iter()
                    .map(|t| t.into_inventory_item(&site.id, ItemKind::Theme)),
            )
            .collect();
        self.store.replace_inventory(&site.id, items).await?;
        self.store.mark_synced(&site.id, Utc::now()).await?;

        debug!(site = %site.id, plugins = counts.0, themes = counts.1, "inventory replaced");
        Ok(SiteSyncStatus::Synced {
            plugins: counts.0,
            themes: counts.1,
        })
    }
}
