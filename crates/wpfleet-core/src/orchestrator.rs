// ── Bulk update orchestrator ──
//
// Applies a batch of plugin/theme updates across the fleet. Site-groups
// run in batches of `concurrency`; inside a group, updates go out one at a
// time in request order, followed by a reconciliation re-read of the
// site's inventory. Every request gets exactly one result.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_UPDATE_CONCURRENCY, FleetConfig};
use crate::error::CoreError;
use crate::model::{
    ItemKind, ItemPatch, Site, SiteId, UpdateBatchReport, UpdateLogEntry, UpdateRequest,
    UpdateResult,
};
use crate::rate_limit::RateLimiter;
use crate::remote::{AppliedUpdate, RemoteSite, SiteAccess};
use crate::store::InventoryStore;

const SITE_NOT_FOUND: &str = "Site not found";
const CANCELLED: &str = "Cancelled before dispatch";

/// Finished results, keyed by input position.
type Settled = mpsc::UnboundedSender<(usize, UpdateResult)>;

/// Requests for one site, each tagged with its position in the input.
struct SiteGroup {
    site: Site,
    items: Vec<(usize, UpdateRequest)>,
}

pub struct BulkUpdateOrchestrator {
    runner: GroupRunner,
    concurrency: usize,
    cancel: CancellationToken,
}

impl BulkUpdateOrchestrator {
    pub fn new(store: Arc<dyn InventoryStore>, access: SiteAccess) -> Self {
        Self {
            runner: GroupRunner {
                store,
                access,
                rate_limiter: None,
            },
            concurrency: DEFAULT_UPDATE_CONCURRENCY,
            cancel: CancellationToken::new(),
        }
    }

    /// Orchestrator with concurrency and rate limit taken from `config`.
    pub fn from_config(
        store: Arc<dyn InventoryStore>,
        access: SiteAccess,
        config: &FleetConfig,
    ) -> Self {
        let orchestrator = Self::new(store, access).with_concurrency(config.update_concurrency);
        match config.rate_limit.as_ref().and_then(RateLimiter::from_config) {
            Some(limiter) => orchestrator.with_rate_limiter(Arc::new(limiter)),
            None => orchestrator,
        }
    }

    /// Site-groups in flight per batch. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Every update call waits for a token from `limiter` first.
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.runner.rate_limiter = Some(limiter);
        self
    }

    /// Once `cancel` fires, no further batch is launched. Groups already
    /// running finish, including their reconciliation.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Apply `requests` and report one result per request, in input order.
    ///
    /// Only input validation fails the call; every remote, credential, or
    /// store problem is folded into the affected requests' results.
    pub async fn apply_updates(
        &self,
        requests: Vec<UpdateRequest>,
    ) -> Result<UpdateBatchReport, CoreError> {
        validate(&requests)?;

        let originals = requests.clone();
        let mut slots: Vec<Option<UpdateResult>> = vec![None; requests.len()];

        let mut grouped: IndexMap<SiteId, Vec<(usize, UpdateRequest)>> = IndexMap::new();
        for (idx, request) in requests.into_iter().enumerate() {
            grouped
                .entry(request.site_id.clone())
                .or_default()
                .push((idx, request));
        }

        let ids: Vec<SiteId> = grouped.keys().cloned().collect();
        let lookup = self.runner.store.get_sites(&ids).await;
        let mut sites: HashMap<SiteId, Site> = match lookup {
            Ok(found) => found.into_iter().map(|s| (s.id.clone(), s)).collect(),
            Err(e) => {
                warn!(error = %e, "site lookup failed, failing every request");
                let message = e.to_string();
                for (idx, request) in grouped.into_values().flatten() {
                    let result = self.runner.finish(UpdateResult::failed(request, &message)).await;
                    slots[idx] = Some(result);
                }
                return Ok(self.report(slots, originals));
            }
        };

        let mut runnable = Vec::with_capacity(grouped.len());
        for (site_id, items) in grouped {
            match sites.remove(&site_id) {
                Some(site) => runnable.push(SiteGroup { site, items }),
                None => {
                    debug!(site = %site_id, requests = items.len(), "unknown site");
                    for (idx, request) in items {
                        let result = UpdateResult::failed(request, SITE_NOT_FOUND);
                        slots[idx] = Some(self.runner.finish(result).await);
                    }
                }
            }
        }

        let mut pending = runnable.into_iter();
        loop {
            let batch: Vec<SiteGroup> = pending.by_ref().take(self.concurrency).collect();
            if batch.is_empty() {
                break;
            }
            if self.cancel.is_cancelled() {
                let skipped: Vec<SiteGroup> = batch.into_iter().chain(pending.by_ref()).collect();
                info!(site_groups = skipped.len(), "bulk update cancelled");
                for group in skipped {
                    for (idx, request) in group.items {
                        let result = UpdateResult::failed(request, CANCELLED);
                        slots[idx] = Some(self.runner.finish(result).await);
                    }
                }
                break;
            }
            self.run_batch(batch, &mut slots).await;
        }

        Ok(self.report(slots, originals))
    }

    /// Run one batch of site-groups concurrently and wait for all of them.
    ///
    /// Groups hand back each result as soon as it is logged, so a group
    /// that dies part-way only costs the requests it never settled.
    async fn run_batch(&self, batch: Vec<SiteGroup>, slots: &mut [Option<UpdateResult>]) {
        debug!(site_groups = batch.len(), "launching batch");
        let (done, mut settled) = mpsc::unbounded_channel();
        let mut tasks = JoinSet::new();
        let mut launched: HashMap<tokio::task::Id, (SiteId, Vec<(usize, UpdateRequest)>)> =
            HashMap::new();

        for group in batch {
            let key = (group.site.id.clone(), group.items.clone());
            let runner = self.runner.clone();
            let done = done.clone();
            let handle = tasks.spawn(async move { runner.run_group(group, &done).await });
            launched.insert(handle.id(), key);
        }
        drop(done);

        let mut aborted = Vec::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, ())) => {
                    launched.remove(&id);
                }
                Err(e) => {
                    if let Some(group) = launched.remove(&e.id()) {
                        aborted.push((group, e.to_string()));
                    }
                }
            }
        }

        // Every sender is gone once the tasks are, so this drains and ends.
        while let Some((idx, result)) = settled.recv().await {
            slots[idx] = Some(result);
        }

        for ((site_id, items), error) in aborted {
            warn!(site = %site_id, error = %error, "update task aborted");
            let message = format!("update task aborted: {error}");
            for (idx, request) in items {
                if slots[idx].is_none() {
                    let result = UpdateResult::failed(request, &message);
                    slots[idx] = Some(self.runner.finish(result).await);
                }
            }
        }
    }

    fn report(
        &self,
        slots: Vec<Option<UpdateResult>>,
        originals: Vec<UpdateRequest>,
    ) -> UpdateBatchReport {
        let results: Vec<UpdateResult> = slots
            .into_iter()
            .zip(originals)
            .map(|(slot, request)| {
                slot.unwrap_or_else(|| UpdateResult::failed(request, "no result recorded"))
            })
            .collect();
        let report = UpdateBatchReport::new(results);
        info!(
            total = report.summary.total,
            successful = report.summary.successful,
            failed = report.summary.failed,
            concurrency = self.concurrency,
            "bulk update complete"
        );
        report
    }
}

fn validate(requests: &[UpdateRequest]) -> Result<(), CoreError> {
    if requests.is_empty() {
        return Err(CoreError::Validation {
            message: "no update requests given".into(),
        });
    }
    for (idx, request) in requests.iter().enumerate() {
        if request.site_id.as_str().trim().is_empty() {
            return Err(CoreError::Validation {
                message: format!("request #{} has an empty site id", idx + 1),
            });
        }
        if request.slug.trim().is_empty() {
            return Err(CoreError::Validation {
                message: format!(
                    "request #{} for site {} has an empty slug",
                    idx + 1,
                    request.site_id
                ),
            });
        }
    }
    Ok(())
}

// ── Per-site work ────────────────────────────────────────────────────

/// The parts of the orchestrator a site-group task needs. Cloned into
/// each task.
#[derive(Clone)]
struct GroupRunner {
    store: Arc<dyn InventoryStore>,
    access: SiteAccess,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl GroupRunner {
    async fn run_group(&self, group: SiteGroup, done: &Settled) {
        let SiteGroup { site, items } = group;

        let remote = match self.access.open(&site) {
            Ok(remote) => remote,
            Err(e) => {
                warn!(site = %site.id, error = %e, "site unreachable, failing its updates");
                let message = e.to_string();
                for (idx, request) in items {
                    self.settle(done, idx, UpdateResult::failed(request, &message)).await;
                }
                return;
            }
        };

        let mut items = items.into_iter();
        let mut lost_site: Option<CoreError> = None;
        for (idx, request) in items.by_ref() {
            let result = match self.apply_one(&site, remote.as_ref(), &request).await {
                Ok(applied) => UpdateResult::success(request, applied.version),
                Err(e) => {
                    warn!(
                        site = %site.id,
                        kind = %request.kind,
                        slug = %request.slug,
                        error = %e,
                        "update failed"
                    );
                    let result = UpdateResult::failed(request, e.to_string());
                    if e.is_site_unreachable() {
                        lost_site = Some(e);
                    }
                    result
                }
            };
            self.settle(done, idx, result).await;
            if lost_site.is_some() {
                break;
            }
        }

        if let Some(e) = lost_site {
            let message = format!("Skipped, site became unreachable: {e}");
            for (idx, request) in items {
                self.settle(done, idx, UpdateResult::failed(request, &message)).await;
            }
            debug!(site = %site.id, "reconciliation skipped for unreachable site");
            return;
        }

        match self.reconcile(&site, remote.as_ref()).await {
            Ok(patched) => debug!(site = %site.id, patched, "reconciled"),
            Err(e) => warn!(site = %site.id, error = %e, "reconciliation failed"),
        }
    }

    async fn apply_one(
        &self,
        site: &Site,
        remote: &dyn RemoteSite,
        request: &UpdateRequest,
    ) -> Result<AppliedUpdate, CoreError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let applied = match request.kind {
            ItemKind::Plugin => remote.apply_plugin_update(&request.slug).await?,
            ItemKind::Theme => remote.apply_theme_update(&request.slug).await?,
        };
        debug!(site = %site.id, slug = %request.slug, version = %applied.version, "update applied");

        let patch = ItemPatch::updated_to(applied.version.clone());
        match self
            .store
            .update_item(&site.id, request.kind, &request.slug, &patch)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                debug!(site = %site.id, slug = %request.slug, "item not in local inventory");
            }
            Err(e) => warn!(
                site = %site.id,
                slug = %request.slug,
                error = %e,
                "could not record update locally"
            ),
        }
        Ok(applied)
    }

    /// Re-read the site's live inventory and overwrite the observed fields
    /// of every local row with a matching kind and slug. Returns the
    /// number of rows patched.
    async fn reconcile(&self, site: &Site, remote: &dyn RemoteSite) -> Result<usize, CoreError> {
        let wrap = |e: CoreError| CoreError::Reconciliation {
            message: e.to_string(),
        };

        let (plugins, themes) = tokio::join!(remote.list_plugins(), remote.list_themes());
        let live = [
            (ItemKind::Plugin, plugins.map_err(wrap)?),
            (ItemKind::Theme, themes.map_err(wrap)?),
        ];

        let mut patched = 0;
        for (kind, items) in live {
            for item in items {
                let row = item.into_inventory_item(&site.id, kind);
                let hit = self
                    .store
                    .update_item(&site.id, kind, &row.slug, &ItemPatch::observed(&row))
                    .await
                    .map_err(wrap)?;
                if hit {
                    patched += 1;
                }
            }
        }
        Ok(patched)
    }

    /// Log `result` and pass it to the batch collector.
    async fn settle(&self, done: &Settled, idx: usize, result: UpdateResult) {
        let result = self.finish(result).await;
        if done.send((idx, result)).is_err() {
            warn!("batch collector closed, result dropped");
        }
    }

    /// Append `result` to the update log and hand it back. Log failures
    /// never change the result.
    async fn finish(&self, result: UpdateResult) -> UpdateResult {
        let entry = UpdateLogEntry::new(result.clone(), Utc::now());
        if let Err(e) = self.store.append_update_log(entry).await {
            warn!(
                site = %result.site_id,
                slug = %result.slug,
                error = %e,
                "could not append update log"
            );
        }
        result
    }
}
