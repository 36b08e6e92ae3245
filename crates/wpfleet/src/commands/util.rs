//! Shared helpers for command handlers.

use std::io::IsTerminal;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use wpfleet_core::{InventoryStore, MemoryStore, Site, SiteHealthView, SiteId};

use crate::error::CliError;

/// Ask before a mutating operation. `--yes` skips the prompt; without a
/// terminal to ask on, the operation is refused.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Token cancelled on Ctrl-C. Work already dispatched runs to completion;
/// anything not yet started is reported as cancelled.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing in-flight work");
            child.cancel();
        }
    });
    token
}

/// Look up one site, or fail with a pointer to `sites list`.
pub async fn require_site(store: &MemoryStore, id: &str) -> Result<Site, CliError> {
    store
        .get_sites(&[SiteId::new(id)])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| CliError::NotFound {
            resource_type: "site".into(),
            identifier: id.into(),
            list_command: "sites list".into(),
        })
}

/// Sites in scope: one when `site` is given, else the whole fleet.
pub async fn sites_in_scope(
    store: &MemoryStore,
    site: Option<&str>,
) -> Result<Vec<Site>, CliError> {
    match site {
        Some(id) => Ok(vec![require_site(store, id).await?]),
        None => Ok(store.list_sites().await?),
    }
}

/// Health view of every site, built from cached inventory.
pub async fn health_views(
    store: &MemoryStore,
    sites: &[Site],
) -> Result<Vec<SiteHealthView>, CliError> {
    let mut views = Vec::with_capacity(sites.len());
    for site in sites {
        let items = store.inventory(&site.id).await?;
        views.push(SiteHealthView::from_inventory(site, &items));
    }
    Ok(views)
}

/// Timestamp cell text (UTC, minute precision), `never` when unset.
pub fn format_time(at: Option<chrono::DateTime<chrono::Utc>>) -> String {
    at.map_or_else(
        || "never".into(),
        |t| t.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}
