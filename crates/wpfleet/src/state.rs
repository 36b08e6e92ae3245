//! Fleet state file and the runtime context built around it.
//!
//! Sites, inventory, and the update log live in one JSON document. The
//! config file decides which sites exist; the state file only carries what
//! was observed about them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use wpfleet_config::{Config, CredentialResolver};
use wpfleet_core::{FleetConfig, HttpConnector, MemoryStore, Site, SiteAccess, StoreSnapshot};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Snapshot I/O ─────────────────────────────────────────────────────

/// Read the state file. A missing file is an empty fleet.
pub fn load_snapshot(path: &Path) -> Result<StoreSnapshot, CliError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no state file, starting empty");
            return Ok(StoreSnapshot::default());
        }
        Err(e) => return Err(state_error(path, &e)),
    };
    serde_json::from_str(&raw).map_err(|e| state_error(path, &e))
}

/// Write the state file via a sibling temp file and a rename, so a crash
/// mid-write leaves the previous state intact.
pub fn save_snapshot(path: &Path, snapshot: &StoreSnapshot) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_string_pretty(snapshot)?)?;
    std::fs::rename(&tmp, path)?;
    debug!(path = %path.display(), sites = snapshot.sites.len(), "state saved");
    Ok(())
}

fn state_error(path: &Path, err: &dyn std::fmt::Display) -> CliError {
    CliError::State {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Replace the snapshot's sites with the configured ones, carrying over the
/// observed state of sites that were already known. Sites no longer in the
/// config are dropped, and `MemoryStore::from_snapshot` drops their
/// inventory with them. The update log is kept whole.
pub fn merge_configured_sites(mut snapshot: StoreSnapshot, configured: Vec<Site>) -> StoreSnapshot {
    let previous: HashMap<_, _> = snapshot
        .sites
        .drain(..)
        .map(|site| (site.id.clone(), site))
        .collect();

    snapshot.sites = configured
        .into_iter()
        .map(|site| match previous.get(&site.id) {
            Some(prev) => site.with_observed_state_of(prev),
            None => site,
        })
        .collect();
    snapshot
}

// ── Runtime context ──────────────────────────────────────────────────

/// Everything a fleet command needs: resolved config, the loaded store,
/// and site access over HTTP.
pub struct Fleet {
    pub config: FleetConfig,
    pub store: Arc<MemoryStore>,
    pub access: SiteAccess,
    state_path: PathBuf,
}

impl Fleet {
    /// Load the state file and merge in the configured sites, applying
    /// CLI overrides to the runtime config.
    pub fn open(cfg: &Config, global: &GlobalOpts) -> Result<Self, CliError> {
        let mut config = cfg.fleet_config()?;
        if let Some(timeout) = global.timeout {
            config.request_timeout = timeout;
        }

        let state_path = global.state_path();
        let snapshot = merge_configured_sites(load_snapshot(&state_path)?, cfg.site_definitions()?);
        let store = Arc::new(MemoryStore::from_snapshot(snapshot));

        let access = SiteAccess::new(
            Arc::new(HttpConnector::new(&config)),
            Arc::new(CredentialResolver),
        );

        Ok(Self {
            config,
            store,
            access,
            state_path,
        })
    }

    /// Write the store back to the state file.
    pub async fn persist(&self) -> Result<(), CliError> {
        save_snapshot(&self.state_path, &self.store.snapshot().await)
    }
}
