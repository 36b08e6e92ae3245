//! Sync command handler.

use std::sync::Arc;

use tabled::Tabled;

use wpfleet_core::{
    FleetSyncEngine, FleetSyncSummary, InventoryStore, SiteId, SiteSyncOutcome, SiteSyncStatus,
};

use crate::cli::{GlobalOpts, OutputFormat, SyncArgs};
use crate::error::CliError;
use crate::output::{self, Painter};
use crate::state::Fleet;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Plugins")]
    plugins: String,
    #[tabled(rename = "Themes")]
    themes: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn outcome_row(o: &SiteSyncOutcome, painter: Painter) -> OutcomeRow {
    let (plugins, themes, detail) = match &o.status {
        SiteSyncStatus::Synced { plugins, themes } => {
            (plugins.to_string(), themes.to_string(), String::new())
        }
        SiteSyncStatus::Offline => ("-".into(), "-".into(), String::new()),
        SiteSyncStatus::Failed { reason } => ("-".into(), "-".into(), reason.clone()),
    };
    OutcomeRow {
        site: o.site_id.to_string(),
        name: o.site_name.clone(),
        outcome: painter.sync_outcome(&o.status),
        plugins,
        themes,
        detail,
    }
}

fn outcome_detail(o: &SiteSyncOutcome, painter: Painter) -> String {
    let head = format!(
        "{} ({}): {}",
        o.site_name,
        o.site_id,
        painter.sync_outcome(&o.status)
    );
    match &o.status {
        SiteSyncStatus::Synced { plugins, themes } => {
            format!("{head}, {plugins} plugins, {themes} themes")
        }
        SiteSyncStatus::Offline => head,
        SiteSyncStatus::Failed { reason } => format!("{head}: {reason}"),
    }
}

fn summary_line(s: &FleetSyncSummary) -> String {
    format!(
        "{} sites: {} synced, {} offline, {} failed",
        s.total, s.synced, s.offline, s.failed
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(fleet: &Fleet, args: SyncArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let store: Arc<dyn InventoryStore> = fleet.store.clone();
    let engine = FleetSyncEngine::new(store, fleet.access.clone())
        .with_cancellation(util::cancel_on_ctrl_c());
    let painter = Painter::new(global.color_mode());

    let out = if let Some(site) = args.site {
        let outcome = engine.sync_site(&SiteId::new(site)).await?;
        output::render_single(
            global.format(),
            &outcome,
            |o| outcome_detail(o, painter),
            |o| o.site_id.to_string(),
        )?
    } else {
        let summary = engine.sync_all().await;
        match global.format() {
            OutputFormat::Table => {
                let table = output::render_list(
                    OutputFormat::Table,
                    &summary.outcomes,
                    |o| outcome_row(o, painter),
                    |o| o.site_id.to_string(),
                )?;
                format!("{table}\n{}", summary_line(&summary))
            }
            OutputFormat::Plain => summary
                .outcomes
                .iter()
                .map(|o| o.site_id.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
            format => output::render_single(format, &summary, summary_line, |_| String::new())?,
        }
    };

    output::print_output(&out, global.quiet);
    Ok(())
}
