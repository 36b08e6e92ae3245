//! Updates command handlers: prioritized listing and bulk apply.

use std::collections::BTreeSet;
use std::sync::Arc;

use tabled::Tabled;
use tracing::debug;

use wpfleet_core::{
    BulkUpdateOrchestrator, InventoryStore, PrioritizedUpdate, UpdateBatchReport, UpdateRequest,
    UpdateResult, priority,
};

use crate::cli::{ApplyArgs, GlobalOpts, OutputFormat, UpdatesArgs, UpdatesCommand};
use crate::error::CliError;
use crate::output::{self, Painter};
use crate::state::Fleet;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PendingRow {
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Installed")]
    current: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Active")]
    active: String,
}

fn pending_row(p: &PrioritizedUpdate, painter: Painter) -> PendingRow {
    let u = &p.update;
    PendingRow {
        priority: painter.priority(p.priority),
        site: u.site_id.to_string(),
        kind: u.kind.to_string(),
        slug: u.slug.clone(),
        current: u.current_version.clone(),
        available: output::or_dash(u.new_version.as_deref()),
        active: if u.is_active { "yes" } else { "no" }.into(),
    }
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Version / Message")]
    detail: String,
}

fn result_row(r: &UpdateResult, painter: Painter) -> ResultRow {
    let detail = r
        .new_version
        .clone()
        .or_else(|| r.message.clone())
        .unwrap_or_default();
    ResultRow {
        site: r.site_id.to_string(),
        kind: r.kind.to_string(),
        slug: r.slug.clone(),
        status: painter.update_status(r.status),
        detail,
    }
}

fn request_id(site: &str, kind: impl std::fmt::Display, slug: &str) -> String {
    format!("{site} {kind}:{slug}")
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(fleet: &Fleet, args: UpdatesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        UpdatesCommand::List { site } => {
            let pending = prioritized(fleet, site.as_deref()).await?;
            let painter = Painter::new(global.color_mode());
            let out = output::render_list(
                global.format(),
                &pending,
                |p| pending_row(p, painter),
                |p| request_id(p.update.site_id.as_str(), p.update.kind, &p.update.slug),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        UpdatesCommand::Apply(apply) => handle_apply(fleet, apply, global).await,
    }
}

/// Pending updates across the sites in scope, highest priority first.
async fn prioritized(
    fleet: &Fleet,
    site: Option<&str>,
) -> Result<Vec<PrioritizedUpdate>, CliError> {
    let sites = util::sites_in_scope(&fleet.store, site).await?;
    let mut pending = Vec::new();
    for site in &sites {
        let items = fleet.store.inventory(&site.id).await?;
        pending.extend(priority::pending_updates(&items));
    }
    Ok(priority::prioritize(&pending))
}

/// Turn the apply flags into requests. `--all` takes every pending update
/// in priority order; otherwise `--site` plus explicit slugs are required.
async fn build_requests(fleet: &Fleet, args: ApplyArgs) -> Result<Vec<UpdateRequest>, CliError> {
    if args.all {
        return Ok(prioritized(fleet, args.site.as_deref())
            .await?
            .iter()
            .map(|p| p.update.request())
            .collect());
    }

    if args.plugins.is_empty() && args.themes.is_empty() {
        return Err(CliError::Validation {
            field: "updates".into(),
            reason: "name at least one --plugin or --theme, or pass --all".into(),
        });
    }
    let Some(site) = args.site else {
        return Err(CliError::Validation {
            field: "site".into(),
            reason: "--site is required with --plugin / --theme".into(),
        });
    };
    let site = util::require_site(&fleet.store, &site).await?;

    let plugins = args
        .plugins
        .into_iter()
        .map(|slug| UpdateRequest::plugin(site.id.clone(), slug));
    let themes = args
        .themes
        .into_iter()
        .map(|slug| UpdateRequest::theme(site.id.clone(), slug));
    Ok(plugins.chain(themes).collect())
}

async fn handle_apply(fleet: &Fleet, args: ApplyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let requests = build_requests(fleet, args).await?;
    if requests.is_empty() {
        output::print_output("No pending updates.", global.quiet);
        return Ok(());
    }

    let site_count = requests
        .iter()
        .map(|r| r.site_id.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    let prompt = format!(
        "Apply {} update(s) across {site_count} site(s)?",
        requests.len()
    );
    if !util::confirm(&prompt, "updates apply", global.yes)? {
        output::print_output("Aborted.", global.quiet);
        return Ok(());
    }

    debug!(requests = requests.len(), sites = site_count, "applying updates");
    let store: Arc<dyn InventoryStore> = fleet.store.clone();
    let orchestrator =
        BulkUpdateOrchestrator::from_config(store, fleet.access.clone(), &fleet.config)
            .with_cancellation(util::cancel_on_ctrl_c());
    let report = orchestrator.apply_updates(requests).await?;

    let out = render_report(&report, global)?;
    output::print_output(&out, global.quiet);

    if report.summary.failed > 0 {
        return Err(CliError::UpdatesFailed {
            failed: report.summary.failed,
            total: report.summary.total,
        });
    }
    Ok(())
}

fn render_report(report: &UpdateBatchReport, global: &GlobalOpts) -> Result<String, CliError> {
    let painter = Painter::new(global.color_mode());
    match global.format() {
        OutputFormat::Table => {
            let table = output::render_list(
                OutputFormat::Table,
                &report.results,
                |r| result_row(r, painter),
                |r| r.slug.clone(),
            )?;
            let s = &report.summary;
            Ok(format!(
                "{table}\n{} updates: {} succeeded, {} failed",
                s.total, s.successful, s.failed
            ))
        }
        OutputFormat::Plain => Ok(report
            .results
            .iter()
            .map(|r| format!("{} {}", request_id(r.site_id.as_str(), r.kind, &r.slug), r.status))
            .collect::<Vec<_>>()
            .join("\n")),
        format => output::render_single(format, report, |_| String::new(), |_| String::new()),
    }
}
