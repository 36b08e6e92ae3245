//! Sites command handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use wpfleet_core::{HealthGrade, InventoryStore, SiteId, SiteStatus, health};

use crate::cli::{GlobalOpts, SitesArgs, SitesCommand};
use crate::error::CliError;
use crate::output::{self, Painter};
use crate::state::Fleet;

use super::util;

// ── Report ──────────────────────────────────────────────────────────

/// One site as shown by `sites list`: stored state plus derived health.
#[derive(Debug, Serialize)]
struct SiteReport {
    id: SiteId,
    name: String,
    url: String,
    status: SiteStatus,
    health_score: u8,
    health_grade: HealthGrade,
    plugin_updates: u32,
    theme_updates: u32,
    wp_version: Option<String>,
    php_version: Option<String>,
    last_synced: Option<DateTime<Utc>>,
}

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Health")]
    health: String,
    #[tabled(rename = "Updates")]
    updates: String,
    #[tabled(rename = "WordPress")]
    wp_version: String,
    #[tabled(rename = "Last Sync")]
    last_synced: String,
}

fn site_row(r: &SiteReport, painter: Painter) -> SiteRow {
    SiteRow {
        id: r.id.to_string(),
        name: r.name.clone(),
        status: painter.status(r.status),
        health: format!("{} {}", r.health_score, painter.grade(r.health_grade)),
        updates: format!("{}p / {}t", r.plugin_updates, r.theme_updates),
        wp_version: output::or_dash(r.wp_version.as_deref()),
        last_synced: util::format_time(r.last_synced),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(fleet: &Fleet, args: SitesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SitesCommand::List => {
            let now = Utc::now();
            let sites = fleet.store.list_sites().await?;
            let views = util::health_views(&fleet.store, &sites).await?;

            let reports: Vec<SiteReport> = sites
                .into_iter()
                .zip(views)
                .map(|(site, view)| {
                    let score = health::score(&view, now);
                    SiteReport {
                        id: site.id,
                        name: site.name,
                        url: site.url,
                        status: site.status,
                        health_score: score,
                        health_grade: HealthGrade::from_score(score),
                        plugin_updates: view.plugin_updates,
                        theme_updates: view.theme_updates,
                        wp_version: site.wp_version,
                        php_version: site.php_version,
                        last_synced: site.last_synced,
                    }
                })
                .collect();

            let painter = Painter::new(global.color_mode());
            let out = output::render_list(
                global.format(),
                &reports,
                |r| site_row(r, painter),
                |r| r.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
