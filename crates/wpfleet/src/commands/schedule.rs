//! `due` and `notifications` handlers.

use chrono::Utc;
use tabled::Tabled;

use wpfleet_core::{InventoryStore, Notification, Site, schedule};

use crate::cli::{DueArgs, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Painter};
use crate::state::Fleet;

use super::util;

#[derive(Tabled)]
struct DueRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last Sync")]
    last_synced: String,
}

#[derive(Tabled)]
struct NotificationRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Message")]
    message: String,
}

pub async fn handle_due(
    fleet: &Fleet,
    args: &DueArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let interval = args.interval.unwrap_or(fleet.config.sync_interval_minutes);
    let sites = fleet.store.list_sites().await?;
    let due: Vec<Site> = schedule::sites_due_for_sync(&sites, interval, Utc::now())
        .into_iter()
        .cloned()
        .collect();

    let painter = Painter::new(global.color_mode());
    let out = output::render_list(
        global.format(),
        &due,
        |s| DueRow {
            id: s.id.to_string(),
            name: s.name.clone(),
            status: painter.status(s.status),
            last_synced: util::format_time(s.last_synced),
        },
        |s| s.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle_notifications(fleet: &Fleet, global: &GlobalOpts) -> Result<(), CliError> {
    let sites = fleet.store.list_sites().await?;
    let views = util::health_views(&fleet.store, &sites).await?;
    let notifications =
        schedule::build_notifications(&views, &fleet.config.notifications, Utc::now());

    let painter = Painter::new(global.color_mode());
    let out = output::render_list(
        global.format(),
        &notifications,
        |n: &Notification| NotificationRow {
            severity: painter.severity(n.severity),
            site: n.site_id.to_string(),
            kind: n.kind.to_string(),
            message: n.message.clone(),
        },
        |n| format!("{} {}", n.site_id, n.kind),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
