//! Update log handler.

use tabled::Tabled;

use wpfleet_core::{InventoryStore, UpdateLogEntry};

use crate::cli::{GlobalOpts, LogArgs};
use crate::error::CliError;
use crate::output::{self, Painter};
use crate::state::Fleet;

use super::util;

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Completed")]
    completed: String,
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

pub async fn handle(fleet: &Fleet, args: &LogArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut entries = fleet.store.update_log().await?;
    entries.reverse();
    entries.truncate(args.limit);

    let painter = Painter::new(global.color_mode());
    let out = output::render_list(
        global.format(),
        &entries,
        |e: &UpdateLogEntry| LogRow {
            completed: util::format_time(Some(e.completed_at)),
            site: e.result.site_id.to_string(),
            kind: e.result.kind.to_string(),
            slug: e.result.slug.clone(),
            status: painter.update_status(e.result.status),
            detail: e
                .result
                .new_version
                .clone()
                .or_else(|| e.result.message.clone())
                .unwrap_or_default(),
        },
        |e| e.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
