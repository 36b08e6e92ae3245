//! Command dispatch: bridges CLI args -> core engines -> output formatting.

pub mod config_cmd;
pub mod log;
pub mod schedule;
pub mod sites;
pub mod sync;
pub mod updates;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::state::Fleet;

/// Dispatch a fleet-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, fleet: &Fleet, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Sync(args) => sync::handle(fleet, args, global).await,
        Command::Sites(args) => sites::handle(fleet, args, global).await,
        Command::Updates(args) => updates::handle(fleet, args, global).await,
        Command::Due(args) => schedule::handle_due(fleet, &args, global).await,
        Command::Notifications => schedule::handle_notifications(fleet, global).await,
        Command::Log(args) => log::handle(fleet, &args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
