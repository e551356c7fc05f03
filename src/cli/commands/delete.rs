//! Delete command implementation.
//!
//! Ideas and epics take their children with them.

use super::open_tracker;
use crate::cli::DeleteArgs;
use crate::config;
use crate::error::Result;
use crate::model::EntityType;
use crate::output::OutputContext;
use crate::util::id::parse_id;

/// Execute the delete command.
///
/// # Errors
///
/// Returns an error if the entity is missing or a task outside the
/// deleted subtree still depends on something inside it.
pub fn execute(args: &DeleteArgs, ctx: &OutputContext, cli: &config::CliOverrides) -> Result<()> {
    let id = parse_id(&args.id)?;
    let (mut tracker, _layer) = open_tracker(cli)?;
    let report = tracker.delete(id)?;

    if ctx.is_json() {
        ctx.json_pretty(&report);
        return Ok(());
    }

    let epics = report.count_of(EntityType::Epic);
    let tasks: usize = EntityType::TASK_KINDS
        .iter()
        .map(|kind| report.count_of(*kind))
        .sum();
    let mut summary = format!("Deleted {}", report.root);
    if report.deleted.len() > 1 {
        summary.push_str(&format!(" ({epics} epics, {tasks} tasks"));
        if report.notes > 0 {
            summary.push_str(&format!(", {} notes", report.notes));
        }
        summary.push(')');
    }
    ctx.success(&summary);
    Ok(())
}
