//! Next command implementation.
//!
//! Prints the single task to work on next, or with `--all` every ready
//! task in the order they would be picked.

use super::{open_tracker, parse_priority};
use crate::cli::NextArgs;
use crate::config;
use crate::error::Result;
use crate::model::Task;
use crate::output::{OutputContext, type_badge};
use crate::scheduler::NextTask;
use tracing::info;

/// Execute the next command.
///
/// An empty result is not an error; the reason is reported instead.
///
/// # Errors
///
/// Returns an error for a bad `--priority` or a failed load.
pub fn execute(args: &NextArgs, ctx: &OutputContext, cli: &config::CliOverrides) -> Result<()> {
    let priority = parse_priority(args.priority.as_deref())?;
    let (tracker, _layer) = open_tracker(cli)?;

    if args.all {
        let ranked = tracker.ranked_tasks(priority)?;
        info!(count = ranked.len(), "Ranked ready tasks");
        if ctx.is_json() {
            ctx.json_pretty(&ranked);
        } else if ranked.is_empty() {
            ctx.print("No ready tasks");
        } else {
            for (index, task) in ranked.iter().enumerate() {
                ctx.print(&format!("{}. {}", index + 1, task_line(task, ctx)));
            }
        }
        return Ok(());
    }

    let next = tracker.next_task(priority)?;
    if ctx.is_json() {
        ctx.json_pretty(&next);
        return Ok(());
    }

    match &next {
        NextTask::Selected(task) => {
            info!(id = %task.formatted_id, "Selected next task");
            ctx.print(&task_line(task, ctx));
            if !task.epic_id.is_empty() {
                ctx.print(&format!("  epic: {}", task.epic_id));
            }
            if !task.description.is_empty() {
                ctx.print(&format!("  {}", task.description));
            }
        }
        other => {
            if let Some(reason) = other.reason() {
                ctx.print(reason);
            }
        }
    }
    Ok(())
}

fn task_line(task: &Task, ctx: &OutputContext) -> String {
    format!(
        "{} {}",
        ctx.entity_line(&task.formatted_id, task.status, task.priority, &task.title),
        type_badge(task.kind)
    )
}
