//! Dependency inspection: per-task dependencies and stored cycles.

use super::open_tracker;
use crate::cli::DepsArgs;
use crate::config;
use crate::error::Result;
use crate::model::{EntityType, Status};
use crate::output::{OutputContext, status_icon};
use crate::tracker::Tracker;
use crate::util::id::{format_id, parse_id};
use serde::Serialize;

/// JSON output for one dependency.
#[derive(Debug, Serialize)]
struct DepItem {
    id: String,
    title: String,
    status: Status,
}

/// JSON output for `deps`.
#[derive(Debug, Serialize)]
struct DepsReport {
    id: String,
    dependencies: Vec<DepItem>,
    blocked_by: Vec<String>,
    dependents: Vec<String>,
    /// Stored ids with no matching task.
    missing: Vec<i64>,
}

/// JSON output for `cycles`.
#[derive(Debug, Serialize)]
struct CyclesResult {
    cycles: Vec<Vec<String>>,
    count: usize,
}

/// Execute the deps command.
///
/// # Errors
///
/// Returns an error if the task is missing or a query fails.
pub fn execute(args: &DepsArgs, ctx: &OutputContext, cli: &config::CliOverrides) -> Result<()> {
    let id = parse_id(&args.id)?;
    let (tracker, _layer) = open_tracker(cli)?;
    let task = tracker.load_task(id)?;
    let graph = tracker.graph();

    let resolved = graph.resolve_dependencies(&task)?;
    let missing: Vec<i64> = task
        .dependencies
        .iter()
        .copied()
        .filter(|dep| !resolved.iter().any(|found| found.id == *dep))
        .collect();
    let report = DepsReport {
        id: task.formatted_id.clone(),
        dependencies: resolved
            .iter()
            .map(|dep| DepItem {
                id: dep.formatted_id.clone(),
                title: dep.title.clone(),
                status: dep.status,
            })
            .collect(),
        blocked_by: resolved
            .iter()
            .filter(|dep| !dep.is_done())
            .map(|dep| dep.formatted_id.clone())
            .collect(),
        dependents: format_ids(&tracker, &graph.dependents(id)?)?,
        missing,
    };

    if ctx.is_json() {
        ctx.json_pretty(&report);
        return Ok(());
    }

    ctx.print(&format!("{} dependencies:", report.id));
    if report.dependencies.is_empty() {
        ctx.print("  (none)");
    }
    for dep in &report.dependencies {
        ctx.print(&format!(
            "  {} {} {}",
            status_icon(dep.status, ctx.use_color()),
            dep.id,
            dep.title
        ));
    }
    for dep in &report.missing {
        ctx.warning(&format!("dependency {dep} no longer exists"));
    }
    if report.blocked_by.is_empty() {
        ctx.print("Ready: all dependencies done");
    } else {
        ctx.print(&format!("Blocked by: {}", report.blocked_by.join(", ")));
    }
    if !report.dependents.is_empty() {
        ctx.print(&format!("Needed by: {}", report.dependents.join(", ")));
    }
    Ok(())
}

/// Execute the cycles command.
///
/// # Errors
///
/// Returns an error if the edge query fails.
pub fn execute_cycles(ctx: &OutputContext, cli: &config::CliOverrides) -> Result<()> {
    let (tracker, _layer) = open_tracker(cli)?;
    let cycles = tracker
        .find_cycles()?
        .iter()
        .map(|cycle| format_ids(&tracker, cycle))
        .collect::<Result<Vec<_>>>()?;

    if ctx.is_json() {
        ctx.json_pretty(&CyclesResult {
            count: cycles.len(),
            cycles,
        });
    } else if cycles.is_empty() {
        ctx.success("No dependency cycles");
    } else {
        ctx.warning(&format!("{} dependency cycle(s) found", cycles.len()));
        for cycle in &cycles {
            ctx.print(&format!("  {}", cycle.join(" → ")));
        }
    }
    Ok(())
}

/// Formatted ids for `ids`, in order; unknown ids fall back to a task label.
pub(crate) fn format_ids(tracker: &Tracker, ids: &[i64]) -> Result<Vec<String>> {
    let entities = tracker.storage().get_entities(ids)?;
    Ok(ids
        .iter()
        .map(|id| {
            entities.get(id).map_or_else(
                || format_id(*id, EntityType::Task),
                crate::model::Entity::formatted_id,
            )
        })
        .collect())
}
