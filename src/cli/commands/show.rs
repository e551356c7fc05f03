//! Show command implementation.

use super::open_tracker;
use crate::cli::ShowArgs;
use crate::config;
use crate::error::Result;
use crate::model::{EntityType, Epic, Idea, ProgressNote, Task};
use crate::output::{OutputContext, type_badge};
use crate::tracker::Tracker;
use crate::util::id::parse_id;
use crate::util::time::format_timestamp;
use serde::Serialize;

/// A task with its resolved dependency state, for JSON output.
#[derive(Debug, Serialize)]
struct TaskDetail<'a> {
    #[serde(flatten)]
    task: &'a Task,
    blocked_by: Vec<String>,
    dependents: Vec<String>,
}

/// Execute the show command.
///
/// # Errors
///
/// Returns an error if the entity is missing or a load fails.
pub fn execute(args: &ShowArgs, ctx: &OutputContext, cli: &config::CliOverrides) -> Result<()> {
    let id = parse_id(&args.id)?;
    let (tracker, _layer) = open_tracker(cli)?;

    match tracker.get(id)?.entity_type {
        EntityType::Idea => show_idea(&tracker.load_idea(id)?, ctx),
        EntityType::Epic => show_epic(&tracker.load_epic(id)?, ctx),
        EntityType::Task | EntityType::Bug | EntityType::Research => {
            show_task(&tracker, &tracker.load_task(id)?, ctx)?;
        }
    }
    Ok(())
}

fn show_idea(idea: &Idea, ctx: &OutputContext) {
    if ctx.is_json() {
        ctx.json_pretty(idea);
        return;
    }
    ctx.print(&ctx.entity_line(&idea.formatted_id, idea.status, idea.priority, &idea.title));
    print_description(&idea.description, ctx);
    ctx.print(&format!(
        "  {} epics, {} tasks",
        idea.epics.len(),
        idea.task_count()
    ));
    for epic in &idea.epics {
        ctx.print(&format!(
            "  {}",
            ctx.entity_line(&epic.formatted_id, epic.status, epic.priority, &epic.title)
        ));
        for task in &epic.tasks {
            ctx.print(&format!(
                "    {}",
                ctx.entity_line(&task.formatted_id, task.status, task.priority, &task.title)
            ));
        }
    }
}

fn show_epic(epic: &Epic, ctx: &OutputContext) {
    if ctx.is_json() {
        ctx.json_pretty(epic);
        return;
    }
    ctx.print(&ctx.entity_line(&epic.formatted_id, epic.status, epic.priority, &epic.title));
    if !epic.idea_id.is_empty() {
        ctx.print(&format!("  idea: {}", epic.idea_id));
    }
    print_description(&epic.description, ctx);
    let done = epic.tasks.iter().filter(|task| task.is_done()).count();
    ctx.print(&format!("  tasks: {done}/{} done", epic.tasks.len()));
    for task in &epic.tasks {
        ctx.print(&format!(
            "  {}",
            ctx.entity_line(&task.formatted_id, task.status, task.priority, &task.title)
        ));
    }
}

fn show_task(tracker: &Tracker, task: &Task, ctx: &OutputContext) -> Result<()> {
    let graph = tracker.graph();
    let blockers: Vec<String> = graph
        .blockers(task)?
        .into_iter()
        .map(|blocker| blocker.formatted_id)
        .collect();
    let dependents = super::dep::format_ids(tracker, &graph.dependents(task.id)?)?;

    if ctx.is_json() {
        ctx.json_pretty(&TaskDetail {
            task,
            blocked_by: blockers,
            dependents,
        });
        return Ok(());
    }

    ctx.print(&format!(
        "{} {}",
        ctx.entity_line(&task.formatted_id, task.status, task.priority, &task.title),
        type_badge(task.kind)
    ));
    if !task.epic_id.is_empty() {
        ctx.print(&format!("  epic: {}", task.epic_id));
    }
    print_description(&task.description, ctx);

    if !task.dependencies.is_empty() {
        let deps = graph.resolve_dependencies(task)?;
        let labels: Vec<&str> = deps.iter().map(|dep| dep.formatted_id.as_str()).collect();
        ctx.print(&format!("  depends on: {}", labels.join(", ")));
    }
    if !blockers.is_empty() {
        ctx.print(&format!("  blocked by: {}", blockers.join(", ")));
    }
    if !dependents.is_empty() {
        ctx.print(&format!("  needed by: {}", dependents.join(", ")));
    }
    print_notes(&task.notes, ctx);
    Ok(())
}

fn print_description(description: &str, ctx: &OutputContext) {
    for line in description.lines() {
        ctx.print(&format!("  {line}"));
    }
}

fn print_notes(notes: &[ProgressNote], ctx: &OutputContext) {
    if notes.is_empty() {
        return;
    }
    ctx.print("  notes:");
    for note in notes {
        ctx.print(&format!(
            "    [{}] {} {}",
            format_timestamp(&note.timestamp),
            note.note_type,
            note.content
        ));
    }
}
