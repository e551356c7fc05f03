//! Create command implementation.

use super::{open_tracker, priority_or_default};
use crate::cli::{CreateCommands, CreateEpicArgs, CreateIdeaArgs, CreateTaskArgs};
use crate::config;
use crate::config::ConfigLayer;
use crate::error::Result;
use crate::model::EntityType;
use crate::output::OutputContext;
use crate::storage::NewEntity;
use crate::tracker::Tracker;
use crate::util::id::{parse_id, parse_ids};
use std::str::FromStr;
use tracing::info;

/// Execute the create command.
///
/// # Errors
///
/// Returns an error for unparseable flags, a bad parent or dependency,
/// or a database failure.
pub fn execute(
    command: &CreateCommands,
    ctx: &OutputContext,
    cli: &config::CliOverrides,
) -> Result<()> {
    let (mut tracker, layer) = open_tracker(cli)?;
    match command {
        CreateCommands::Idea(args) => create_idea(args, &mut tracker, &layer, ctx),
        CreateCommands::Epic(args) => create_epic(args, &mut tracker, &layer, ctx),
        CreateCommands::Task(args) => create_task(args, &mut tracker, &layer, ctx),
    }
}

fn create_idea(
    args: &CreateIdeaArgs,
    tracker: &mut Tracker,
    layer: &ConfigLayer,
    ctx: &OutputContext,
) -> Result<()> {
    let priority = priority_or_default(args.priority.as_deref(), layer)?;
    let idea = tracker.create_idea(&args.title, &args.description, priority)?;
    info!(id = %idea.formatted_id, "Created idea");

    if ctx.is_json() {
        ctx.json_pretty(&idea);
    } else {
        ctx.success(&format!("Created {}: {}", idea.formatted_id, idea.title));
    }
    Ok(())
}

fn create_epic(
    args: &CreateEpicArgs,
    tracker: &mut Tracker,
    layer: &ConfigLayer,
    ctx: &OutputContext,
) -> Result<()> {
    let priority = priority_or_default(args.priority.as_deref(), layer)?;
    let idea_id = args.idea.as_deref().map(parse_id).transpose()?;
    let epic = tracker.create_epic(idea_id, &args.title, &args.description, priority)?;
    info!(id = %epic.formatted_id, idea = %epic.idea_id, "Created epic");

    if ctx.is_json() {
        ctx.json_pretty(&epic);
    } else if epic.idea_id.is_empty() {
        ctx.success(&format!("Created {}: {}", epic.formatted_id, epic.title));
    } else {
        ctx.success(&format!(
            "Created {} under {}: {}",
            epic.formatted_id, epic.idea_id, epic.title
        ));
    }
    Ok(())
}

fn create_task(
    args: &CreateTaskArgs,
    tracker: &mut Tracker,
    layer: &ConfigLayer,
    ctx: &OutputContext,
) -> Result<()> {
    let kind = EntityType::from_str(&args.kind)?;
    let priority = priority_or_default(args.priority.as_deref(), layer)?;
    let dependencies = parse_ids(&args.depends_on)?;

    let mut new = NewEntity::new(kind, args.title.as_str())
        .description(args.description.as_str())
        .priority(priority)
        .dependencies(dependencies);
    new.parent_id = args.epic.as_deref().map(parse_id).transpose()?;

    let task = tracker.create_task(&new)?;
    info!(id = %task.formatted_id, epic = %task.epic_id, deps = task.dependencies.len(), "Created task");

    if ctx.is_json() {
        ctx.json_pretty(&task);
    } else {
        ctx.success(&format!("Created {}: {}", task.formatted_id, task.title));
        if !task.dependencies.is_empty() {
            let deps = tracker.get_dependencies(task.id)?;
            let labels: Vec<&str> = deps.iter().map(|dep| dep.formatted_id.as_str()).collect();
            ctx.print(&format!("  depends on: {}", labels.join(", ")));
        }
    }
    Ok(())
}
