//! Update command implementation.

use super::{open_tracker, parse_priority};
use crate::cli::UpdateArgs;
use crate::config;
use crate::error::{Result, TrellisError};
use crate::model::Status;
use crate::output::OutputContext;
use crate::storage::EntityUpdate;
use crate::util::id::{parse_id, parse_ids};
use std::str::FromStr;
use tracing::{debug, info};

/// Execute the update command.
///
/// # Errors
///
/// Returns an error if the entity is missing, no field was given, a
/// flag does not parse, or the new parent/dependencies are invalid.
pub fn execute(args: &UpdateArgs, ctx: &OutputContext, cli: &config::CliOverrides) -> Result<()> {
    let id = parse_id(&args.id)?;
    let update = build_update(args)?;
    if update.is_empty() {
        return Err(TrellisError::validation(
            "update",
            "nothing to update (pass at least one field flag)",
        ));
    }
    debug!(id, ?update, "Applying update");

    let (mut tracker, _layer) = open_tracker(cli)?;
    let entity = tracker.update(id, &update)?;
    info!(id = %entity.formatted_id(), "Updated entity");

    if ctx.is_json() {
        ctx.json_pretty(&entity);
    } else {
        ctx.success(&format!("Updated {}", entity.formatted_id()));
        ctx.print(&ctx.entity_line(
            &entity.formatted_id(),
            entity.status,
            entity.priority,
            &entity.title,
        ));
    }
    Ok(())
}

fn build_update(args: &UpdateArgs) -> Result<EntityUpdate> {
    let parent_id = if args.no_parent {
        Some(None)
    } else {
        args.parent
            .as_deref()
            .map(|parent| parse_id(parent).map(Some))
            .transpose()?
    };

    let dependencies = if args.clear_deps {
        Some(Vec::new())
    } else {
        args.depends_on.as_deref().map(parse_ids).transpose()?
    };

    Ok(EntityUpdate {
        title: args.title.clone(),
        description: args.description.clone(),
        priority: parse_priority(args.priority.as_deref())?,
        status: args.status.as_deref().map(Status::from_str).transpose()?,
        parent_id,
        dependencies,
    })
}
