use super::open_tracker;
use crate::cli::NoteArgs;
use crate::config;
use crate::error::Result;
use crate::model::NoteType;
use crate::output::OutputContext;
use crate::util::id::parse_id;
use std::str::FromStr;

/// Execute the note command.
///
/// # Errors
///
/// Returns an error if the entity is missing, the note type does not
/// parse, or the content is empty.
pub fn execute(args: &NoteArgs, ctx: &OutputContext, cli: &config::CliOverrides) -> Result<()> {
    let id = parse_id(&args.id)?;
    let note_type = NoteType::from_str(&args.note_type)?;
    let (mut tracker, _layer) = open_tracker(cli)?;

    let note = tracker.add_progress_note(id, &args.content, note_type)?;
    if ctx.is_json() {
        ctx.json_pretty(&note);
    } else {
        let owner = tracker.get(id)?.formatted_id();
        ctx.success(&format!("Added {} note to {owner}", note.note_type));
    }
    Ok(())
}
