//! Formatted entity IDs.
//!
//! Every entity shares one numeric sequence; the type prefix (`IDEA`, `EPIC`,
//! `TSK`, `BUG`, `RND`) is a display convention. Parsing only looks at the
//! trailing numeric segment, so `TSK-7` and `EPIC-7` both name entity 7.

use crate::error::{Result, TrellisError};
use crate::model::EntityType;

/// Render a numeric id with its type prefix, e.g. `TSK-12`.
#[must_use]
pub fn format_id(id: i64, entity_type: EntityType) -> String {
    format!("{}-{id}", entity_type.prefix())
}

/// Extract the numeric id from a formatted (or bare numeric) id.
///
/// The prefix is not checked against any type.
///
/// # Errors
///
/// Returns `InvalidId` if the trailing segment is not a positive integer.
pub fn parse_id(input: &str) -> Result<i64> {
    let trimmed = input.trim();
    let segment = trimmed
        .rsplit_once('-')
        .map_or(trimmed, |(_, numeric)| numeric);

    match segment.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(TrellisError::InvalidId {
            id: input.to_string(),
        }),
    }
}

/// Parse several ids, failing on the first invalid one.
///
/// # Errors
///
/// Returns `InvalidId` for the first entry that does not parse.
pub fn parse_ids<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<i64>> {
    inputs.iter().map(|s| parse_id(s.as_ref())).collect()
}
