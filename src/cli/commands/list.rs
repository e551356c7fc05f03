//! List command implementation.

use super::{open_tracker, parse_priority};
use crate::cli::ListArgs;
use crate::config;
use crate::error::{Result, TrellisError};
use crate::model::{EntityType, Priority, Status};
use crate::output::{OutputContext, type_badge};
use crate::tracker::Tracker;
use serde::Serialize;
use std::str::FromStr;
use tracing::debug;

/// One row of list output, shared by every entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRow {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntityType,
    pub title: String,
    pub status: Status,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// Which kinds a `--type` value selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListScope {
    Ideas,
    Epics,
    Tasks(Option<EntityType>),
}

impl FromStr for ListScope {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self> {
        if matches!(s.trim().to_lowercase().as_str(), "all-tasks" | "all") {
            return Ok(Self::Tasks(None));
        }
        Ok(match EntityType::from_str(s)? {
            EntityType::Idea => Self::Ideas,
            EntityType::Epic => Self::Epics,
            kind => Self::Tasks(Some(kind)),
        })
    }
}

/// Execute the list command.
///
/// # Errors
///
/// Returns an error for unparseable filters or a failed load.
pub fn execute(args: &ListArgs, ctx: &OutputContext, cli: &config::CliOverrides) -> Result<()> {
    let scope = ListScope::from_str(&args.entity_type)?;
    let status = args.status.as_deref().map(Status::from_str).transpose()?;
    let priority = parse_priority(args.priority.as_deref())?;

    let (tracker, _layer) = open_tracker(cli)?;
    let rows: Vec<ListRow> = load_rows(&tracker, scope)?
        .into_iter()
        .filter(|row| status.is_none_or(|s| row.status == s))
        .filter(|row| priority.is_none_or(|p| row.priority == p))
        .collect();
    debug!(?scope, count = rows.len(), "Listed entities");

    if ctx.is_json() {
        ctx.json_pretty(&rows);
    } else if rows.is_empty() {
        ctx.print("No matching entities");
    } else {
        for row in &rows {
            let mut line = ctx.entity_line(&row.id, row.status, row.priority, &row.title);
            if matches!(scope, ListScope::Tasks(None)) {
                line = format!("{line} {}", type_badge(row.kind));
            }
            ctx.print(&line);
        }
    }
    Ok(())
}

fn load_rows(tracker: &Tracker, scope: ListScope) -> Result<Vec<ListRow>> {
    let rows = match scope {
        ListScope::Ideas => tracker
            .load_all_ideas()?
            .into_iter()
            .map(|idea| ListRow {
                id: idea.formatted_id,
                kind: EntityType::Idea,
                title: idea.title,
                status: idea.status,
                priority: idea.priority,
                parent: None,
            })
            .collect(),
        ListScope::Epics => tracker
            .load_all_epics()?
            .into_iter()
            .map(|epic| ListRow {
                id: epic.formatted_id,
                kind: EntityType::Epic,
                title: epic.title,
                status: epic.status,
                priority: epic.priority,
                parent: non_empty(epic.idea_id),
            })
            .collect(),
        ListScope::Tasks(kind) => tracker
            .load_all_tasks()?
            .into_iter()
            .filter(|task| kind.is_none_or(|k| task.kind == k))
            .map(|task| ListRow {
                id: task.formatted_id,
                kind: task.kind,
                title: task.title,
                status: task.status,
                priority: task.priority,
                parent: non_empty(task.epic_id),
            })
            .collect(),
    };
    Ok(rows)
}

fn non_empty(label: String) -> Option<String> {
    (!label.is_empty()).then_some(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NewEntity;

    #[test]
    fn scope_parses_kinds() {
        assert_eq!(ListScope::from_str("all-tasks").unwrap(), ListScope::Tasks(None));
        assert_eq!(ListScope::from_str("idea").unwrap(), ListScope::Ideas);
        assert_eq!(
            ListScope::from_str("BUG").unwrap(),
            ListScope::Tasks(Some(EntityType::Bug))
        );
        assert!(ListScope::from_str("story").is_err());
    }

    #[test]
    fn rows_carry_parent_labels() {
        let mut tracker = Tracker::open_memory().unwrap();
        let epic = tracker
            .create_epic(None, "Loose epic", "", Priority::Low)
            .unwrap();
        tracker
            .create_task(&NewEntity::new(EntityType::Bug, "Crash").parent(epic.id))
            .unwrap();
        tracker
            .create_task(&NewEntity::new(EntityType::Research, "Spike"))
            .unwrap();

        let epics = load_rows(&tracker, ListScope::Epics).unwrap();
        assert_eq!(epics[0].parent, None);

        let bugs = load_rows(&tracker, ListScope::Tasks(Some(EntityType::Bug))).unwrap();
        assert_eq!(bugs.len(), 1);
        assert_eq!(bugs[0].id, "BUG-2");
        assert_eq!(bugs[0].parent.as_deref(), Some("EPIC-1"));

        let all = load_rows(&tracker, ListScope::Tasks(None)).unwrap();
        assert_eq!(all.len(), 2);
    }
}
