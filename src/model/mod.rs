//! Core data types for `trellis`.
//!
//! This module defines the fundamental types used throughout the application:
//! - `Entity` - The stored row shared by every work item kind
//! - `EntityType` - idea, epic, task, bug, research
//! - `Status` / `Priority` - Lifecycle state and urgency
//! - `ProgressNote` - Append-only annotations
//! - `Idea` / `Epic` / `Task` - Typed hierarchy views built from entities

use crate::error::TrellisError;
use crate::util::id::format_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a stored entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Idea,
    Epic,
    Task,
    Bug,
    Research,
}

impl EntityType {
    /// Every kind that can appear in a dependency list or under an epic.
    pub const TASK_KINDS: [Self; 3] = [Self::Task, Self::Bug, Self::Research];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idea => "idea",
            Self::Epic => "epic",
            Self::Task => "task",
            Self::Bug => "bug",
            Self::Research => "research",
        }
    }

    /// Display prefix used in formatted IDs.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Idea => "IDEA",
            Self::Epic => "EPIC",
            Self::Task => "TSK",
            Self::Bug => "BUG",
            Self::Research => "RND",
        }
    }

    #[must_use]
    pub const fn is_task_kind(&self) -> bool {
        matches!(self, Self::Task | Self::Bug | Self::Research)
    }

    /// The kind a parent of this kind must have, if any parent is allowed.
    #[must_use]
    pub const fn parent_kind(&self) -> Option<Self> {
        match self {
            Self::Idea => None,
            Self::Epic => Some(Self::Idea),
            Self::Task | Self::Bug | Self::Research => Some(Self::Epic),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "idea" => Ok(Self::Idea),
            "epic" => Ok(Self::Epic),
            "task" => Ok(Self::Task),
            "bug" => Ok(Self::Bug),
            "research" => Ok(Self::Research),
            other => Err(TrellisError::validation(
                "type",
                format!("unknown type '{other}' (expected idea, epic, task, bug, research)"),
            )),
        }
    }
}

/// Entity lifecycle status. Any status may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Done,
    Blocked,
    Deferred,
}

impl Status {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Done => "done",
            Self::Blocked => "blocked",
            Self::Deferred => "deferred",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in-progress" | "in_progress" | "inprogress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "blocked" => Ok(Self::Blocked),
            "deferred" => Ok(Self::Deferred),
            other => Err(TrellisError::validation(
                "status",
                format!(
                    "unknown status '{other}' (expected pending, in-progress, done, blocked, deferred)"
                ),
            )),
        }
    }
}

/// Priority level. Ordering is `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(TrellisError::validation(
                "priority",
                format!("unknown priority '{other}' (expected low, medium, high)"),
            )),
        }
    }
}

/// Kind of progress note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    #[default]
    Update,
    Comment,
    Blocker,
    Completion,
}

impl NoteType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Comment => "comment",
            Self::Blocker => "blocker",
            Self::Completion => "completion",
        }
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NoteType {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "update" => Ok(Self::Update),
            "comment" => Ok(Self::Comment),
            "blocker" => Ok(Self::Blocker),
            "completion" => Ok(Self::Completion),
            other => Err(TrellisError::validation(
                "note_type",
                format!("unknown note type '{other}' (expected update, comment, blocker, completion)"),
            )),
        }
    }
}

/// A stored row: one idea, epic, task, bug or research item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: i64,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub parent_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    /// Ordered ids of task-type entities this one waits on.
    pub dependencies: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    #[must_use]
    pub fn formatted_id(&self) -> String {
        format_id(self.id, self.entity_type)
    }
}

/// Append-only, timestamped annotation attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressNote {
    pub id: i64,
    pub entity_id: i64,
    pub content: String,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub timestamp: DateTime<Utc>,
}

/// Top tier of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    pub id: i64,
    pub formatted_id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub epics: Vec<Epic>,
}

impl Idea {
    #[must_use]
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            formatted_id: entity.formatted_id(),
            title: entity.title.clone(),
            description: entity.description.clone(),
            priority: entity.priority,
            status: entity.status,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            epics: Vec::new(),
        }
    }

    #[must_use]
    pub fn task_count(&self) -> usize {
        self.epics.iter().map(|epic| epic.tasks.len()).sum()
    }
}

/// Middle tier; belongs to an idea (or stands alone).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epic {
    pub id: i64,
    pub formatted_id: String,
    pub parent_id: Option<i64>,
    /// Formatted id of the owning idea, or empty when unresolved.
    pub idea_id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tasks: Vec<Task>,
}

impl Epic {
    #[must_use]
    pub fn from_entity(entity: &Entity, idea_id: String) -> Self {
        Self {
            id: entity.id,
            formatted_id: entity.formatted_id(),
            parent_id: entity.parent_id,
            idea_id,
            title: entity.title.clone(),
            description: entity.description.clone(),
            priority: entity.priority,
            status: entity.status,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            tasks: Vec::new(),
        }
    }

    /// Drop a task from the in-memory task list, returning it if present.
    pub fn remove_task(&mut self, task_id: i64) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id == task_id)?;
        Some(self.tasks.remove(index))
    }
}

/// Leaf tier: a task, bug or research item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub formatted_id: String,
    pub kind: EntityType,
    pub parent_id: Option<i64>,
    /// Formatted id of the owning epic, or empty when unresolved.
    pub epic_id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub dependencies: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<ProgressNote>,
}

impl Task {
    #[must_use]
    pub fn from_entity(entity: &Entity, epic_id: String) -> Self {
        Self {
            id: entity.id,
            formatted_id: entity.formatted_id(),
            kind: entity.entity_type,
            parent_id: entity.parent_id,
            epic_id,
            title: entity.title.clone(),
            description: entity.description.clone(),
            priority: entity.priority,
            status: entity.status,
            dependencies: entity.dependencies.clone(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            notes: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status == Status::Done
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending
    }
}
