//! Collaborator-facing operations over one store handle.

use crate::cascade::{CascadeDeleter, DeleteReport};
use crate::error::{Result, TrellisError};
use crate::graph::DependencyGraph;
use crate::hierarchy::HierarchyResolver;
use crate::model::{Entity, EntityType, Epic, Idea, NoteType, Priority, ProgressNote, Status, Task};
use crate::scheduler::{self, NextTask};
use crate::storage::{EntityUpdate, NewEntity, SqliteStorage};
use std::path::Path;
use tracing::info;

/// The work tracker: create, load, update and delete entities, and pick
/// the next task.
#[derive(Debug)]
pub struct Tracker {
    storage: SqliteStorage,
}

impl Tracker {
    #[must_use]
    pub const fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    /// Open the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: &Path, lock_timeout_ms: Option<u64>) -> Result<Self> {
        Ok(Self::new(SqliteStorage::open_with_timeout(
            path,
            lock_timeout_ms,
        )?))
    }

    /// In-memory tracker for tests and scratch use.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn open_memory() -> Result<Self> {
        Ok(Self::new(SqliteStorage::open_memory()?))
    }

    #[must_use]
    pub const fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    #[must_use]
    pub const fn resolver(&self) -> HierarchyResolver<'_> {
        HierarchyResolver::new(&self.storage)
    }

    #[must_use]
    pub const fn graph(&self) -> DependencyGraph<'_> {
        DependencyGraph::new(&self.storage)
    }

    // ===== Create =====

    /// # Errors
    ///
    /// Returns `Validation` for bad fields.
    pub fn create_idea(&mut self, title: &str, description: &str, priority: Priority) -> Result<Idea> {
        let entity = self.storage.create_entity(
            &NewEntity::new(EntityType::Idea, title)
                .description(description)
                .priority(priority),
        )?;
        Ok(Idea::from_entity(&entity))
    }

    /// # Errors
    ///
    /// `NotFound` / `InvalidParent` when `idea_id` is not an existing idea.
    pub fn create_epic(
        &mut self,
        idea_id: Option<i64>,
        title: &str,
        description: &str,
        priority: Priority,
    ) -> Result<Epic> {
        let mut new = NewEntity::new(EntityType::Epic, title)
            .description(description)
            .priority(priority);
        new.parent_id = idea_id;
        let entity = self.storage.create_entity(&new)?;
        self.resolver().load_epic(entity.id)
    }

    /// Create a task, bug or research item.
    ///
    /// # Errors
    ///
    /// - `NotFound` / `InvalidParent` when `epic_id` is not an existing epic
    /// - `UnknownDependency` when a dependency is not an existing task kind
    pub fn create_task(&mut self, new: &NewEntity) -> Result<Task> {
        if !new.entity_type.is_task_kind() {
            return Err(TrellisError::validation(
                "type",
                format!("'{}' is not a task kind", new.entity_type),
            ));
        }
        let entity = self.storage.create_entity(new)?;
        self.resolver().load_task(entity.id)
    }

    // ===== Read =====

    /// Any entity by id.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent.
    pub fn get(&self, id: i64) -> Result<Entity> {
        self.storage
            .get_entity(id)?
            .ok_or_else(|| TrellisError::not_found(id.to_string()))
    }

    /// # Errors
    ///
    /// `NotFound` if absent or not an idea.
    pub fn load_idea(&self, id: i64) -> Result<Idea> {
        self.resolver().load_idea(id)
    }

    /// # Errors
    ///
    /// `NotFound` if absent or not an epic.
    pub fn load_epic(&self, id: i64) -> Result<Epic> {
        self.resolver().load_epic(id)
    }

    /// # Errors
    ///
    /// `NotFound` if absent or not a task kind.
    pub fn load_task(&self, id: i64) -> Result<Task> {
        self.resolver().load_task(id)
    }

    /// # Errors
    ///
    /// Returns an error if a storage read fails.
    pub fn load_all_ideas(&self) -> Result<Vec<Idea>> {
        self.resolver().load_all_ideas()
    }

    /// # Errors
    ///
    /// Returns an error if a storage read fails.
    pub fn load_all_epics(&self) -> Result<Vec<Epic>> {
        self.resolver().load_all_epics()
    }

    /// # Errors
    ///
    /// Returns an error if a storage read fails.
    pub fn load_all_tasks(&self) -> Result<Vec<Task>> {
        self.resolver().load_all_tasks()
    }

    /// The resolved dependencies of a task, skipping ids that no longer exist.
    ///
    /// # Errors
    ///
    /// `NotFound` if `task_id` is not a task kind.
    pub fn get_dependencies(&self, task_id: i64) -> Result<Vec<Task>> {
        let task = self.load_task(task_id)?;
        self.graph().resolve_dependencies(&task)
    }

    /// The next task to work on, optionally restricted to one priority.
    ///
    /// # Errors
    ///
    /// Returns an error if loading the task snapshot fails.
    pub fn next_task(&self, priority: Option<Priority>) -> Result<NextTask> {
        let tasks = self.load_all_tasks()?;
        Ok(scheduler::select_next(&tasks, priority))
    }

    /// Every eligible task in the order `next_task` would pick them.
    ///
    /// # Errors
    ///
    /// Returns an error if loading the task snapshot fails.
    pub fn ranked_tasks(&self, priority: Option<Priority>) -> Result<Vec<Task>> {
        let tasks = self.load_all_tasks()?;
        Ok(scheduler::rank_candidates(&tasks, priority)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Dependency cycles currently stored, as id lists.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge query fails.
    pub fn find_cycles(&self) -> Result<Vec<Vec<i64>>> {
        self.graph().find_cycles()
    }

    // ===== Update =====

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Validation`, `InvalidParent` or `UnknownDependency`.
    pub fn update(&mut self, id: i64, update: &EntityUpdate) -> Result<Entity> {
        self.storage.update_entity(id, update)
    }

    /// # Errors
    ///
    /// `NotFound` if absent.
    pub fn set_status(&mut self, id: i64, status: Status) -> Result<Entity> {
        self.storage.update_entity(id, &EntityUpdate::status(status))
    }

    /// Append a progress note to any entity.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `Validation` for empty content.
    pub fn add_progress_note(
        &mut self,
        id: i64,
        content: &str,
        note_type: NoteType,
    ) -> Result<ProgressNote> {
        self.storage.add_note(id, content, note_type)
    }

    // ===== Delete =====

    /// Delete any entity, cascading by its kind.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `HasDependents` if a task outside the deleted
    /// subtree depends on one inside it.
    pub fn delete(&mut self, id: i64) -> Result<DeleteReport> {
        let kind = self.get(id)?.entity_type;
        let mut deleter = CascadeDeleter::new(&mut self.storage);
        let report = match kind {
            EntityType::Idea => deleter.delete_idea(id)?,
            EntityType::Epic => deleter.delete_epic(id)?,
            EntityType::Task | EntityType::Bug | EntityType::Research => {
                deleter.delete_task(id, None)?
            }
        };
        info!(root = %report.root, removed = report.deleted.len(), "Delete complete");
        Ok(report)
    }

    /// Delete a task and drop it from a caller-held epic view.
    ///
    /// # Errors
    ///
    /// `NotFound` or `HasDependents`.
    pub fn delete_task(&mut self, id: i64, holder: Option<&mut Epic>) -> Result<DeleteReport> {
        CascadeDeleter::new(&mut self.storage).delete_task(id, holder)
    }
}
