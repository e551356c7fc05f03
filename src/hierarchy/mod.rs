//! Rebuilds idea → epic → task trees from flat entity rows.
//!
//! Nothing is cached. Every call re-reads the store; parent lookups are
//! fetched in one batch per call.

use crate::error::Result;
use crate::model::{Entity, EntityType, Epic, Idea, Task};
use crate::storage::SqliteStorage;
use std::collections::HashMap;
use tracing::trace;

/// Read-only view over a store that assembles typed domain objects.
#[derive(Debug, Clone, Copy)]
pub struct HierarchyResolver<'a> {
    storage: &'a SqliteStorage,
}

impl<'a> HierarchyResolver<'a> {
    #[must_use]
    pub const fn new(storage: &'a SqliteStorage) -> Self {
        Self { storage }
    }

    /// Load an idea with its epics, each populated with its tasks.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` is absent or not an idea.
    pub fn load_idea(&self, id: i64) -> Result<Idea> {
        let entity = self.storage.get_entity_of(id, &[EntityType::Idea])?;
        let mut idea = Idea::from_entity(&entity);

        let epic_rows = self.storage.get_children(id, &[EntityType::Epic])?;
        for epic_row in &epic_rows {
            let mut epic = Epic::from_entity(epic_row, idea.formatted_id.clone());
            epic.tasks = self.tasks_of(&epic)?;
            idea.epics.push(epic);
        }

        trace!(id = %idea.formatted_id, epics = idea.epics.len(), "Loaded idea");
        Ok(idea)
    }

    /// Load an epic with its tasks.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` is absent or not an epic.
    pub fn load_epic(&self, id: i64) -> Result<Epic> {
        let entity = self.storage.get_entity_of(id, &[EntityType::Epic])?;
        let idea_id = self.parent_label(entity.parent_id, EntityType::Idea)?;
        let mut epic = Epic::from_entity(&entity, idea_id);
        epic.tasks = self.tasks_of(&epic)?;
        Ok(epic)
    }

    /// Load a task, bug or research item with its progress notes.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` is absent or not a task kind.
    pub fn load_task(&self, id: i64) -> Result<Task> {
        let entity = self.storage.get_entity_of(id, &EntityType::TASK_KINDS)?;
        let epic_id = self.parent_label(entity.parent_id, EntityType::Epic)?;
        let mut task = Task::from_entity(&entity, epic_id);
        task.notes = self.storage.get_notes(id)?;
        Ok(task)
    }

    /// Every idea, fully populated, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage read fails.
    pub fn load_all_ideas(&self) -> Result<Vec<Idea>> {
        let mut epics_by_idea: HashMap<i64, Vec<Epic>> = HashMap::new();
        for epic in self.load_all_epics()? {
            if let Some(parent_id) = epic.parent_id {
                epics_by_idea.entry(parent_id).or_default().push(epic);
            }
        }

        let ideas = self
            .storage
            .get_entities_by_type(EntityType::Idea)?
            .iter()
            .map(|entity| {
                let mut idea = Idea::from_entity(entity);
                idea.epics = epics_by_idea.remove(&entity.id).unwrap_or_default();
                idea
            })
            .collect();
        Ok(ideas)
    }

    /// Every epic with its tasks and resolved idea id, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage read fails.
    pub fn load_all_epics(&self) -> Result<Vec<Epic>> {
        let rows = self.storage.get_entities_by_type(EntityType::Epic)?;
        let parents = self.parents_of(&rows)?;

        let mut tasks_by_epic: HashMap<i64, Vec<Task>> = HashMap::new();
        for task in self.load_all_tasks()? {
            if let Some(parent_id) = task.parent_id {
                tasks_by_epic.entry(parent_id).or_default().push(task);
            }
        }

        let epics = rows
            .iter()
            .map(|entity| {
                let idea_id = label_for(&parents, entity.parent_id, EntityType::Idea);
                let mut epic = Epic::from_entity(entity, idea_id);
                epic.tasks = tasks_by_epic.remove(&entity.id).unwrap_or_default();
                epic
            })
            .collect();
        Ok(epics)
    }

    /// Every task, bug and research item merged and ordered by id.
    ///
    /// Notes are not loaded; use [`HierarchyResolver::load_task`] for those.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage read fails.
    pub fn load_all_tasks(&self) -> Result<Vec<Task>> {
        let rows = self.storage.get_entities_by_types(&EntityType::TASK_KINDS)?;
        let parents = self.parents_of(&rows)?;

        Ok(rows
            .iter()
            .map(|entity| {
                Task::from_entity(entity, label_for(&parents, entity.parent_id, EntityType::Epic))
            })
            .collect())
    }

    fn tasks_of(&self, epic: &Epic) -> Result<Vec<Task>> {
        Ok(self
            .storage
            .get_children(epic.id, &EntityType::TASK_KINDS)?
            .iter()
            .map(|row| Task::from_entity(row, epic.formatted_id.clone()))
            .collect())
    }

    fn parent_label(&self, parent_id: Option<i64>, expected: EntityType) -> Result<String> {
        let Some(parent_id) = parent_id else {
            return Ok(String::new());
        };
        Ok(self
            .storage
            .get_entity(parent_id)?
            .filter(|parent| parent.entity_type == expected)
            .map(|parent| parent.formatted_id())
            .unwrap_or_default())
    }

    fn parents_of(&self, rows: &[Entity]) -> Result<HashMap<i64, Entity>> {
        let ids: Vec<i64> = rows.iter().filter_map(|row| row.parent_id).collect();
        self.storage.get_entities(&ids)
    }
}

/// Formatted id of a type-matched parent, or empty.
fn label_for(parents: &HashMap<i64, Entity>, parent_id: Option<i64>, expected: EntityType) -> String {
    parent_id
        .and_then(|id| parents.get(&id))
        .filter(|parent| parent.entity_type == expected)
        .map(Entity::formatted_id)
        .unwrap_or_default()
}
