//! Hierarchy-aware deletes.
//!
//! Deleting an idea removes its epics and their tasks; deleting an epic
//! removes its tasks. Progress notes go with their owners. A task another
//! task depends on can only go when that dependent goes in the same
//! cascade. Each cascade is one transaction.

use crate::error::Result;
use crate::model::{Entity, EntityType, Epic};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::info;

/// What a delete removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    /// Formatted id of the entity the caller asked to delete.
    pub root: String,
    /// Formatted ids in deletion order (the root last).
    pub deleted: Vec<String>,
    pub notes: usize,
    pub dependency_edges: usize,
}

impl DeleteReport {
    #[must_use]
    pub fn count_of(&self, kind: EntityType) -> usize {
        let prefix = format!("{}-", kind.prefix());
        self.deleted.iter().filter(|id| id.starts_with(&prefix)).count()
    }
}

/// Applies cascading deletes through one store handle.
#[derive(Debug)]
pub struct CascadeDeleter<'a> {
    storage: &'a mut SqliteStorage,
}

impl<'a> CascadeDeleter<'a> {
    pub const fn new(storage: &'a mut SqliteStorage) -> Self {
        Self { storage }
    }

    /// Delete one task, bug or research item.
    ///
    /// When `holder` is the task's epic, the task is also dropped from its
    /// in-memory task list.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `id` is absent or not a task kind
    /// - `HasDependents` if another task depends on it
    pub fn delete_task(&mut self, id: i64, holder: Option<&mut Epic>) -> Result<DeleteReport> {
        let task = self.storage.get_entity_of(id, &EntityType::TASK_KINDS)?;
        let report = self.delete_ordered(&task, vec![task.clone()])?;

        if let Some(epic) = holder {
            if task.parent_id == Some(epic.id) {
                epic.remove_task(id);
            }
        }
        Ok(report)
    }

    /// Delete an epic with all of its tasks.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `id` is absent or not an epic
    /// - `HasDependents` if a task outside the epic depends on one inside it
    pub fn delete_epic(&mut self, id: i64) -> Result<DeleteReport> {
        let epic = self.storage.get_entity_of(id, &[EntityType::Epic])?;
        let tasks = self.storage.get_children(id, &EntityType::TASK_KINDS)?;

        let mut order = dependents_first(tasks);
        order.push(epic.clone());
        let report = self.delete_ordered(&epic, order)?;

        info!(
            epic = %report.root,
            tasks = report.deleted.len() - 1,
            notes = report.notes,
            "Deleted epic"
        );
        Ok(report)
    }

    /// Delete an idea with all of its epics and their tasks.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `id` is absent or not an idea
    /// - `HasDependents` if a task outside the idea depends on one inside it
    pub fn delete_idea(&mut self, id: i64) -> Result<DeleteReport> {
        let idea = self.storage.get_entity_of(id, &[EntityType::Idea])?;
        let epics = self.storage.get_children(id, &[EntityType::Epic])?;

        let mut tasks = Vec::new();
        for epic in &epics {
            tasks.extend(self.storage.get_children(epic.id, &EntityType::TASK_KINDS)?);
        }

        let mut order = dependents_first(tasks);
        order.extend(epics);
        order.push(idea.clone());
        let report = self.delete_ordered(&idea, order)?;

        info!(
            idea = %report.root,
            epics = report.count_of(EntityType::Epic),
            entities = report.deleted.len(),
            notes = report.notes,
            "Deleted idea"
        );
        Ok(report)
    }

    fn delete_ordered(&mut self, root: &Entity, order: Vec<Entity>) -> Result<DeleteReport> {
        let ids: Vec<i64> = order.iter().map(|e| e.id).collect();
        let counts = self.storage.delete_entities(&ids)?;

        Ok(DeleteReport {
            root: root.formatted_id(),
            deleted: order.iter().map(Entity::formatted_id).collect(),
            notes: counts.notes,
            dependency_edges: counts.dependency_edges,
        })
    }
}

/// Order tasks so each comes before every task it depends on.
///
/// Only edges inside `tasks` count. Members of a cycle, which have no such
/// order, are appended by id.
fn dependents_first(tasks: Vec<Entity>) -> Vec<Entity> {
    let members: HashSet<i64> = tasks.iter().map(|t| t.id).collect();

    // Remaining in-set dependents per task.
    let mut dependents: HashMap<i64, usize> = tasks.iter().map(|t| (t.id, 0)).collect();
    for task in &tasks {
        for dep in task.dependencies.iter().filter(|d| members.contains(d)) {
            if let Some(count) = dependents.get_mut(dep) {
                *count += 1;
            }
        }
    }

    let mut by_id: HashMap<i64, Entity> = tasks.into_iter().map(|t| (t.id, t)).collect();
    let mut ready: BTreeSet<i64> = dependents
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut ordered = Vec::with_capacity(by_id.len());

    while let Some(id) = ready.pop_first() {
        let Some(task) = by_id.remove(&id) else {
            continue;
        };
        for dep in task.dependencies.iter().filter(|d| members.contains(d)) {
            if let Some(count) = dependents.get_mut(dep) {
                *count = count.saturating_sub(1);
                if *count == 0 && by_id.contains_key(dep) {
                    ready.insert(*dep);
                }
            }
        }
        ordered.push(task);
    }

    let mut cyclic: Vec<Entity> = by_id.into_values().collect();
    cyclic.sort_by_key(|t| t.id);
    ordered.extend(cyclic);
    ordered
}
