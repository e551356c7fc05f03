//! Task dependency graph: readiness, blocking and deletability.
//!
//! Dependencies point from a task to the tasks it waits on. A dependency
//! whose target has been deleted is skipped, never an error. Cycles are
//! allowed to exist; [`DependencyGraph::find_cycles`] reports them.

use crate::error::Result;
use crate::model::{Entity, EntityType, Status, Task};
use crate::storage::SqliteStorage;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::trace;

#[derive(Debug, Clone, Copy)]
pub struct DependencyGraph<'a> {
    storage: &'a SqliteStorage,
}

impl<'a> DependencyGraph<'a> {
    #[must_use]
    pub const fn new(storage: &'a SqliteStorage) -> Self {
        Self { storage }
    }

    /// Load each task `task` depends on, in stored order.
    ///
    /// Ids that no longer resolve to a task kind are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage read fails.
    pub fn resolve_dependencies(&self, task: &Task) -> Result<Vec<Task>> {
        let found = self.storage.get_entities(&task.dependencies)?;
        let parent_ids: Vec<i64> = found.values().filter_map(|e| e.parent_id).collect();
        let parents = self.storage.get_entities(&parent_ids)?;

        let mut resolved = Vec::with_capacity(task.dependencies.len());
        for dep_id in &task.dependencies {
            match found.get(dep_id) {
                Some(entity) if entity.entity_type.is_task_kind() => {
                    resolved.push(Task::from_entity(entity, epic_label(&parents, entity)));
                }
                _ => trace!(task = %task.formatted_id, dep_id, "Skipping unresolved dependency"),
            }
        }
        Ok(resolved)
    }

    /// True iff some resolved dependency is not done.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage read fails.
    pub fn is_blocked(&self, task: &Task) -> Result<bool> {
        if task.dependencies.is_empty() {
            return Ok(false);
        }
        Ok(self
            .resolve_dependencies(task)?
            .iter()
            .any(|dep| dep.status != Status::Done))
    }

    /// The unfinished dependencies holding `task` back.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage read fails.
    pub fn blockers(&self, task: &Task) -> Result<Vec<Task>> {
        Ok(self
            .resolve_dependencies(task)?
            .into_iter()
            .filter(|dep| dep.status != Status::Done)
            .collect())
    }

    /// True iff no other task lists `task_id` as a dependency.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage read fails.
    pub fn can_delete(&self, task_id: i64) -> Result<bool> {
        Ok(self.storage.get_dependents(task_id)?.is_empty())
    }

    /// Ids of tasks that depend on `task_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage read fails.
    pub fn dependents(&self, task_id: i64) -> Result<Vec<i64>> {
        self.storage.get_dependents(task_id)
    }

    /// Every dependency cycle currently stored.
    ///
    /// Each cycle is listed from its first visited member and closed by
    /// repeating that member.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge query fails.
    pub fn find_cycles(&self) -> Result<Vec<Vec<i64>>> {
        Ok(find_cycles_in(&self.storage.get_all_dependency_edges()?))
    }
}

fn epic_label(parents: &HashMap<i64, Entity>, entity: &Entity) -> String {
    entity
        .parent_id
        .and_then(|id| parents.get(&id))
        .filter(|parent| parent.entity_type == EntityType::Epic)
        .map(Entity::formatted_id)
        .unwrap_or_default()
}

/// Iterative DFS over an edge list, so deep chains cannot overflow the stack.
#[must_use]
pub fn find_cycles_in(edges: &[(i64, i64)]) -> Vec<Vec<i64>> {
    let mut graph: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
    for &(from, to) in edges {
        graph.entry(from).or_default().push(to);
    }

    let mut cycles = Vec::new();
    let mut visited = HashSet::new();
    let mut on_path = HashSet::new();
    let mut path: Vec<i64> = Vec::new();
    // (node, next neighbor index)
    let mut stack: Vec<(i64, usize)> = Vec::new();

    for &start in graph.keys() {
        if !visited.insert(start) {
            continue;
        }
        stack.push((start, 0));
        on_path.insert(start);
        path.push(start);

        while let Some((node, idx)) = stack.last_mut() {
            let neighbors = graph.get(node).map_or(&[][..], Vec::as_slice);
            if let Some(&next) = neighbors.get(*idx) {
                *idx += 1;
                if on_path.contains(&next) {
                    if let Some(pos) = path.iter().position(|&id| id == next) {
                        let mut cycle = path[pos..].to_vec();
                        cycle.push(next);
                        cycles.push(cycle);
                    }
                } else if visited.insert(next) {
                    on_path.insert(next);
                    path.push(next);
                    stack.push((next, 0));
                }
                continue;
            }

            on_path.remove(node);
            path.pop();
            stack.pop();
        }
    }

    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{EntityUpdate, NewEntity};

    fn task(storage: &mut SqliteStorage, title: &str, deps: Vec<i64>) -> i64 {
        storage
            .create_entity(&NewEntity::new(EntityType::Task, title).dependencies(deps))
            .unwrap()
            .id
    }

    fn view(storage: &SqliteStorage, id: i64) -> Task {
        Task::from_entity(&storage.get_entity(id).unwrap().unwrap(), String::new())
    }

    #[test]
    fn no_dependencies_never_blocked() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let a = task(&mut storage, "a", vec![]);
        assert!(!DependencyGraph::new(&storage).is_blocked(&view(&storage, a)).unwrap());
    }

    #[test]
    fn blocked_until_every_dependency_done() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let a = task(&mut storage, "a", vec![]);
        let b = task(&mut storage, "b", vec![]);
        let c = task(&mut storage, "c", vec![a, b]);

        storage.update_entity(a, &EntityUpdate::status(Status::Done)).unwrap();
        {
            let graph = DependencyGraph::new(&storage);
            assert!(graph.is_blocked(&view(&storage, c)).unwrap());
            let blockers = graph.blockers(&view(&storage, c)).unwrap();
            assert_eq!(blockers.iter().map(|t| t.id).collect::<Vec<_>>(), vec![b]);
        }

        storage.update_entity(b, &EntityUpdate::status(Status::Done)).unwrap();
        assert!(!DependencyGraph::new(&storage).is_blocked(&view(&storage, c)).unwrap());
    }

    #[test]
    fn dangling_dependency_is_skipped() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let a = task(&mut storage, "a", vec![]);
        let b = task(&mut storage, "b", vec![a]);

        let mut stale = view(&storage, b);
        stale.dependencies.push(999);
        let graph = DependencyGraph::new(&storage);
        let resolved = graph.resolve_dependencies(&stale).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, a);
    }

    #[test]
    fn can_delete_tracks_dependents() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let a = task(&mut storage, "a", vec![]);
        let b = task(&mut storage, "b", vec![a]);
        let graph = DependencyGraph::new(&storage);
        assert!(!graph.can_delete(a).unwrap());
        assert!(graph.can_delete(b).unwrap());
        assert_eq!(graph.dependents(a).unwrap(), vec![b]);
    }

    #[test]
    fn self_edge_does_not_block_delete() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let a = task(&mut storage, "a", vec![]);
        storage
            .update_entity(
                a,
                &EntityUpdate {
                    dependencies: Some(vec![a]),
                    ..EntityUpdate::default()
                },
            )
            .unwrap();
        let graph = DependencyGraph::new(&storage);
        assert!(graph.can_delete(a).unwrap());
        assert!(graph.dependents(a).unwrap().is_empty());
    }

    #[test]
    fn finds_cycles_without_preventing_them() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let a = task(&mut storage, "a", vec![]);
        let b = task(&mut storage, "b", vec![a]);
        let update = EntityUpdate {
            dependencies: Some(vec![b]),
            ..Default::default()
        };
        storage.update_entity(a, &update).unwrap();

        let cycles = DependencyGraph::new(&storage).find_cycles().unwrap();
        assert_eq!(cycles, vec![vec![a, b, a]]);
    }

    #[test]
    fn acyclic_edges_report_nothing() {
        assert!(find_cycles_in(&[(3, 2), (2, 1), (3, 1)]).is_empty());
        assert_eq!(find_cycles_in(&[(5, 5)]), vec![vec![5, 5]]);
    }
}
