//! Next-task selection.
//!
//! Selection is a pure function over a snapshot of every task: it never
//! touches storage and can be called repeatedly with the same result.

use crate::model::{Priority, Status, Task};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Outcome of a scheduling decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "task", rename_all = "snake_case")]
pub enum NextTask {
    /// The single task that should be worked on next.
    Selected(Task),
    /// No task is pending (including an empty snapshot).
    NoPendingTasks,
    /// Pending tasks exist, but none has the requested priority.
    NoMatchingPriority,
    /// Every remaining candidate waits on an unfinished dependency.
    AllBlocked,
}

impl NextTask {
    #[must_use]
    pub const fn task(&self) -> Option<&Task> {
        match self {
            Self::Selected(task) => Some(task),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_task(self) -> Option<Task> {
        match self {
            Self::Selected(task) => Some(task),
            _ => None,
        }
    }

    /// Human-readable reason when nothing was selected.
    #[must_use]
    pub const fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Selected(_) => None,
            Self::NoPendingTasks => Some("No pending tasks"),
            Self::NoMatchingPriority => Some("No pending tasks match the requested priority"),
            Self::AllBlocked => Some("All pending tasks are blocked by unfinished dependencies"),
        }
    }
}

/// Pick the next task from `tasks`.
///
/// Candidates are pending, match `priority` when given, and are not
/// blocked. The winner has the highest priority, then the oldest
/// `created_at`, then the lowest id.
#[must_use]
pub fn select_next(tasks: &[Task], priority: Option<Priority>) -> NextTask {
    let pending: Vec<&Task> = tasks.iter().filter(|t| t.status == Status::Pending).collect();
    if pending.is_empty() {
        debug!(total = tasks.len(), "No pending tasks");
        return NextTask::NoPendingTasks;
    }

    let matching: Vec<&Task> = pending
        .into_iter()
        .filter(|t| priority.is_none_or(|p| t.priority == p))
        .collect();
    if matching.is_empty() {
        debug!(?priority, "No pending tasks at requested priority");
        return NextTask::NoMatchingPriority;
    }

    let statuses = status_index(tasks);
    let mut ready: Vec<&Task> = matching
        .into_iter()
        .filter(|t| !is_blocked_in(t, &statuses))
        .collect();
    if ready.is_empty() {
        debug!(?priority, "All candidate tasks are blocked");
        return NextTask::AllBlocked;
    }

    ready.sort_by(|a, b| schedule_order(a, b));
    let chosen = ready[0].clone();
    debug!(
        id = %chosen.formatted_id,
        priority = %chosen.priority,
        candidates = ready.len(),
        "Selected next task"
    );
    NextTask::Selected(chosen)
}

/// Every eligible candidate in selection order.
#[must_use]
pub fn rank_candidates(tasks: &[Task], priority: Option<Priority>) -> Vec<&Task> {
    let statuses = status_index(tasks);
    let mut ready: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.status == Status::Pending)
        .filter(|t| priority.is_none_or(|p| t.priority == p))
        .filter(|t| !is_blocked_in(t, &statuses))
        .collect();
    ready.sort_by(|a, b| schedule_order(a, b));
    ready
}

/// True iff a dependency present in `statuses` is not done.
///
/// Dependencies absent from the snapshot are skipped.
#[must_use]
pub fn is_blocked_in(task: &Task, statuses: &HashMap<i64, Status>) -> bool {
    let blocked = task
        .dependencies
        .iter()
        .filter_map(|id| statuses.get(id))
        .any(|status| *status != Status::Done);
    if blocked {
        trace!(id = %task.formatted_id, "Task is blocked");
    }
    blocked
}

fn status_index(tasks: &[Task]) -> HashMap<i64, Status> {
    tasks.iter().map(|t| (t.id, t.status)).collect()
}

fn schedule_order(a: &Task, b: &Task) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityType;
    use chrono::{Duration, TimeZone, Utc};

    fn task(id: i64, priority: Priority, age_minutes: i64, deps: Vec<i64>) -> Task {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let created = base - Duration::minutes(age_minutes);
        Task {
            id,
            formatted_id: format!("TSK-{id}"),
            kind: EntityType::Task,
            parent_id: None,
            epic_id: String::new(),
            title: format!("task {id}"),
            description: String::new(),
            priority,
            status: Status::Pending,
            dependencies: deps,
            created_at: created,
            updated_at: created,
            notes: vec![],
        }
    }

    #[test]
    fn empty_snapshot_has_no_pending() {
        assert_eq!(select_next(&[], None), NextTask::NoPendingTasks);
    }

    #[test]
    fn only_done_tasks_has_no_pending() {
        let mut t = task(1, Priority::High, 0, vec![]);
        t.status = Status::Done;
        assert_eq!(select_next(&[t], None), NextTask::NoPendingTasks);
    }

    #[test]
    fn filter_miss_is_distinct_from_blocked() {
        let tasks = vec![task(1, Priority::Low, 0, vec![])];
        assert_eq!(
            select_next(&tasks, Some(Priority::High)),
            NextTask::NoMatchingPriority
        );
    }

    #[test]
    fn all_blocked_reported() {
        let mut dep = task(1, Priority::Low, 5, vec![]);
        dep.status = Status::InProgress;
        let tasks = vec![dep, task(2, Priority::High, 0, vec![1])];
        assert_eq!(select_next(&tasks, Some(Priority::High)), NextTask::AllBlocked);
    }

    #[test]
    fn highest_priority_wins_regardless_of_age() {
        let tasks = vec![
            task(1, Priority::Low, 30, vec![]),
            task(2, Priority::Medium, 20, vec![]),
            task(3, Priority::High, 10, vec![]),
        ];
        assert_eq!(select_next(&tasks, None).task().map(|t| t.id), Some(3));
    }

    #[test]
    fn oldest_wins_within_priority() {
        let tasks = vec![
            task(1, Priority::High, 1, vec![]),
            task(2, Priority::High, 60, vec![]),
        ];
        assert_eq!(select_next(&tasks, None).task().map(|t| t.id), Some(2));
    }

    #[test]
    fn id_breaks_exact_ties() {
        let tasks = vec![
            task(9, Priority::Medium, 5, vec![]),
            task(4, Priority::Medium, 5, vec![]),
        ];
        assert_eq!(select_next(&tasks, None).task().map(|t| t.id), Some(4));
    }

    #[test]
    fn dependency_missing_from_snapshot_does_not_block() {
        let tasks = vec![task(2, Priority::High, 0, vec![404])];
        assert_eq!(select_next(&tasks, None).task().map(|t| t.id), Some(2));
    }

    #[test]
    fn rank_candidates_orders_ready_tasks() {
        let tasks = vec![
            task(1, Priority::Low, 30, vec![]),
            task(2, Priority::High, 0, vec![1]),
            task(3, Priority::Medium, 20, vec![]),
        ];
        let ranked: Vec<i64> = rank_candidates(&tasks, None).iter().map(|t| t.id).collect();
        assert_eq!(ranked, vec![3, 1]);
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let json = serde_json::to_value(NextTask::AllBlocked).unwrap();
        assert_eq!(json["outcome"], "all_blocked");
    }
}
