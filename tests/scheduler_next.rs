//! Next-task selection, against in-memory snapshots and a real store.

mod common;

use chrono::Duration;
use common::fixtures::{TaskBuilder, base_time};
use common::{test_log, test_tracker};
use trellis::model::{EntityType, Priority, Status};
use trellis::scheduler::{NextTask, rank_candidates, select_next};
use trellis::storage::NewEntity;

fn selected_id(next: &NextTask) -> Option<i64> {
    next.task().map(|task| task.id)
}

#[test]
fn empty_snapshot_has_no_pending_tasks() {
    let _log = test_log("empty_snapshot_has_no_pending_tasks");
    assert_eq!(select_next(&[], None), NextTask::NoPendingTasks);
    assert_eq!(select_next(&[], Some(Priority::High)), NextTask::NoPendingTasks);
}

#[test]
fn only_pending_tasks_are_candidates() {
    let tasks = vec![
        TaskBuilder::new(1).with_status(Status::InProgress).build(),
        TaskBuilder::new(2).with_status(Status::Blocked).build(),
        TaskBuilder::new(3).with_status(Status::Deferred).build(),
        TaskBuilder::new(4).with_status(Status::Done).build(),
    ];
    assert_eq!(select_next(&tasks, None), NextTask::NoPendingTasks);
}

#[test]
fn highest_priority_wins_regardless_of_creation_order() {
    let tasks = vec![
        TaskBuilder::new(1).with_priority(Priority::Low).build(),
        TaskBuilder::new(2).with_priority(Priority::Medium).build(),
        TaskBuilder::new(3).with_priority(Priority::High).build(),
    ];
    assert_eq!(selected_id(&select_next(&tasks, None)), Some(3));
}

#[test]
fn oldest_wins_within_a_priority() {
    let t1 = base_time();
    let t2 = base_time() + Duration::minutes(5);
    let tasks = vec![
        TaskBuilder::new(1).created_at(t2).build(),
        TaskBuilder::new(2).created_at(t1).build(),
    ];
    assert_eq!(selected_id(&select_next(&tasks, None)), Some(2));
}

#[test]
fn identical_timestamps_break_ties_by_id() {
    let at = base_time();
    let tasks = vec![
        TaskBuilder::new(9).created_at(at).build(),
        TaskBuilder::new(4).created_at(at).build(),
        TaskBuilder::new(6).created_at(at).build(),
    ];
    assert_eq!(selected_id(&select_next(&tasks, None)), Some(4));
}

#[test]
fn priority_filter_restricts_candidates() {
    let tasks = vec![
        TaskBuilder::new(1).with_priority(Priority::High).build(),
        TaskBuilder::new(2).with_priority(Priority::Low).build(),
    ];
    assert_eq!(
        selected_id(&select_next(&tasks, Some(Priority::Low))),
        Some(2)
    );
    assert_eq!(
        select_next(&tasks, Some(Priority::Medium)),
        NextTask::NoMatchingPriority
    );
}

#[test]
fn blocked_tasks_are_skipped_until_all_blocked() {
    let tasks = vec![
        TaskBuilder::new(1)
            .with_priority(Priority::Low)
            .with_status(Status::InProgress)
            .build(),
        TaskBuilder::new(2)
            .with_priority(Priority::High)
            .depends_on(&[1])
            .build(),
        TaskBuilder::new(3)
            .with_priority(Priority::Low)
            .build(),
    ];
    assert_eq!(selected_id(&select_next(&tasks, None)), Some(3));
    assert_eq!(
        select_next(&tasks, Some(Priority::High)),
        NextTask::AllBlocked
    );
}

#[test]
fn dependency_missing_from_snapshot_does_not_block() {
    let tasks = vec![TaskBuilder::new(5).depends_on(&[404]).build()];
    assert_eq!(selected_id(&select_next(&tasks, None)), Some(5));
}

#[test]
fn selection_is_repeatable() {
    let tasks = vec![
        TaskBuilder::new(1).with_priority(Priority::Medium).build(),
        TaskBuilder::new(2).with_priority(Priority::High).build(),
    ];
    let first = select_next(&tasks, None);
    assert_eq!(select_next(&tasks, None), first);
}

#[test]
fn ranking_lists_ready_tasks_in_selection_order() {
    let tasks = vec![
        TaskBuilder::new(1).with_priority(Priority::Low).build(),
        TaskBuilder::new(2).with_priority(Priority::High).build(),
        TaskBuilder::new(3).with_priority(Priority::High).depends_on(&[1]).build(),
        TaskBuilder::new(4).with_priority(Priority::Medium).build(),
    ];
    let ids: Vec<i64> = rank_candidates(&tasks, None).iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2, 4, 1]);
    assert_eq!(ids[0], selected_id(&select_next(&tasks, None)).unwrap());
}

#[test]
fn outcome_serializes_with_tag() {
    let json = serde_json::to_value(NextTask::AllBlocked).unwrap();
    assert_eq!(json["outcome"], "all_blocked");

    let selected = serde_json::to_value(NextTask::Selected(TaskBuilder::new(7).build())).unwrap();
    assert_eq!(selected["outcome"], "selected");
    assert_eq!(selected["task"]["formatted_id"], "TSK-7");
}

// ============================================================================
// Through the store
// ============================================================================

#[test]
fn dependency_chain_unblocks_when_finished() {
    let _log = test_log("dependency_chain_unblocks_when_finished");
    let mut tracker = test_tracker();

    let idea = tracker.create_idea("I1", "", Priority::Medium).unwrap();
    let epic = tracker
        .create_epic(Some(idea.id), "E1", "", Priority::Medium)
        .unwrap();
    let t1 = tracker
        .create_task(
            &NewEntity::new(EntityType::Task, "T1")
                .priority(Priority::High)
                .parent(epic.id),
        )
        .unwrap();
    let t2 = tracker
        .create_task(
            &NewEntity::new(EntityType::Task, "T2")
                .priority(Priority::High)
                .parent(epic.id)
                .dependencies(vec![t1.id]),
        )
        .unwrap();

    let first = tracker.next_task(None).unwrap().into_task().unwrap();
    assert_eq!(first.id, t1.id);
    assert_eq!(first.epic_id, epic.formatted_id);

    tracker.set_status(t1.id, Status::Done).unwrap();
    let second = tracker.next_task(None).unwrap().into_task().unwrap();
    assert_eq!(second.id, t2.id);

    tracker.set_status(t2.id, Status::Done).unwrap();
    assert_eq!(tracker.next_task(None).unwrap(), NextTask::NoPendingTasks);
}

#[test]
fn high_priority_wins_in_store() {
    let mut tracker = test_tracker();
    for (title, priority) in [
        ("low", Priority::Low),
        ("medium", Priority::Medium),
        ("high", Priority::High),
    ] {
        tracker
            .create_task(&NewEntity::new(EntityType::Task, title).priority(priority))
            .unwrap();
    }

    let next = tracker.next_task(None).unwrap();
    assert_eq!(next.task().unwrap().title, "high");
    assert_eq!(tracker.ranked_tasks(None).unwrap().len(), 3);
}

#[test]
fn bugs_and_research_are_scheduled_like_tasks() {
    let mut tracker = test_tracker();
    let bug = tracker
        .create_task(&NewEntity::new(EntityType::Bug, "crash").priority(Priority::High))
        .unwrap();
    tracker
        .create_task(&NewEntity::new(EntityType::Research, "spike").priority(Priority::Medium))
        .unwrap();

    let next = tracker.next_task(None).unwrap().into_task().unwrap();
    assert_eq!(next.formatted_id, bug.formatted_id);
    assert_eq!(next.kind, EntityType::Bug);
}
