#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use trellis::model::{EntityType, Priority, Status, Task};

/// Fixed base time so fixtures sort deterministically.
pub fn base_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_735_689_600, 0).unwrap() // 2025-01-01 00:00:00 UTC
}

/// In-memory task for scheduler tests; never touches storage.
pub fn task(id: i64, title: &str) -> Task {
    let created = base_time() + Duration::seconds(id);
    Task {
        id,
        formatted_id: format!("TSK-{id}"),
        kind: EntityType::Task,
        parent_id: None,
        epic_id: String::new(),
        title: title.to_string(),
        description: String::new(),
        priority: Priority::Medium,
        status: Status::Pending,
        dependencies: vec![],
        created_at: created,
        updated_at: created,
        notes: vec![],
    }
}

pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            task: task(id, &format!("task {id}")),
        }
    }

    #[allow(clippy::missing_const_for_fn)]
    pub fn with_priority(mut self, p: Priority) -> Self {
        self.task.priority = p;
        self
    }

    #[allow(clippy::missing_const_for_fn)]
    pub fn with_status(mut self, s: Status) -> Self {
        self.task.status = s;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.task.created_at = at;
        self.task.updated_at = at;
        self
    }

    pub fn depends_on(mut self, ids: &[i64]) -> Self {
        self.task.dependencies = ids.to_vec();
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}
