//! `SQLite` storage layer for `trellis`.
//!
//! One polymorphic `entities` table, an ordered `task_dependencies` join
//! table, append-only `progress_notes`, and a `metadata` key/value table.

pub mod schema;
pub mod sqlite;

pub use sqlite::{DeleteCounts, EntityUpdate, NewEntity, SqliteStorage};
