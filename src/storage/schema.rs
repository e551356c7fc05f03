//! Database schema definitions and migration logic.

use crate::error::Result;
use crate::util::time::format_timestamp;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the trellis database.
pub const SCHEMA_SQL: &str = r"
    -- Every idea, epic, task, bug and research item lives in one table and
    -- shares one id sequence.
    CREATE TABLE IF NOT EXISTS entities (
        id INTEGER PRIMARY KEY,
        type TEXT NOT NULL,
        parent_id INTEGER,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        priority TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        CHECK (type IN ('idea', 'epic', 'task', 'bug', 'research')),
        CHECK (priority IN ('low', 'medium', 'high')),
        CHECK (status IN ('pending', 'in-progress', 'done', 'blocked', 'deferred')),
        CHECK (length(title) >= 1)
    );

    CREATE INDEX IF NOT EXISTS idx_entities_type ON entities(type);
    CREATE INDEX IF NOT EXISTS idx_entities_parent_id ON entities(parent_id);
    CREATE INDEX IF NOT EXISTS idx_entities_status ON entities(status);

    -- Ordered task -> task dependency edges. The target is not a foreign key:
    -- a dangling target is tolerated and skipped on read.
    CREATE TABLE IF NOT EXISTS task_dependencies (
        task_id INTEGER NOT NULL,
        depends_on_id INTEGER NOT NULL,
        position INTEGER NOT NULL,
        PRIMARY KEY (task_id, depends_on_id),
        FOREIGN KEY (task_id) REFERENCES entities(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_task_dependencies_depends_on_id
        ON task_dependencies(depends_on_id);

    -- Progress notes (append-only)
    CREATE TABLE IF NOT EXISTS progress_notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        entity_id INTEGER NOT NULL,
        note TEXT NOT NULL,
        type TEXT NOT NULL,
        created_at TEXT NOT NULL,
        CHECK (type IN ('update', 'comment', 'blocker', 'completion')),
        FOREIGN KEY (entity_id) REFERENCES entities(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_progress_notes_entity_id ON progress_notes(entity_id);

    -- Metadata
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

/// Apply the schema to the database.
///
/// It is idempotent because all statements use `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    run_migrations(conn)?;

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?)",
        [CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    // Set journal mode to WAL for concurrency
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // Enable foreign keys
    conn.pragma_update(None, "foreign_keys", "ON")?;

    Ok(())
}

/// Run schema migrations for existing databases.
fn run_migrations(conn: &Connection) -> Result<()> {
    // Migration: older databases kept dependencies as a JSON array column on
    // `entities`. Move them into `task_dependencies` and drop the column.
    let has_json_dependencies: bool = conn
        .prepare("SELECT 1 FROM pragma_table_info('entities') WHERE name='dependencies'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if has_json_dependencies {
        migrate_json_dependencies(conn)?;
    }

    Ok(())
}

fn migrate_json_dependencies(conn: &Connection) -> Result<()> {
    let rows: Vec<(i64, Option<String>)> = {
        let mut stmt = conn.prepare(
            "SELECT id, dependencies FROM entities
             WHERE dependencies IS NOT NULL AND dependencies != ''",
        )?;
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?
    };

    let mut migrated = 0usize;
    for (task_id, raw) in rows {
        let Some(raw) = raw else { continue };
        let dependencies: Vec<i64> = serde_json::from_str(&raw)?;
        for (position, dep_id) in (0_i64..).zip(dependencies.iter()) {
            migrated += conn.execute(
                "INSERT OR IGNORE INTO task_dependencies (task_id, depends_on_id, position)
                 VALUES (?, ?, ?)",
                rusqlite::params![task_id, dep_id, position],
            )?;
        }
    }

    conn.execute("ALTER TABLE entities DROP COLUMN dependencies", [])?;
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('dependencies_migrated_at', ?)",
        [format_timestamp(&Utc::now())],
    )?;

    info!(edges = migrated, "Migrated JSON dependency column to task_dependencies");
    Ok(())
}

/// Read the stored schema version, if any.
///
/// # Errors
///
/// Returns an error if the metadata lookup fails.
pub fn schema_version(conn: &Connection) -> Result<Option<i32>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    debug!(?value, "Read schema version");
    Ok(value.and_then(|v| v.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_apply_schema() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("Failed to apply schema");

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"entities".to_string()));
        assert!(tables.contains(&"task_dependencies".to_string()));
        assert!(tables.contains(&"progress_notes".to_string()));
        assert!(tables.contains(&"metadata".to_string()));

        let foreign_keys: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);

        assert_eq!(schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_apply_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        apply_schema(&conn).unwrap();
    }

    #[test]
    fn test_migrates_json_dependency_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r"CREATE TABLE entities (
                id INTEGER PRIMARY KEY,
                type TEXT NOT NULL,
                parent_id INTEGER,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                priority TEXT NOT NULL,
                status TEXT NOT NULL,
                dependencies TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            INSERT INTO entities VALUES
                (1, 'task', NULL, 'a', '', 'high', 'pending', NULL, '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z'),
                (2, 'task', NULL, 'b', '', 'high', 'pending', '[1]', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z'),
                (3, 'bug', NULL, 'c', '', 'low', 'pending', '[2, 1]', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z');",
        )
        .unwrap();

        apply_schema(&conn).unwrap();

        let edges: Vec<(i64, i64, i64)> = conn
            .prepare("SELECT task_id, depends_on_id, position FROM task_dependencies ORDER BY task_id, position")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(edges, vec![(2, 1, 0), (3, 2, 0), (3, 1, 1)]);

        let still_has_column: bool = conn
            .prepare("SELECT 1 FROM pragma_table_info('entities') WHERE name='dependencies'")
            .unwrap()
            .exists([])
            .unwrap();
        assert!(!still_has_column);
    }
}
