//! `SQLite` storage implementation.

use crate::error::{Result, TrellisError};
use crate::model::{Entity, EntityType, NoteType, Priority, ProgressNote, Status};
use crate::storage::schema::apply_schema;
use crate::util::id::format_id;
use crate::util::time::{format_timestamp, parse_timestamp};
use crate::validation::{EntityLookup, EntityValidator, ReferenceValidator};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, trace};

/// `SQLite` caps bound parameters per statement; stay well under it.
const SQLITE_VAR_LIMIT: usize = 900;

const ENTITY_COLUMNS: &str =
    "id, type, parent_id, title, description, priority, status, created_at, updated_at";

/// SQLite-based storage backend.
///
/// One handle is opened at process start and passed by reference to every
/// component that reads or writes entities.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

/// Fields for a new entity. Status always starts as `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntity {
    pub entity_type: EntityType,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub parent_id: Option<i64>,
    pub dependencies: Vec<i64>,
}

impl NewEntity {
    #[must_use]
    pub fn new(entity_type: EntityType, title: impl Into<String>) -> Self {
        Self {
            entity_type,
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
            parent_id: None,
            dependencies: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub const fn parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    #[must_use]
    pub fn dependencies(mut self, dependencies: Vec<i64>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

/// Fields to update on an entity. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub parent_id: Option<Option<i64>>,
    /// Replaces the whole dependency list.
    pub dependencies: Option<Vec<i64>>,
}

impl EntityUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.parent_id.is_none()
            && self.dependencies.is_none()
    }

    /// Update that only changes status.
    #[must_use]
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Rows removed by a delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteCounts {
    pub entities: usize,
    pub notes: usize,
    pub dependency_edges: usize,
}

impl SqliteStorage {
    /// Open a new connection to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a new connection with an optional busy timeout (ms).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open_with_timeout(path: &Path, lock_timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        if let Some(timeout) = lock_timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        }
        apply_schema(&conn)?;
        debug!(path = %path.display(), "Opened database");
        Ok(Self { conn })
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Run `f` inside one `IMMEDIATE` transaction; roll back on any error.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or a database error from begin/commit.
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        trace!(op, "Begin transaction");

        let result = f(&tx)?;

        tx.commit()?;
        debug!(op, "Committed transaction");

        Ok(result)
    }

    /// Next id the store will hand out: one past the max id in the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn next_id(&self) -> Result<i64> {
        next_id_in(&self.conn)
    }

    /// Create a new entity stamped with the current time.
    ///
    /// # Errors
    ///
    /// - `Validation` for bad fields
    /// - `NotFound` / `InvalidParent` for a bad parent
    /// - `UnknownDependency` for a dependency that is not an existing task kind
    pub fn create_entity(&mut self, new: &NewEntity) -> Result<Entity> {
        self.create_entity_at(new, Utc::now())
    }

    /// Create a new entity with an explicit creation timestamp.
    ///
    /// # Errors
    ///
    /// Same as [`SqliteStorage::create_entity`].
    pub fn create_entity_at(&mut self, new: &NewEntity, now: DateTime<Utc>) -> Result<Entity> {
        EntityValidator::validate_new(new).map_err(TrellisError::from_validation_errors)?;

        self.mutate("create_entity", |tx| {
            let id = next_id_in(tx)?;
            let label = format_id(id, new.entity_type);

            if let Some(parent_id) = new.parent_id {
                ReferenceValidator::validate_parent(&**tx, new.entity_type, &label, parent_id)?;
            }
            let dependencies = dedup_preserving_order(&new.dependencies);
            ReferenceValidator::validate_dependencies(&**tx, &dependencies)?;

            let now_str = format_timestamp(&now);
            tx.execute(
                "INSERT INTO entities (
                    id, type, parent_id, title, description, priority, status,
                    created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    id,
                    new.entity_type.as_str(),
                    new.parent_id,
                    new.title.trim(),
                    new.description,
                    new.priority.as_str(),
                    Status::Pending.as_str(),
                    now_str,
                    now_str,
                ],
            )?;
            insert_dependencies(tx, id, &dependencies)?;

            debug!(id = %label, parent = ?new.parent_id, deps = dependencies.len(), "Created entity");

            fetch_entity(tx, id)?.ok_or_else(|| TrellisError::not_found(label))
        })
    }

    /// Get an entity by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_entity(&self, id: i64) -> Result<Option<Entity>> {
        fetch_entity(&self.conn, id)
    }

    /// Get an entity by id, requiring one of the given types.
    ///
    /// A type mismatch is reported as `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent or of another type.
    pub fn get_entity_of(&self, id: i64, types: &[EntityType]) -> Result<Entity> {
        match self.get_entity(id)? {
            Some(entity) if types.contains(&entity.entity_type) => Ok(entity),
            Some(entity) => Err(TrellisError::not_found(format!(
                "{} (is a {})",
                entity.formatted_id(),
                entity.entity_type
            ))),
            None => Err(TrellisError::not_found(
                types
                    .first()
                    .map_or_else(|| id.to_string(), |kind| format_id(id, *kind)),
            )),
        }
    }

    /// All entities of one type, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_entities_by_type(&self, entity_type: EntityType) -> Result<Vec<Entity>> {
        self.get_entities_by_types(&[entity_type])
    }

    /// All entities of any of the given types, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_entities_by_types(&self, types: &[EntityType]) -> Result<Vec<Entity>> {
        if types.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; types.len()].join(",");
        let sql =
            format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE type IN ({placeholders}) ORDER BY id");
        let params: Vec<&str> = types.iter().map(EntityType::as_str).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let mut entities = stmt
            .query_map(rusqlite::params_from_iter(params), entity_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        attach_dependencies(&self.conn, &mut entities)?;
        Ok(entities)
    }

    /// Direct children of `parent_id` restricted to `types`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_children(&self, parent_id: i64, types: &[EntityType]) -> Result<Vec<Entity>> {
        if types.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; types.len()].join(",");
        let sql = format!(
            "SELECT {ENTITY_COLUMNS} FROM entities
             WHERE parent_id = ? AND type IN ({placeholders}) ORDER BY id"
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(parent_id)];
        for kind in types {
            params.push(Box::new(kind.as_str()));
        }
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(AsRef::as_ref).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let mut entities = stmt
            .query_map(params_refs.as_slice(), entity_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        attach_dependencies(&self.conn, &mut entities)?;
        Ok(entities)
    }

    /// Batch fetch entities by id. Missing ids are simply absent from the map.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_entities(&self, ids: &[i64]) -> Result<HashMap<i64, Entity>> {
        let unique: Vec<i64> = dedup_preserving_order(ids);
        let mut found = Vec::with_capacity(unique.len());

        for chunk in unique.chunks(SQLITE_VAR_LIMIT) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE id IN ({placeholders})");
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(chunk.iter()), entity_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            found.extend(rows);
        }

        attach_dependencies(&self.conn, &mut found)?;
        Ok(found.into_iter().map(|e| (e.id, e)).collect())
    }

    /// Apply a partial update. `updated_at` is always refreshed.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the entity does not exist
    /// - `Validation`, `InvalidParent`, `UnknownDependency` for bad supplied fields
    pub fn update_entity(&mut self, id: i64, update: &EntityUpdate) -> Result<Entity> {
        let existing = self
            .get_entity(id)?
            .ok_or_else(|| TrellisError::not_found(id.to_string()))?;
        let label = existing.formatted_id();

        EntityValidator::validate_update(existing.entity_type, update)
            .map_err(TrellisError::from_validation_errors)?;

        self.mutate("update_entity", |tx| {
            let mut set_clauses: Vec<&str> = vec![];
            let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![];

            if let Some(title) = update.title.as_ref() {
                set_clauses.push("title = ?");
                params.push(Box::new(title.trim().to_string()));
            }
            if let Some(description) = update.description.as_ref() {
                set_clauses.push("description = ?");
                params.push(Box::new(description.clone()));
            }
            if let Some(priority) = update.priority {
                set_clauses.push("priority = ?");
                params.push(Box::new(priority.as_str()));
            }
            if let Some(status) = update.status {
                if status != existing.status {
                    debug!(id = %label, from = %existing.status, to = %status, "Status change");
                }
                set_clauses.push("status = ?");
                params.push(Box::new(status.as_str()));
            }
            if let Some(parent_id) = update.parent_id {
                if let Some(parent_id) = parent_id {
                    ReferenceValidator::validate_parent(
                        &**tx,
                        existing.entity_type,
                        &label,
                        parent_id,
                    )?;
                }
                set_clauses.push("parent_id = ?");
                params.push(Box::new(parent_id));
            }

            // Always update updated_at
            set_clauses.push("updated_at = ?");
            params.push(Box::new(format_timestamp(&Utc::now())));

            let sql = format!("UPDATE entities SET {} WHERE id = ?", set_clauses.join(", "));
            params.push(Box::new(id));
            let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(AsRef::as_ref).collect();
            tx.execute(&sql, params_refs.as_slice())?;

            if let Some(dependencies) = update.dependencies.as_ref() {
                let dependencies = dedup_preserving_order(dependencies);
                ReferenceValidator::validate_dependencies(&**tx, &dependencies)?;
                tx.execute("DELETE FROM task_dependencies WHERE task_id = ?", [id])?;
                insert_dependencies(tx, id, &dependencies)?;
            }

            fetch_entity(tx, id)?.ok_or_else(|| TrellisError::not_found(label.clone()))
        })
    }

    /// Append a progress note and bump the owner's `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the entity does not exist, `Validation` for empty content.
    pub fn add_note(
        &mut self,
        entity_id: i64,
        content: &str,
        note_type: NoteType,
    ) -> Result<ProgressNote> {
        if content.trim().is_empty() {
            return Err(TrellisError::validation("content", "cannot be empty"));
        }

        self.mutate("add_note", |tx| {
            if entity_type_in(tx, entity_id)?.is_none() {
                return Err(TrellisError::not_found(entity_id.to_string()));
            }

            let now = format_timestamp(&Utc::now());
            tx.execute(
                "INSERT INTO progress_notes (entity_id, note, type, created_at) VALUES (?, ?, ?, ?)",
                rusqlite::params![entity_id, content, note_type.as_str(), now],
            )?;
            let note_id = tx.last_insert_rowid();

            tx.execute(
                "UPDATE entities SET updated_at = ? WHERE id = ?",
                rusqlite::params![now, entity_id],
            )?;

            let note = tx.query_row(
                "SELECT id, entity_id, note, type, created_at FROM progress_notes WHERE id = ?",
                [note_id],
                note_from_row,
            )?;
            Ok(note)
        })
    }

    /// Progress notes for an entity in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_notes(&self, entity_id: i64) -> Result<Vec<ProgressNote>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, entity_id, note, type, created_at
             FROM progress_notes
             WHERE entity_id = ?
             ORDER BY id ASC",
        )?;

        let notes = stmt
            .query_map([entity_id], note_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(notes)
    }

    /// Ids this task depends on, in stored order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_dependencies(&self, task_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT depends_on_id FROM task_dependencies WHERE task_id = ? ORDER BY position",
        )?;
        let ids = stmt
            .query_map([task_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Ids of other tasks that list `task_id` as a dependency.
    ///
    /// A self-edge is not a dependent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_dependents(&self, task_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT task_id FROM task_dependencies
             WHERE depends_on_id = ?1 AND task_id != ?1
             ORDER BY task_id",
        )?;
        let ids = stmt
            .query_map([task_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Every `(task_id, depends_on_id)` edge, ordered by task then position.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_all_dependency_edges(&self) -> Result<Vec<(i64, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT task_id, depends_on_id FROM task_dependencies ORDER BY task_id, position",
        )?;
        let edges = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    /// Count all entities.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_entities(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM entities", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Delete entities in the given order, with their notes and outgoing edges.
    ///
    /// Runs as one transaction. Fails with `HasDependents` before touching
    /// anything if a task outside `ordered_ids` depends on one inside it.
    ///
    /// # Errors
    ///
    /// - `NotFound` if any id does not exist
    /// - `HasDependents` for an outside dependent
    pub fn delete_entities(&mut self, ordered_ids: &[i64]) -> Result<DeleteCounts> {
        let doomed: HashSet<i64> = ordered_ids.iter().copied().collect();

        self.mutate("delete_entities", |tx| {
            for &id in ordered_ids {
                let Some(kind) = entity_type_in(tx, id)? else {
                    return Err(TrellisError::not_found(id.to_string()));
                };
                let outside: Vec<String> = dependents_in(tx, id)?
                    .into_iter()
                    .filter(|dependent| !doomed.contains(&dependent.0))
                    .map(|(dep_id, dep_kind)| format_id(dep_id, dep_kind))
                    .collect();
                if !outside.is_empty() {
                    return Err(TrellisError::HasDependents {
                        id: format_id(id, kind),
                        dependents: outside,
                    });
                }
            }

            let mut counts = DeleteCounts::default();
            for &id in ordered_ids {
                counts.notes += tx.execute("DELETE FROM progress_notes WHERE entity_id = ?", [id])?;
                counts.dependency_edges +=
                    tx.execute("DELETE FROM task_dependencies WHERE task_id = ?", [id])?;
                counts.entities += tx.execute("DELETE FROM entities WHERE id = ?", [id])?;
                trace!(id, "Deleted entity row");
            }
            Ok(counts)
        })
    }

    /// Read a metadata value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM metadata WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Write a metadata value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn set_metadata(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?, ?)",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }
}

impl EntityLookup for Connection {
    fn entity_type_of(&self, id: i64) -> Result<Option<EntityType>> {
        entity_type_in(self, id)
    }
}

impl EntityLookup for SqliteStorage {
    fn entity_type_of(&self, id: i64) -> Result<Option<EntityType>> {
        entity_type_in(&self.conn, id)
    }
}

fn next_id_in(conn: &Connection) -> Result<i64> {
    let max: i64 = conn.query_row("SELECT COALESCE(MAX(id), 0) FROM entities", [], |row| {
        row.get(0)
    })?;
    Ok(max + 1)
}

fn entity_type_in(conn: &Connection, id: i64) -> Result<Option<EntityType>> {
    let raw: Option<String> = conn
        .query_row("SELECT type FROM entities WHERE id = ?", [id], |row| {
            row.get(0)
        })
        .optional()?;
    raw.map(|s| EntityType::from_str(&s)).transpose()
}

fn dependents_in(conn: &Connection, id: i64) -> Result<Vec<(i64, EntityType)>> {
    let mut stmt = conn.prepare(
        "SELECT d.task_id, e.type FROM task_dependencies d
         JOIN entities e ON e.id = d.task_id
         WHERE d.depends_on_id = ?1 AND d.task_id != ?1
         ORDER BY d.task_id",
    )?;
    let rows = stmt
        .query_map([id], |row| Ok((row.get(0)?, parse_column::<EntityType>(row, 1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn fetch_entity(conn: &Connection, id: i64) -> Result<Option<Entity>> {
    let sql = format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE id = ?");
    let entity = conn.query_row(&sql, [id], entity_from_row).optional()?;

    match entity {
        Some(mut entity) => {
            attach_dependencies(conn, std::slice::from_mut(&mut entity))?;
            Ok(Some(entity))
        }
        None => Ok(None),
    }
}

fn insert_dependencies(tx: &Transaction<'_>, task_id: i64, dependencies: &[i64]) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO task_dependencies (task_id, depends_on_id, position) VALUES (?, ?, ?)",
    )?;
    for (position, dep_id) in (0_i64..).zip(dependencies) {
        stmt.execute(rusqlite::params![task_id, dep_id, position])?;
    }
    Ok(())
}

/// Fill `dependencies` for task-kind entities with one query per chunk.
fn attach_dependencies(conn: &Connection, entities: &mut [Entity]) -> Result<()> {
    let task_ids: Vec<i64> = entities
        .iter()
        .filter(|e| e.entity_type.is_task_kind())
        .map(|e| e.id)
        .collect();
    if task_ids.is_empty() {
        return Ok(());
    }

    let mut edges: HashMap<i64, Vec<i64>> = HashMap::new();
    for chunk in task_ids.chunks(SQLITE_VAR_LIMIT) {
        let placeholders = vec!["?"; chunk.len()].join(",");
        let sql = format!(
            "SELECT task_id, depends_on_id FROM task_dependencies
             WHERE task_id IN ({placeholders})
             ORDER BY task_id, position"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(chunk.iter()), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (task_id, dep_id) = row?;
            edges.entry(task_id).or_default().push(dep_id);
        }
    }

    for entity in entities.iter_mut() {
        if let Some(deps) = edges.remove(&entity.id) {
            entity.dependencies = deps;
        }
    }
    Ok(())
}

fn entity_from_row(row: &Row<'_>) -> rusqlite::Result<Entity> {
    Ok(Entity {
        id: row.get(0)?,
        entity_type: parse_column(row, 1)?,
        parent_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        priority: parse_column(row, 5)?,
        status: parse_column(row, 6)?,
        dependencies: Vec::new(),
        created_at: timestamp_column(row, 7)?,
        updated_at: timestamp_column(row, 8)?,
    })
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<ProgressNote> {
    Ok(ProgressNote {
        id: row.get(0)?,
        entity_id: row.get(1)?,
        content: row.get(2)?,
        note_type: parse_column(row, 3)?,
        timestamp: timestamp_column(row, 4)?,
    })
}

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = TrellisError>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: TrellisError| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(TrellisError::validation("timestamp", format!("unparseable '{raw}'"))),
        )
    })
}

fn dedup_preserving_order(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
impl SqliteStorage {
    /// Execute raw SQL for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the SQL execution fails.
    pub fn execute_test_sql(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}
