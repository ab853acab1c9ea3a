//! Task collection storage contract and SQLite key-value implementation.
//!
//! # Responsibility
//! - Read and write the full task collection under one storage key.
//! - Encode/decode the collection as a JSON array of task records.
//!
//! # Invariants
//! - `save` replaces the stored value atomically (single upsert).
//! - Decoded collections have unique ids. Titles are not re-validated, so
//!   legacy records blanked by an older editor still load.

use crate::config::{StoreConfig, DEFAULT_STORAGE_KEY};
use crate::model::task::{Task, TaskId};
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage error for task collection read/write.
#[derive(Debug)]
pub enum RepoError {
    /// SQLite call failed.
    Sqlite(rusqlite::Error),
    /// Database was stamped by a newer build.
    UnsupportedSchema { found: u32, supported: u32 },
    Serialize(serde_json::Error),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchema { found, supported } => write!(
                f,
                "task database schema version {found} is newer than supported {supported}"
            ),
            Self::Serialize(err) => write!(f, "failed to encode task collection: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::UnsupportedSchema { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Whole-collection persistence contract used by `TaskStore`.
pub trait TaskStorage {
    /// Returns the stored collection, or an empty one when nothing is stored.
    fn load(&self) -> RepoResult<Vec<Task>>;
    /// Replaces the stored collection with `tasks`.
    fn save(&self, tasks: &[Task]) -> RepoResult<()>;
}

/// SQLite-backed storage keeping the collection in one `kv_store` row.
pub struct SqliteTaskStorage<'conn> {
    conn: &'conn Connection,
    key: String,
}

impl<'conn> SqliteTaskStorage<'conn> {
    /// Uses `DEFAULT_STORAGE_KEY`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_key(conn, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(conn: &'conn Connection, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
        }
    }

    /// Uses the storage key named by `config`.
    pub fn from_config(conn: &'conn Connection, config: &StoreConfig) -> Self {
        Self::with_key(conn, config.storage_key.clone())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn read_value(&self) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [self.key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }
}

impl TaskStorage for SqliteTaskStorage<'_> {
    fn load(&self) -> RepoResult<Vec<Task>> {
        let Some(value) = self.read_value()? else {
            debug!(
                "event=tasks_load module=repo status=ok reason=missing_key key={} count=0",
                self.key
            );
            return Ok(Vec::new());
        };

        let tasks = decode_tasks(&value)?;
        debug!(
            "event=tasks_load module=repo status=ok key={} count={}",
            self.key,
            tasks.len()
        );
        Ok(tasks)
    }

    fn save(&self, tasks: &[Task]) -> RepoResult<()> {
        let value = encode_tasks(tasks)?;
        if let Err(err) = self.conn.execute(
            "INSERT INTO kv_store (key, value)
             VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![self.key.as_str(), value],
        ) {
            error!(
                "event=tasks_save module=repo status=error error_code=kv_write_failed count={} error={}",
                tasks.len(),
                err
            );
            return Err(err.into());
        }

        debug!(
            "event=tasks_save module=repo status=ok key={} count={} bytes={}",
            self.key,
            tasks.len(),
            value.len()
        );
        Ok(())
    }
}

/// Serializes a collection into its stored JSON form.
pub fn encode_tasks(tasks: &[Task]) -> RepoResult<String> {
    serde_json::to_string(tasks).map_err(RepoError::Serialize)
}

/// Parses a stored JSON collection and checks id uniqueness.
///
/// Empty or whitespace-only values are treated as an empty collection.
pub fn decode_tasks(value: &str) -> RepoResult<Vec<Task>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }

    let tasks: Vec<Task> = serde_json::from_str(value)
        .map_err(|err| RepoError::InvalidData(format!("malformed task collection: {err}")))?;

    let mut seen: HashSet<TaskId> = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        if !seen.insert(task.id) {
            return Err(RepoError::InvalidData(format!(
                "duplicate task id `{}`",
                task.id
            )));
        }
    }

    Ok(tasks)
}
