//! `kv_store` schema and version stamp.

use crate::repo::task_repo::{RepoError, RepoResult};
use log::info;
use rusqlite::Connection;
use std::cmp::Ordering;

/// Version written to `PRAGMA user_version` once `kv_store` exists.
pub const SCHEMA_VERSION: u32 = 1;

const KV_STORE_SQL: &str = include_str!("kv_store.sql");

/// Creates `kv_store` on an unstamped database and checks stamped ones.
///
/// # Errors
/// - `RepoError::UnsupportedSchema` when the database is newer than this build.
/// - `RepoError::Sqlite` when the schema cannot be read or written.
pub fn ensure_schema(conn: &Connection) -> RepoResult<()> {
    let found = schema_version(conn)?;
    match found.cmp(&SCHEMA_VERSION) {
        Ordering::Greater => Err(RepoError::UnsupportedSchema {
            found,
            supported: SCHEMA_VERSION,
        }),
        Ordering::Equal => Ok(()),
        Ordering::Less => {
            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(KV_STORE_SQL)?;
            tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
            tx.commit()?;
            info!(
                "event=schema_init module=db status=ok from_version={found} to_version={SCHEMA_VERSION}"
            );
            Ok(())
        }
    }
}

pub fn schema_version(conn: &Connection) -> RepoResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
