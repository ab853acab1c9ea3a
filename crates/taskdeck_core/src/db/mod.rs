//! SQLite bootstrap for the task key-value store.
//!
//! # Responsibility
//! - Open file or in-memory connections ready for `SqliteTaskStorage`.
//! - Create the `kv_store` table and stamp the schema version.
//!
//! # Invariants
//! - `kv_store` exists before any load/save runs.
//! - A database stamped by a newer build is refused, never rewritten.

mod open;
mod schema;

pub use open::{open_db, open_db_in_memory};
pub use schema::{ensure_schema, schema_version, SCHEMA_VERSION};
