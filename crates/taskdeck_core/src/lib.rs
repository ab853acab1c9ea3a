//! Core domain logic for taskdeck, a single-user task list.
//! This crate is the single source of truth for task invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CorruptDataPolicy, StoreConfig, DEFAULT_STORAGE_KEY};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{
    Category, Priority, Task, TaskDraft, TaskId, TaskPatch, TaskStatus, TaskValidationError,
};
pub use model::urgency::{compute_urgency, Urgency};
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskStorage, TaskStorage};
pub use service::task_query::{TaskCounts, TaskFilter};
pub use service::task_service::{StoreError, StoreResult, TaskStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
