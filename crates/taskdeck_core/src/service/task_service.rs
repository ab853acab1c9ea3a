//! Task store use-case service.
//!
//! # Responsibility
//! - Own the in-memory task collection for one process.
//! - Apply create/update/toggle/delete commands and persist after each one.
//! - Expose the read model used by the presentation layer.
//!
//! # Invariants
//! - Ids are unique and strictly increasing over the store lifetime.
//! - Titles are non-blank after create and after update.
//! - A failed save keeps the in-memory mutation; the next successful save
//!   writes the whole collection again.

use crate::config::{CorruptDataPolicy, StoreConfig};
use crate::model::task::{
    validate_title, Category, Task, TaskDraft, TaskId, TaskPatch, TaskValidationError,
};
use crate::repo::task_repo::{RepoError, TaskStorage};
use crate::service::task_query::{count_tasks, list_tasks, TaskCounts, TaskFilter};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by task store commands.
#[derive(Debug)]
pub enum StoreError {
    /// Input rejected; the collection is unchanged.
    Validation(TaskValidationError),
    /// No task with this id.
    NotFound(TaskId),
    /// Storage read/write failure.
    Persistence(RepoError),
    /// No id above the current maximum is representable.
    IdSpaceExhausted,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Persistence(err) => write!(f, "{err}"),
            Self::IdSpaceExhausted => write!(f, "task id space exhausted"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) | Self::IdSpaceExhausted => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Persistence(value)
    }
}

/// Exclusive owner of the task collection and its storage.
pub struct TaskStore<S: TaskStorage> {
    storage: S,
    tasks: Vec<Task>,
    last_id: Option<i64>,
}

impl<S: TaskStorage> TaskStore<S> {
    /// Loads the persisted collection and builds a store around it.
    ///
    /// # Errors
    /// - `Persistence` when storage cannot be read.
    /// - `Persistence(RepoError::InvalidData)` when the stored value cannot be
    ///   decoded and `config.corrupt_data` is `Fail`.
    pub fn open(storage: S, config: &StoreConfig) -> StoreResult<Self> {
        let tasks = match storage.load() {
            Ok(tasks) => tasks,
            Err(RepoError::InvalidData(message))
                if config.corrupt_data == CorruptDataPolicy::TreatAsEmpty =>
            {
                warn!(
                    "event=store_open module=store status=degraded reason=corrupt_data policy=treat_as_empty detail={message}"
                );
                Vec::new()
            }
            Err(err) => {
                warn!("event=store_open module=store status=error error={err}");
                return Err(err.into());
            }
        };

        info!(
            "event=store_open module=store status=ok count={}",
            tasks.len()
        );
        Ok(Self::from_tasks(storage, tasks))
    }

    /// Wraps an already loaded collection without touching storage.
    pub fn from_tasks(storage: S, tasks: Vec<Task>) -> Self {
        let last_id = tasks.iter().map(|task| task.id.value()).max();
        Self {
            storage,
            tasks,
            last_id,
        }
    }

    /// Creates a task stamped with the current wall-clock time.
    pub fn create(&mut self, draft: TaskDraft) -> StoreResult<Task> {
        self.create_at(draft, Utc::now())
    }

    /// Creates a task stamped with `created_at`.
    ///
    /// # Errors
    /// - `Validation` when the trimmed title is empty; nothing is stored.
    /// - `IdSpaceExhausted` when the last id is `i64::MAX`; nothing is stored.
    /// - `Persistence` when the save fails; the task stays in memory.
    pub fn create_at(&mut self, draft: TaskDraft, created_at: DateTime<Utc>) -> StoreResult<Task> {
        if let Err(err) = validate_title(&draft.title) {
            info!("event=task_create module=store status=rejected reason=blank_title");
            return Err(err.into());
        }

        let id = self.allocate_id(created_at)?;
        let task = Task::from_draft(id, draft, created_at);
        self.tasks.push(task.clone());
        info!(
            "event=task_create module=store status=ok id={} category={} priority={}",
            id,
            task.category.as_str(),
            task.priority.as_str()
        );

        self.persist("task_create")?;
        Ok(task)
    }

    /// Merges `patch` into the task with `id`.
    ///
    /// An empty patch returns the task without saving.
    ///
    /// # Errors
    /// - `NotFound` when no task has `id`, whatever the patch holds.
    /// - `Validation` when the patch would blank the title; nothing changes.
    pub fn update(&mut self, id: TaskId, patch: &TaskPatch) -> StoreResult<Task> {
        let task = self.task_mut(id)?;
        if patch.is_empty() {
            return Ok(task.clone());
        }

        let mut merged = task.clone();
        merged.apply(patch);
        if let Err(err) = merged.validate() {
            info!("event=task_update module=store status=rejected id={id} reason=blank_title");
            return Err(err.into());
        }
        *task = merged.clone();
        info!("event=task_update module=store status=ok id={id}");

        self.persist("task_update")?;
        Ok(merged)
    }

    /// Flips the task between `todo` and `completed`.
    pub fn toggle_status(&mut self, id: TaskId) -> StoreResult<Task> {
        let task = self.task_mut(id)?;
        task.status = task.status.toggled();
        let toggled = task.clone();
        info!(
            "event=task_toggle module=store status=ok id={id} task_status={}",
            toggled.status.as_str()
        );

        self.persist("task_toggle")?;
        Ok(toggled)
    }

    /// Removes the task with `id`. Absent ids are a no-op without a save.
    pub fn delete(&mut self, id: TaskId) -> StoreResult<()> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            info!("event=task_delete module=store status=noop id={id}");
            return Ok(());
        };

        self.tasks.remove(index);
        info!("event=task_delete module=store status=ok id={id}");
        self.persist("task_delete")
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Full collection in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Sorted, filtered view of one category. See `task_query::list_tasks`.
    pub fn list(&self, category: Category, filter: TaskFilter, now: NaiveDateTime) -> Vec<Task> {
        list_tasks(&self.tasks, category, filter, now)
    }

    pub fn counts(&self, category: Category, now: NaiveDateTime) -> TaskCounts {
        count_tasks(&self.tasks, category, now)
    }

    /// Writes the current collection. Useful after a failed save.
    pub fn flush(&self) -> StoreResult<()> {
        self.persist("store_flush")
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn task_mut(&mut self, id: TaskId) -> StoreResult<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn allocate_id(&mut self, created_at: DateTime<Utc>) -> StoreResult<TaskId> {
        let candidate = created_at.timestamp_millis();
        let next = match self.last_id {
            Some(last) if candidate <= last => last.checked_add(1).ok_or_else(|| {
                warn!("event=task_create module=store status=error error_code=id_space_exhausted");
                StoreError::IdSpaceExhausted
            })?,
            _ => candidate,
        };
        self.last_id = Some(next);
        Ok(TaskId(next))
    }

    fn persist(&self, event: &'static str) -> StoreResult<()> {
        if let Err(err) = self.storage.save(&self.tasks) {
            warn!(
                "event={event} module=store status=error error_code=save_failed count={} error={err}",
                self.tasks.len()
            );
            return Err(err.into());
        }
        Ok(())
    }
}
