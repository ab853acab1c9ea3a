use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::Connection;
use std::cell::{Cell, RefCell};
use taskdeck_core::db::{open_db, open_db_in_memory};
use taskdeck_core::{
    Category, Priority, RepoError, RepoResult, SqliteTaskStorage, StoreConfig, StoreError, Task,
    TaskDraft, TaskId, TaskPatch, TaskStatus, TaskStorage, TaskStore, TaskValidationError,
};

fn open_store(conn: &Connection) -> TaskStore<SqliteTaskStorage<'_>> {
    TaskStore::open(SqliteTaskStorage::new(conn), &StoreConfig::default()).unwrap()
}

fn stamp(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
}

/// Storage double that can be switched into failing writes.
#[derive(Default)]
struct FlakyStorage {
    fail_saves: Cell<bool>,
    saves: Cell<usize>,
    last_saved: RefCell<Vec<Task>>,
}

impl TaskStorage for FlakyStorage {
    fn load(&self) -> RepoResult<Vec<Task>> {
        Ok(self.last_saved.borrow().clone())
    }

    fn save(&self, tasks: &[Task]) -> RepoResult<()> {
        if self.fail_saves.get() {
            return Err(RepoError::Sqlite(rusqlite::Error::InvalidQuery));
        }
        self.saves.set(self.saves.get() + 1);
        *self.last_saved.borrow_mut() = tasks.to_vec();
        Ok(())
    }
}

#[test]
fn open_on_empty_database_starts_empty() {
    let conn = open_db_in_memory().unwrap();
    let store = open_store(&conn);

    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
}

#[test]
fn create_appends_one_task_with_draft_fields() {
    let conn = open_db_in_memory().unwrap();
    let mut store = open_store(&conn);

    let draft = TaskDraft::new("book flights", Category::Personal)
        .with_priority(Priority::High)
        .due_at(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
        );
    let created_at = stamp("2024-01-10T10:00:00Z");
    let task = store.create_at(draft.clone(), created_at).unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(task.title, draft.title);
    assert_eq!(task.category, draft.category);
    assert_eq!(task.priority, draft.priority);
    assert_eq!(task.due_date, draft.due_date);
    assert_eq!(task.due_time, draft.due_time);
    assert_eq!(task.status, TaskStatus::Todo);
    assert_eq!(task.created_at, created_at);
    assert_eq!(task.id, TaskId(created_at.timestamp_millis()));
    assert_eq!(store.get(task.id), Some(&task));
}

#[test]
fn create_rejects_whitespace_title_without_saving() {
    let storage = FlakyStorage::default();
    let mut store = TaskStore::open(storage, &StoreConfig::default()).unwrap();

    let err = store
        .create(TaskDraft::new("   ", Category::Personal))
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::Validation(TaskValidationError::BlankTitle)
    ));
    assert!(store.is_empty());
    assert_eq!(store.storage().saves.get(), 0);
}

#[test]
fn ids_stay_unique_within_one_millisecond() {
    let conn = open_db_in_memory().unwrap();
    let mut store = open_store(&conn);
    let created_at = stamp("2024-01-10T10:00:00Z");

    let first = store
        .create_at(TaskDraft::new("a", Category::Personal), created_at)
        .unwrap();
    let second = store
        .create_at(TaskDraft::new("b", Category::Personal), created_at)
        .unwrap();
    let third = store
        .create_at(TaskDraft::new("c", Category::Business), stamp("2024-01-09T00:00:00Z"))
        .unwrap();

    assert!(first.id < second.id);
    assert!(second.id < third.id);
}

#[test]
fn ids_continue_after_reopen() {
    let conn = open_db_in_memory().unwrap();
    let created_at = stamp("2024-01-10T10:00:00Z");
    let first = {
        let mut store = open_store(&conn);
        store
            .create_at(TaskDraft::new("persisted", Category::Personal), created_at)
            .unwrap()
    };

    let mut reopened = open_store(&conn);
    let second = reopened
        .create_at(TaskDraft::new("next", Category::Personal), created_at)
        .unwrap();
    assert!(second.id > first.id);
}

#[test]
fn update_title_changes_only_title() {
    let conn = open_db_in_memory().unwrap();
    let mut store = open_store(&conn);
    let before = store
        .create(
            TaskDraft::new("old", Category::Business)
                .with_priority(Priority::Low)
                .due_on(NaiveDate::from_ymd_opt(2024, 5, 5).unwrap()),
        )
        .unwrap();

    let after = store.update(before.id, &TaskPatch::title("x")).unwrap();

    assert_eq!(after.title, "x");
    assert_eq!(
        Task {
            title: before.title.clone(),
            ..after.clone()
        },
        before
    );
    assert_eq!(store.get(before.id), Some(&after));
}

#[test]
fn update_missing_id_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let mut store = open_store(&conn);

    let err = store.update(TaskId(42), &TaskPatch::title("x")).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(TaskId(42))));
}

#[test]
fn update_rejects_blank_title_and_keeps_task() {
    let conn = open_db_in_memory().unwrap();
    let mut store = open_store(&conn);
    let task = store
        .create(TaskDraft::new("keep me", Category::Personal))
        .unwrap();

    let err = store.update(task.id, &TaskPatch::title(" ")).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.get(task.id).unwrap().title, "keep me");
}

#[test]
fn update_can_clear_schedule_and_move_category() {
    let conn = open_db_in_memory().unwrap();
    let mut store = open_store(&conn);
    let task = store
        .create(TaskDraft::new("move", Category::Personal).due_at(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        ))
        .unwrap();

    let patch = TaskPatch {
        category: Some(Category::Business),
        due_date: Some(None),
        due_time: Some(None),
        ..TaskPatch::default()
    };
    let updated = store.update(task.id, &patch).unwrap();

    assert_eq!(updated.category, Category::Business);
    assert_eq!(updated.due_date, None);
    assert_eq!(updated.due_time, None);
}

#[test]
fn toggle_status_is_its_own_inverse() {
    let conn = open_db_in_memory().unwrap();
    let mut store = open_store(&conn);
    let task = store
        .create(TaskDraft::new("flip", Category::Personal))
        .unwrap();

    let once = store.toggle_status(task.id).unwrap();
    assert_eq!(once.status, TaskStatus::Completed);
    let twice = store.toggle_status(task.id).unwrap();
    assert_eq!(twice, task);
}

#[test]
fn toggle_missing_id_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let mut store = open_store(&conn);

    let err = store.toggle_status(TaskId(1)).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(TaskId(1))));
}

#[test]
fn delete_is_idempotent() {
    let storage = FlakyStorage::default();
    let mut store = TaskStore::open(storage, &StoreConfig::default()).unwrap();
    let keep = store
        .create(TaskDraft::new("keep", Category::Personal))
        .unwrap();
    let drop_me = store
        .create(TaskDraft::new("drop", Category::Personal))
        .unwrap();

    store.delete(drop_me.id).unwrap();
    let saves_after_delete = store.storage().saves.get();
    store.delete(drop_me.id).unwrap();

    assert_eq!(store.tasks(), &[keep]);
    assert_eq!(store.storage().saves.get(), saves_after_delete);
}

#[test]
fn every_mutation_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");

    let id = {
        let conn = open_db(&path).unwrap();
        let mut store = open_store(&conn);
        let task = store
            .create(TaskDraft::new("durable", Category::Business))
            .unwrap();
        store
            .update(
                task.id,
                &TaskPatch {
                    priority: Some(Priority::High),
                    ..TaskPatch::default()
                },
            )
            .unwrap();
        store.toggle_status(task.id).unwrap();
        task.id
    };

    let conn = open_db(&path).unwrap();
    let store = open_store(&conn);
    let loaded = store.get(id).unwrap();
    assert_eq!(loaded.title, "durable");
    assert_eq!(loaded.priority, Priority::High);
    assert_eq!(loaded.status, TaskStatus::Completed);
}

#[test]
fn failed_save_keeps_in_memory_mutation() {
    let storage = FlakyStorage::default();
    let mut store = TaskStore::open(storage, &StoreConfig::default()).unwrap();
    store.storage().fail_saves.set(true);

    let err = store
        .create(TaskDraft::new("unsaved", Category::Personal))
        .unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
    assert_eq!(store.len(), 1);
    assert!(store.storage().last_saved.borrow().is_empty());

    store.storage().fail_saves.set(false);
    store.flush().unwrap();
    assert_eq!(store.storage().last_saved.borrow().as_slice(), store.tasks());
}

#[test]
fn update_unknown_id_reports_not_found_even_with_blank_title() {
    let conn = open_db_in_memory().unwrap();
    let mut store = open_store(&conn);

    let err = store.update(TaskId(7), &TaskPatch::title("  ")).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(TaskId(7))));
}

#[test]
fn empty_patch_returns_task_without_saving() {
    let storage = FlakyStorage::default();
    let mut store = TaskStore::open(storage, &StoreConfig::default()).unwrap();
    let task = store
        .create(TaskDraft::new("steady", Category::Business))
        .unwrap();
    let saves = store.storage().saves.get();

    let same = store.update(task.id, &TaskPatch::default()).unwrap();

    assert_eq!(same, task);
    assert_eq!(store.storage().saves.get(), saves);
}

#[test]
fn create_reports_exhausted_id_space() {
    let created_at = stamp("2024-01-10T10:00:00Z");
    let last = Task::from_draft(
        TaskId(i64::MAX),
        TaskDraft::new("last", Category::Personal),
        created_at,
    );
    let mut store = TaskStore::from_tasks(FlakyStorage::default(), vec![last]);

    let err = store
        .create_at(TaskDraft::new("overflow", Category::Personal), created_at)
        .unwrap_err();

    assert!(matches!(err, StoreError::IdSpaceExhausted));
    assert_eq!(store.len(), 1);
    assert_eq!(store.storage().saves.get(), 0);
}
