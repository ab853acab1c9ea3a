//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record and its enumerated attributes.
//! - Provide draft/patch shapes used by the store command surface.
//! - Own the wire encoding used by the persisted task collection.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `title` is non-empty after trimming.
//! - `due_time` is only meaningful when `due_date` is set.
//!
//! # Wire format
//! Fields are camelCase. Absent `dueDate`/`dueTime` are written as empty
//! strings; empty strings, `null` and omitted fields all read back as absent.

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT_MINUTES: &str = "%H:%M";
const TIME_FORMAT_SECONDS: &str = "%H:%M:%S";

/// Stable integer identifier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl TaskId {
    pub fn value(self) -> i64 {
        self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(value) => Ok(Self(value)),
            RawId::Text(text) => text
                .trim()
                .parse::<i64>()
                .map(Self)
                .map_err(|_| serde::de::Error::custom(format!("invalid task id `{text}`"))),
        }
    }
}

/// Top-level grouping used to partition tasks into tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Personal,
    Business,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Business => "business",
        }
    }
}

/// Task priority. Sort order favors `High` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Sort rank: `high=0 < medium=1 < low=2`.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    Completed,
}

impl TaskStatus {
    /// Returns the opposite state.
    pub fn toggled(self) -> Self {
        match self {
            Self::Todo => Self::Completed,
            Self::Completed => Self::Todo,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Completed => "completed",
        }
    }
}

/// Validation errors for task invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty or whitespace only.
    BlankTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "task title must not be blank"),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    #[serde(
        default,
        serialize_with = "serialize_opt_date",
        deserialize_with = "deserialize_opt_date"
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(
        default,
        serialize_with = "serialize_opt_time",
        deserialize_with = "deserialize_opt_time"
    )]
    pub due_time: Option<NaiveTime>,
    #[serde(default)]
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Materializes a draft into a task with caller-assigned identity.
    ///
    /// Does not validate; callers go through `TaskStore::create`.
    pub fn from_draft(id: TaskId, draft: TaskDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            category: draft.category,
            priority: draft.priority,
            due_date: draft.due_date,
            due_time: draft.due_time,
            status: draft.status,
            created_at,
        }
    }

    /// Checks record invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_title(&self.title)
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Applies every field set on `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(due_time) = patch.due_time {
            self.due_time = due_time;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub category: Category,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub due_time: Option<NaiveTime>,
    pub status: TaskStatus,
}

impl TaskDraft {
    /// Draft with `medium` priority, `todo` status and no schedule.
    pub fn new(title: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            category,
            priority: Priority::default(),
            due_date: None,
            due_time: None,
            status: TaskStatus::default(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn due_on(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn due_at(mut self, date: NaiveDate, time: NaiveTime) -> Self {
        self.due_date = Some(date);
        self.due_time = Some(time);
        self
    }
}

/// Partial update. `None` means "leave unchanged".
///
/// Schedule fields are doubly optional so a patch can clear them:
/// `Some(None)` removes the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub due_time: Option<Option<NaiveTime>>,
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

pub(crate) fn validate_title(title: &str) -> Result<(), TaskValidationError> {
    if title.trim().is_empty() {
        return Err(TaskValidationError::BlankTitle);
    }
    Ok(())
}

fn serialize_opt_date<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(date) => serializer.collect_str(&date.format(DATE_FORMAT)),
        None => serializer.serialize_str(""),
    }
}

fn deserialize_opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map(Some)
            .map_err(|err| serde::de::Error::custom(format!("invalid dueDate `{text}`: {err}"))),
    }
}

fn serialize_opt_time<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(time) if time.second() == 0 => {
            serializer.collect_str(&time.format(TIME_FORMAT_MINUTES))
        }
        Some(time) => serializer.collect_str(&time.format(TIME_FORMAT_SECONDS)),
        None => serializer.serialize_str(""),
    }
}

fn deserialize_opt_time<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveTime::parse_from_str(text, TIME_FORMAT_MINUTES)
            .or_else(|_| NaiveTime::parse_from_str(text, TIME_FORMAT_SECONDS))
            .map(Some)
            .map_err(|err| serde::de::Error::custom(format!("invalid dueTime `{text}`: {err}"))),
    }
}
