//! Due-date urgency classification.
//!
//! # Invariants
//! - Classification is a pure function of the task schedule and `now`.
//! - A task without `due_date` is always `Urgency::None`.
//! - Bucket edges are half-open: exactly 0h is `Today`, 24h is `Soon`,
//!   72h is `Future`.

use crate::model::task::Task;
use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

const TODAY_WINDOW_HOURS: i64 = 24;
const SOON_WINDOW_HOURS: i64 = 72;

/// Derived proximity of a task's due instant relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Overdue,
    Today,
    Soon,
    Future,
    None,
}

impl Urgency {
    /// Sort rank: `overdue=0 < today=1 < soon=2 < future=3 < none=4`.
    pub fn rank(self) -> u8 {
        match self {
            Self::Overdue => 0,
            Self::Today => 1,
            Self::Soon => 2,
            Self::Future => 3,
            Self::None => 4,
        }
    }
}

/// Time of day assumed when a task has a date but no time.
pub fn default_due_time() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default()
}

/// Combined due instant, or `None` for unscheduled tasks.
pub fn due_datetime(task: &Task) -> Option<NaiveDateTime> {
    let date = task.due_date?;
    Some(date.and_time(task.due_time.unwrap_or_else(default_due_time)))
}

/// Classifies `task` against the caller-provided instant `now`.
pub fn compute_urgency(task: &Task, now: NaiveDateTime) -> Urgency {
    let Some(due) = due_datetime(task) else {
        return Urgency::None;
    };

    let diff = due - now;
    if diff < TimeDelta::zero() {
        Urgency::Overdue
    } else if diff < TimeDelta::hours(TODAY_WINDOW_HOURS) {
        Urgency::Today
    } else if diff < TimeDelta::hours(SOON_WINDOW_HOURS) {
        Urgency::Soon
    } else {
        Urgency::Future
    }
}
