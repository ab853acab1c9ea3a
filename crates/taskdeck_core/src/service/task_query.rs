//! Read-model projections over a task collection.
//!
//! # Invariants
//! - Projections never mutate their input.
//! - `list_tasks` and `count_tasks` share the same filter predicates.
//! - Sorting is stable: ties keep insertion order.

use crate::model::task::{Category, Task};
use crate::model::urgency::{compute_urgency, Urgency};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Within-category filter chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
    Overdue,
}

impl TaskFilter {
    pub fn matches(self, task: &Task, now: NaiveDateTime) -> bool {
        match self {
            Self::All => true,
            Self::Pending => !task.is_completed(),
            Self::Completed => task.is_completed(),
            Self::Overdue => compute_urgency(task, now) == Urgency::Overdue,
        }
    }
}

/// Per-category badge counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskCounts {
    pub all: usize,
    pub pending: usize,
    pub completed: usize,
    pub overdue: usize,
}

/// Returns tasks of `category` matching `filter`, most urgent first, then
/// by priority (high first).
pub fn list_tasks(
    tasks: &[Task],
    category: Category,
    filter: TaskFilter,
    now: NaiveDateTime,
) -> Vec<Task> {
    let mut ranked: Vec<(u8, u8, &Task)> = tasks
        .iter()
        .filter(|task| task.category == category && filter.matches(task, now))
        .map(|task| (compute_urgency(task, now).rank(), task.priority.rank(), task))
        .collect();

    ranked.sort_by_key(|(urgency_rank, priority_rank, _)| (*urgency_rank, *priority_rank));
    ranked.into_iter().map(|(_, _, task)| task.clone()).collect()
}

pub fn count_tasks(tasks: &[Task], category: Category, now: NaiveDateTime) -> TaskCounts {
    tasks
        .iter()
        .filter(|task| task.category == category)
        .fold(TaskCounts::default(), |mut counts, task| {
            counts.all += 1;
            if TaskFilter::Pending.matches(task, now) {
                counts.pending += 1;
            }
            if TaskFilter::Completed.matches(task, now) {
                counts.completed += 1;
            }
            if TaskFilter::Overdue.matches(task, now) {
                counts.overdue += 1;
            }
            counts
        })
}
