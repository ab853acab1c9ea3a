//! Task domain model.
//!
//! # Responsibility
//! - Define the task record, its enumerated attributes and draft/patch inputs.
//! - Derive urgency from a task schedule and an explicit current instant.
//!
//! # Invariants
//! - Every task is identified by a stable, never reused `TaskId`.
//! - Model code never reads the system clock for derived views.

pub mod task;
pub mod urgency;
