//! Persistence layer for the task collection.
//!
//! # Responsibility
//! - Define the whole-collection `load`/`save` storage contract.
//! - Keep SQL and wire-encoding details out of the store service.
//!
//! # Invariants
//! - Load paths reject invalid persisted state instead of masking it.
//! - A missing collection loads as empty, never as an error.

pub mod task_repo;
