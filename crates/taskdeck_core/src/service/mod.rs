//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate storage calls into the task store command surface.
//! - Keep presentation layers decoupled from storage details.

pub mod task_query;
pub mod task_service;
