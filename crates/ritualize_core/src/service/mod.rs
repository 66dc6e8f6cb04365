//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into routine/task workflows.
//! - Keep front-ends decoupled from storage details.

pub mod routine_service;
pub mod run;
