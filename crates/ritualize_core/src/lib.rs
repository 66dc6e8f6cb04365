//! Core domain logic for Ritualize.
//! Routines, their ordered task checklists, milestone sections and CSV
//! interchange live here; front-ends only call into this crate.

pub mod config;
pub mod db;
pub mod interchange;
pub mod logging;
pub mod model;
pub mod ordering;
pub mod repo;
pub mod sections;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use interchange::csv_codec::{export_csv, import_csv, import_csv_with_defaults, ImportSummary};
pub use interchange::file::{load_csv_from_file, save_csv_to_file};
pub use interchange::{CsvError, CsvResult};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::routine::{Routine, RoutineColor, RoutineDefaults, RoutineDraft, RoutineId};
pub use model::task::{Task, TaskDraft, TaskId, TaskType};
pub use ordering::{plan_move, MovePlan};
pub use repo::routine_repo::{
    OrderTarget, RepoError, RepoResult, RoutineRepository, SqliteRoutineRepository,
};
pub use sections::{is_all_tasks_completed, sectionize, TaskSection};
pub use service::routine_service::{RoutineService, RoutineServiceError};
pub use service::run::RoutineRun;

/// Minimal health-check API for front-end wiring.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
