//! Interchange codec for the routine CSV layout.
//!
//! Layout (one header line, then one row per routine/task pair):
//!
//! ```text
//! Routine ID,Routine Name,Routine Icon,Routine Color,Task ID,Task Name,Task Order,Task Type,Task Completed
//! ```
//!
//! # Invariants
//! - Routines without tasks produce no rows and are therefore not exported.
//! - A name containing `,` or a line break shifts the columns of its row;
//!   values are never quoted.
//! - Rows with fewer than [`MIN_IMPORT_COLUMNS`] fields are skipped.
//! - Routine ids from the file are preserved; one routine is built per
//!   distinct id, however its rows are interleaved.
//! - Ids already present in the repository are updated in place, so the last
//!   row that mentions an id wins.

use super::{CsvError, CsvResult};
use crate::model::routine::{Routine, RoutineColor, RoutineDefaults, RoutineDraft, RoutineId};
use crate::model::task::{TaskDraft, TaskType};
use crate::repo::routine_repo::RoutineRepository;
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use log::{error, info};
use std::collections::HashMap;
use std::time::Instant;

/// Column titles of the interchange layout, in order.
pub const CSV_HEADER: [&str; 9] = [
    "Routine ID",
    "Routine Name",
    "Routine Icon",
    "Routine Color",
    "Task ID",
    "Task Name",
    "Task Order",
    "Task Type",
    "Task Completed",
];

/// Rows with fewer fields than this are skipped on import.
pub const MIN_IMPORT_COLUMNS: usize = 6;

const COL_ROUTINE_ID: usize = 0;
const COL_ROUTINE_NAME: usize = 1;
const COL_ROUTINE_ICON: usize = 2;
const COL_ROUTINE_COLOR: usize = 3;
const COL_TASK_ID: usize = 4;
const COL_TASK_NAME: usize = 5;
const COL_TASK_ORDER: usize = 6;
const COL_TASK_TYPE: usize = 7;
const COL_TASK_COMPLETED: usize = 8;

/// Counters reported by one import pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Data rows seen after the header.
    pub rows_read: usize,
    /// Rows dropped for having too few columns.
    pub rows_skipped: usize,
    pub routines_created: usize,
    /// Routines whose id already existed in the repository.
    pub routines_reused: usize,
    pub tasks_created: usize,
    /// Tasks whose id already existed and were overwritten.
    pub tasks_replaced: usize,
}

/// Serializes routines in the given order, each routine's tasks ascending by
/// order.
pub fn export_csv(routines: &[Routine]) -> CsvResult<String> {
    let started_at = Instant::now();
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    let mut rows = 0usize;
    for routine in routines {
        for task in routine.sorted_tasks() {
            let order = task.order.to_string();
            let completed = task.is_completed.to_string();
            writer.write_record([
                routine.id.as_str(),
                routine.name.as_str(),
                routine.icon.as_str(),
                routine.color.as_str(),
                task.id.as_str(),
                task.name.as_str(),
                order.as_str(),
                task.kind.as_str(),
                completed.as_str(),
            ])?;
            rows += 1;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| CsvError::Io(err.into_error()))?;
    let text = String::from_utf8(bytes)?;

    info!(
        "event=csv_export module=interchange status=ok routines={} rows={} duration_ms={}",
        routines.len(),
        rows,
        started_at.elapsed().as_millis()
    );
    Ok(text)
}

/// Imports interchange text with built-in routine defaults.
///
/// See [`import_csv_with_defaults`].
pub fn import_csv<R>(repo: &R, csv_text: &str) -> CsvResult<ImportSummary>
where
    R: RoutineRepository + ?Sized,
{
    import_csv_with_defaults(repo, csv_text, &RoutineDefaults::default())
}

/// Creates or merges routines and tasks from interchange text, then commits
/// once.
///
/// Field fallbacks: blank task/routine id generates a fresh id, unparseable
/// order becomes `0`, unknown task type becomes `task`, unknown color becomes
/// `defaults.color`, and completion is true only for `true` (any case).
///
/// # Errors
/// - `CsvError::ImportFailed` when any repository write or the final commit
///   fails. Writes made before the failure are left to the repository owner.
pub fn import_csv_with_defaults<R>(
    repo: &R,
    csv_text: &str,
    defaults: &RoutineDefaults,
) -> CsvResult<ImportSummary>
where
    R: RoutineRepository + ?Sized,
{
    let started_at = Instant::now();
    info!("event=csv_import module=interchange status=start");

    match import_rows(repo, csv_text, defaults) {
        Ok(summary) => {
            info!(
                "event=csv_import module=interchange status=ok rows={} skipped={} routines_created={} routines_reused={} tasks_imported={} duration_ms={}",
                summary.rows_read,
                summary.rows_skipped,
                summary.routines_created,
                summary.routines_reused,
                summary.tasks_created + summary.tasks_replaced,
                started_at.elapsed().as_millis()
            );
            Ok(summary)
        }
        Err(err) => {
            error!(
                "event=csv_import module=interchange status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn import_rows<R>(repo: &R, csv_text: &str, defaults: &RoutineDefaults) -> CsvResult<ImportSummary>
where
    R: RoutineRepository + ?Sized,
{
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(csv_text.as_bytes());

    let mut summary = ImportSummary::default();
    let mut routine_map: HashMap<String, RoutineId> = HashMap::new();

    for record in reader.records() {
        let record = record?;
        summary.rows_read += 1;
        if record.len() < MIN_IMPORT_COLUMNS {
            summary.rows_skipped += 1;
            continue;
        }
        let row = ImportRow::from_record(&record, defaults);

        let routine_id = match routine_map.get(row.routine_key) {
            Some(id) => id.clone(),
            None => {
                let id = resolve_routine(repo, &row, &mut summary)?;
                routine_map.insert(row.routine_key.to_string(), id.clone());
                id
            }
        };

        import_task(repo, &routine_id, &row, &mut summary)?;
    }

    repo.commit().map_err(CsvError::ImportFailed)?;
    Ok(summary)
}

/// Positional view of one interchange row with fallbacks applied.
struct ImportRow<'r> {
    routine_key: &'r str,
    routine_name: &'r str,
    routine_icon: &'r str,
    routine_color: RoutineColor,
    task_id: Option<&'r str>,
    task_name: &'r str,
    task_order: i64,
    task_type: TaskType,
    task_completed: bool,
}

impl<'r> ImportRow<'r> {
    fn from_record(record: &'r StringRecord, defaults: &RoutineDefaults) -> Self {
        let field = move |index: usize| record.get(index).unwrap_or("");
        let task_id = field(COL_TASK_ID);

        Self {
            routine_key: field(COL_ROUTINE_ID),
            routine_name: field(COL_ROUTINE_NAME),
            routine_icon: field(COL_ROUTINE_ICON),
            routine_color: RoutineColor::parse(field(COL_ROUTINE_COLOR)).unwrap_or(defaults.color),
            task_id: (!task_id.is_empty()).then_some(task_id),
            task_name: field(COL_TASK_NAME),
            task_order: field(COL_TASK_ORDER).parse().unwrap_or(0),
            task_type: TaskType::parse(field(COL_TASK_TYPE)).unwrap_or_default(),
            task_completed: field(COL_TASK_COMPLETED).eq_ignore_ascii_case("true"),
        }
    }
}

fn resolve_routine<R>(repo: &R, row: &ImportRow<'_>, summary: &mut ImportSummary) -> CsvResult<RoutineId>
where
    R: RoutineRepository + ?Sized,
{
    let key = row.routine_key;
    if !key.trim().is_empty() {
        if let Some(mut existing) = repo.get_routine(key).map_err(CsvError::ImportFailed)? {
            existing.name = row.routine_name.to_string();
            existing.icon = row.routine_icon.to_string();
            existing.color = row.routine_color;
            repo.update_routine(&existing)
                .map_err(CsvError::ImportFailed)?;
            summary.routines_reused += 1;
            return Ok(existing.id);
        }
    }

    let draft = RoutineDraft {
        id: (!key.trim().is_empty()).then(|| key.to_string()),
        name: row.routine_name.to_string(),
        icon: row.routine_icon.to_string(),
        color: row.routine_color,
        is_favorite: false,
        order: None,
    };
    let routine = repo.create_routine(&draft).map_err(CsvError::ImportFailed)?;
    summary.routines_created += 1;
    Ok(routine.id)
}

fn import_task<R>(
    repo: &R,
    routine_id: &str,
    row: &ImportRow<'_>,
    summary: &mut ImportSummary,
) -> CsvResult<()>
where
    R: RoutineRepository + ?Sized,
{
    if let Some(task_id) = row.task_id {
        if let Some(mut existing) = repo.get_task(task_id).map_err(CsvError::ImportFailed)? {
            existing.routine_id = routine_id.to_string();
            existing.name = row.task_name.to_string();
            existing.order = row.task_order;
            existing.kind = row.task_type;
            existing.is_completed = row.task_completed;
            repo.update_task(&existing).map_err(CsvError::ImportFailed)?;
            summary.tasks_replaced += 1;
            return Ok(());
        }
    }

    let draft = TaskDraft {
        id: row.task_id.map(str::to_string),
        name: row.task_name.to_string(),
        kind: row.task_type,
        is_completed: row.task_completed,
        order: Some(row.task_order),
        duration_minutes: None,
    };
    repo.create_task(routine_id, &draft)
        .map_err(CsvError::ImportFailed)?;
    summary.tasks_created += 1;
    Ok(())
}
