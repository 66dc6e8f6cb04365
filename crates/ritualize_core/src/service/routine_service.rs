//! Routine/task use-case service.
//!
//! # Responsibility
//! - Validate form input before persistence.
//! - Drive reorders through the ordering engine and sections through the
//!   sectioner.
//! - Wrap every mutating call into one committed unit of work.
//!
//! # Invariants
//! - Saved routine and task names are trimmed and never blank.
//! - A failed call rolls back its own writes; nothing is half-applied.
//! - Service layer remains storage-agnostic.

use crate::interchange::csv_codec::{export_csv, import_csv_with_defaults, ImportSummary};
use crate::interchange::CsvError;
use crate::model::routine::{Routine, RoutineDefaults, RoutineDraft, RoutineId};
use crate::model::task::{Task, TaskDraft, TaskId};
use crate::ordering::plan_move;
use crate::repo::routine_repo::{OrderTarget, RepoError, RoutineRepository};
use crate::sections::{is_all_tasks_completed, sectionize, TaskSection};
use crate::service::run::RoutineRun;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, RoutineServiceError>;

/// Errors from routine service operations.
#[derive(Debug)]
pub enum RoutineServiceError {
    /// Name is blank after trim.
    InvalidName,
    /// Target routine does not exist.
    RoutineNotFound(RoutineId),
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Repository-level failure.
    Repo(RepoError),
    /// Interchange failure.
    Csv(CsvError),
}

impl Display for RoutineServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "name must not be blank"),
            Self::RoutineNotFound(id) => write!(f, "routine not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Csv(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RoutineServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RoutineServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::RoutineNotFound(id) => Self::RoutineNotFound(id),
            RepoError::TaskNotFound(id) => Self::TaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<CsvError> for RoutineServiceError {
    fn from(value: CsvError) -> Self {
        Self::Csv(value)
    }
}

/// Routine/task service facade.
pub struct RoutineService<R: RoutineRepository> {
    repo: R,
    defaults: RoutineDefaults,
}

impl<R: RoutineRepository> RoutineService<R> {
    /// Creates service with built-in presentation defaults.
    pub fn new(repo: R) -> Self {
        Self::with_defaults(repo, RoutineDefaults::default())
    }

    pub fn with_defaults(repo: R, defaults: RoutineDefaults) -> Self {
        Self { repo, defaults }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn defaults(&self) -> &RoutineDefaults {
        &self.defaults
    }

    /// Fresh form state for an "add routine" sheet. Not persisted.
    pub fn new_routine_draft(&self) -> RoutineDraft {
        RoutineDraft::from_defaults(&self.defaults)
    }

    /// Saves a routine form. Appended after the last routine unless the
    /// draft carries an explicit order.
    pub fn create_routine(&self, draft: &RoutineDraft) -> ServiceResult<Routine> {
        let mut draft = draft.clone();
        draft.name = normalize_name(&draft.name)?;
        self.write(|repo| Ok(repo.create_routine(&draft)?))
    }

    /// Saves edited routine header fields.
    pub fn update_routine(&self, routine: &Routine) -> ServiceResult<()> {
        let mut routine = routine.clone();
        routine.name = normalize_name(&routine.name)?;
        self.write(|repo| Ok(repo.update_routine(&routine)?))
    }

    /// Flips the favorite flag and returns the new value.
    pub fn toggle_favorite(&self, routine_id: &str) -> ServiceResult<bool> {
        self.write(|repo| {
            let mut routine = require_routine(repo, routine_id)?;
            routine.is_favorite = !routine.is_favorite;
            repo.update_routine(&routine)?;
            Ok(routine.is_favorite)
        })
    }

    /// Deletes a routine together with its tasks.
    pub fn delete_routine(&self, routine_id: &str) -> ServiceResult<()> {
        self.write(|repo| Ok(repo.delete_routine(routine_id)?))
    }

    /// Deletes several routines in one unit of work.
    pub fn delete_routines<I, S>(&self, routine_ids: I) -> ServiceResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.write(|repo| {
            let mut deleted = 0;
            for id in routine_ids {
                repo.delete_routine(id.as_ref())?;
                deleted += 1;
            }
            Ok(deleted)
        })
    }

    /// Saves an "add task" form, appending after the routine's last task
    /// unless the draft carries an explicit order.
    pub fn add_task(&self, routine_id: &str, draft: &TaskDraft) -> ServiceResult<Task> {
        let mut draft = draft.clone();
        draft.name = normalize_name(&draft.name)?;
        self.write(|repo| Ok(repo.create_task(routine_id, &draft)?))
    }

    /// Saves edited task fields.
    pub fn update_task(&self, task: &Task) -> ServiceResult<()> {
        let mut task = task.clone();
        task.name = normalize_name(&task.name)?;
        self.write(|repo| Ok(repo.update_task(&task)?))
    }

    pub fn set_task_completed(&self, task_id: &str, completed: bool) -> ServiceResult<()> {
        self.write(|repo| {
            let mut task = require_task(repo, task_id)?;
            task.is_completed = completed;
            Ok(repo.update_task(&task)?)
        })
    }

    /// Flips completion and returns the new value.
    pub fn toggle_task_completed(&self, task_id: &str) -> ServiceResult<bool> {
        self.write(|repo| {
            let mut task = require_task(repo, task_id)?;
            task.is_completed = !task.is_completed;
            repo.update_task(&task)?;
            Ok(task.is_completed)
        })
    }

    /// Clears completion on every task of the routine. Returns how many
    /// tasks changed.
    pub fn uncheck_all_tasks(&self, routine_id: &str) -> ServiceResult<usize> {
        self.write(|repo| {
            let mut changed = 0;
            for mut task in repo.list_tasks_for_routine_sorted_by_order(routine_id)? {
                if task.is_completed {
                    task.is_completed = false;
                    repo.update_task(&task)?;
                    changed += 1;
                }
            }
            Ok(changed)
        })
    }

    pub fn delete_task(&self, task_id: &str) -> ServiceResult<()> {
        self.write(|repo| Ok(repo.delete_task(task_id)?))
    }

    /// Deletes several tasks in one unit of work.
    pub fn delete_tasks<I, S>(&self, task_ids: I) -> ServiceResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.write(|repo| {
            let mut deleted = 0;
            for id in task_ids {
                repo.delete_task(id.as_ref())?;
                deleted += 1;
            }
            Ok(deleted)
        })
    }

    /// Moves the task at sorted position `from` to sorted position `to`
    /// within one routine.
    ///
    /// # Panics
    /// Panics when `from` or `to` is out of range for the routine's tasks.
    pub fn move_task(&self, routine_id: &str, from: usize, to: usize) -> ServiceResult<()> {
        self.write(|repo| {
            let tasks = repo.list_tasks_for_routine_sorted_by_order(routine_id)?;
            let current = tasks.iter().map(|task| task.order).collect::<Vec<_>>();
            let plan = plan_move(&current, from, to);
            for (index, order) in plan.changes(&current) {
                repo.update_order(OrderTarget::Task(&tasks[index].id), order)?;
            }
            info!(
                "event=order_move module=service status=ok scope=task from={} to={} rebased={}",
                from, to, plan.rebased
            );
            Ok(())
        })
    }

    /// Moves the routine at sorted position `from` to sorted position `to`.
    ///
    /// # Panics
    /// Panics when `from` or `to` is out of range for the routine list.
    pub fn move_routine(&self, from: usize, to: usize) -> ServiceResult<()> {
        self.write(|repo| {
            let routines = repo.list_routines_sorted_by_order()?;
            let current = routines.iter().map(|routine| routine.order).collect::<Vec<_>>();
            let plan = plan_move(&current, from, to);
            for (index, order) in plan.changes(&current) {
                repo.update_order(OrderTarget::Routine(&routines[index].id), order)?;
            }
            info!(
                "event=order_move module=service status=ok scope=routine from={} to={} rebased={}",
                from, to, plan.rebased
            );
            Ok(())
        })
    }

    /// All routines in display order, each with its tasks.
    pub fn list_routines(&self) -> ServiceResult<Vec<Routine>> {
        Ok(self.repo.list_routines_sorted_by_order()?)
    }

    pub fn routine(&self, routine_id: &str) -> ServiceResult<Routine> {
        require_routine(&self.repo, routine_id)
    }

    /// One routine's tasks in display order.
    pub fn sorted_tasks(&self, routine_id: &str) -> ServiceResult<Vec<Task>> {
        Ok(self.repo.list_tasks_for_routine_sorted_by_order(routine_id)?)
    }

    /// Milestone sections of one routine.
    pub fn sections(&self, routine_id: &str) -> ServiceResult<Vec<TaskSection>> {
        let tasks = self.sorted_tasks(routine_id)?;
        Ok(sectionize(&tasks))
    }

    pub fn is_all_tasks_completed(&self, routine_id: &str) -> ServiceResult<bool> {
        let tasks = self.sorted_tasks(routine_id)?;
        Ok(is_all_tasks_completed(&tasks))
    }

    /// Starts a guided run over the routine's actionable tasks.
    pub fn start_run(&self, routine_id: &str) -> ServiceResult<RoutineRun> {
        let routine = require_routine(&self.repo, routine_id)?;
        Ok(RoutineRun::new(&routine))
    }

    /// Persists completion of the run's current step, then advances the run.
    /// Returns the completed task id, or `None` when the run is finished.
    pub fn complete_run_step(&self, run: &mut RoutineRun) -> ServiceResult<Option<TaskId>> {
        let Some(task_id) = run.current().map(|task| task.id.clone()) else {
            return Ok(None);
        };
        self.set_task_completed(&task_id, true)?;
        run.complete_current();
        Ok(Some(task_id))
    }

    /// Exports every routine in display order.
    pub fn export_csv(&self) -> ServiceResult<String> {
        let routines = self.repo.list_routines_sorted_by_order()?;
        Ok(export_csv(&routines)?)
    }

    /// Imports interchange text. On failure every write of this import is
    /// rolled back.
    pub fn import_csv(&self, csv_text: &str) -> ServiceResult<ImportSummary> {
        self.write(|repo| Ok(import_csv_with_defaults(repo, csv_text, &self.defaults)?))
    }

    fn write<T>(&self, op: impl FnOnce(&R) -> ServiceResult<T>) -> ServiceResult<T> {
        let result = op(&self.repo).and_then(|value| {
            self.repo.commit()?;
            Ok(value)
        });
        if result.is_err() {
            if let Err(err) = self.repo.rollback() {
                warn!(
                    "event=repo_rollback module=service status=error error_code=rollback_failed error={}",
                    err
                );
            }
        }
        result
    }
}

fn require_routine<R: RoutineRepository>(repo: &R, routine_id: &str) -> ServiceResult<Routine> {
    repo.get_routine(routine_id)?
        .ok_or_else(|| RoutineServiceError::RoutineNotFound(routine_id.to_string()))
}

fn require_task<R: RoutineRepository>(repo: &R, task_id: &str) -> ServiceResult<Task> {
    repo.get_task(task_id)?
        .ok_or_else(|| RoutineServiceError::TaskNotFound(task_id.to_string()))
}

fn normalize_name(value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RoutineServiceError::InvalidName);
    }
    Ok(trimmed.to_string())
}
