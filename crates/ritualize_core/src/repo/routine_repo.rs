//! Routine/task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist routines and their owned tasks.
//! - Provide sorted listings and order-key updates for the ordering engine.
//! - Group writes into a unit of work committed by `commit()`.
//!
//! # Invariants
//! - Deleting a routine deletes its tasks (`ON DELETE CASCADE`).
//! - A task can only be created under an existing routine.
//! - Ids are never rewritten by update paths.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::new_entity_id;
use crate::model::routine::{Routine, RoutineColor, RoutineDraft, RoutineId};
use crate::model::task::{Task, TaskDraft, TaskId, TaskType};
use crate::ordering::next_order;
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const ROUTINE_SELECT_SQL: &str = "SELECT
    id,
    name,
    icon,
    color,
    sort_order,
    is_favorite
FROM routines";

const TASK_SELECT_SQL: &str = "SELECT
    id,
    routine_id,
    name,
    is_completed,
    sort_order,
    type,
    duration_minutes
FROM tasks";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for routine/task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target routine does not exist.
    RoutineNotFound(RoutineId),
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Create path received an id that is already taken.
    AlreadyExists(String),
    /// Create path received a blank id.
    InvalidId(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::RoutineNotFound(id) => write!(f, "routine not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::AlreadyExists(id) => write!(f, "entity id already exists: {id}"),
            Self::InvalidId(id) => write!(f, "entity id must not be blank: `{id}`"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "routine repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "routine repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted routine data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Entity whose order key `update_order` rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTarget<'a> {
    Routine(&'a str),
    Task(&'a str),
}

/// Repository interface for routine/task persistence.
pub trait RoutineRepository {
    /// Creates a routine from form state. Generates id and order when absent.
    fn create_routine(&self, draft: &RoutineDraft) -> RepoResult<Routine>;
    /// Creates a task under `routine_id`. Generates id and order when absent.
    fn create_task(&self, routine_id: &str, draft: &TaskDraft) -> RepoResult<Task>;
    /// Loads one routine with its tasks.
    fn get_routine(&self, id: &str) -> RepoResult<Option<Routine>>;
    /// Loads one task.
    fn get_task(&self, id: &str) -> RepoResult<Option<Task>>;
    /// Rewrites routine header fields (`tasks` is ignored).
    fn update_routine(&self, routine: &Routine) -> RepoResult<()>;
    /// Rewrites every task field except `id`, including its owning routine.
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    /// Deletes one routine and all of its tasks.
    fn delete_routine(&self, id: &str) -> RepoResult<()>;
    /// Deletes one task.
    fn delete_task(&self, id: &str) -> RepoResult<()>;
    /// Rewrites one order key.
    fn update_order(&self, target: OrderTarget<'_>, new_order: i64) -> RepoResult<()>;
    /// All routines, ascending by order then insertion, each with its tasks.
    fn list_routines_sorted_by_order(&self) -> RepoResult<Vec<Routine>>;
    /// One routine's tasks, ascending by order then insertion.
    fn list_tasks_for_routine_sorted_by_order(&self, routine_id: &str) -> RepoResult<Vec<Task>>;
    /// Persists every write since the last commit.
    fn commit(&self) -> RepoResult<()>;
    /// Discards every write since the last commit.
    fn rollback(&self) -> RepoResult<()>;
}

/// SQLite-backed routine repository.
pub struct SqliteRoutineRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRoutineRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Whether writes are pending a `commit()`.
    pub fn has_pending_changes(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn begin_write(&self) -> RepoResult<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN IMMEDIATE;")?;
        }
        Ok(())
    }

    fn routine_exists(&self, id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM routines WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn task_exists(&self, id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn last_routine_order(&self) -> RepoResult<Option<i64>> {
        let last = self
            .conn
            .query_row(
                "SELECT sort_order FROM routines ORDER BY sort_order DESC, rowid DESC LIMIT 1;",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(last)
    }

    fn last_task_order(&self, routine_id: &str) -> RepoResult<Option<i64>> {
        let last = self
            .conn
            .query_row(
                "SELECT sort_order FROM tasks
                 WHERE routine_id = ?1
                 ORDER BY sort_order DESC, rowid DESC
                 LIMIT 1;",
                [routine_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(last)
    }

    fn load_tasks(&self, routine_id: &str) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE routine_id = ?1
             ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query([routine_id])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }
}

impl RoutineRepository for SqliteRoutineRepository<'_> {
    fn create_routine(&self, draft: &RoutineDraft) -> RepoResult<Routine> {
        let id = resolve_id(draft.id.as_deref())?;
        if self.routine_exists(&id)? {
            return Err(RepoError::AlreadyExists(id));
        }

        self.begin_write()?;
        let order = match draft.order {
            Some(order) => order,
            None => next_order(self.last_routine_order()?),
        };
        self.conn.execute(
            "INSERT INTO routines (
                id,
                name,
                icon,
                color,
                sort_order,
                is_favorite
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id,
                draft.name.as_str(),
                draft.icon.as_str(),
                draft.color.as_str(),
                order,
                bool_to_int(draft.is_favorite),
            ],
        )?;

        Ok(Routine {
            id,
            name: draft.name.clone(),
            icon: draft.icon.clone(),
            color: draft.color,
            order,
            is_favorite: draft.is_favorite,
            tasks: Vec::new(),
        })
    }

    fn create_task(&self, routine_id: &str, draft: &TaskDraft) -> RepoResult<Task> {
        if !self.routine_exists(routine_id)? {
            return Err(RepoError::RoutineNotFound(routine_id.to_string()));
        }
        let id = resolve_id(draft.id.as_deref())?;
        if self.task_exists(&id)? {
            return Err(RepoError::AlreadyExists(id));
        }

        self.begin_write()?;
        let order = match draft.order {
            Some(order) => order,
            None => next_order(self.last_task_order(routine_id)?),
        };
        self.conn.execute(
            "INSERT INTO tasks (
                id,
                routine_id,
                name,
                is_completed,
                sort_order,
                type,
                duration_minutes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id,
                routine_id,
                draft.name.as_str(),
                bool_to_int(draft.is_completed),
                order,
                draft.kind.as_str(),
                draft.duration_minutes,
            ],
        )?;

        Ok(Task {
            id,
            routine_id: routine_id.to_string(),
            name: draft.name.clone(),
            is_completed: draft.is_completed,
            order,
            kind: draft.kind,
            duration_minutes: draft.duration_minutes,
        })
    }

    fn get_routine(&self, id: &str) -> RepoResult<Option<Routine>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ROUTINE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let mut routine = parse_routine_row(row)?;
        routine.tasks = self.load_tasks(&routine.id)?;
        Ok(Some(routine))
    }

    fn get_task(&self, id: &str) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn update_routine(&self, routine: &Routine) -> RepoResult<()> {
        self.begin_write()?;
        let changed = self.conn.execute(
            "UPDATE routines
             SET
                name = ?2,
                icon = ?3,
                color = ?4,
                sort_order = ?5,
                is_favorite = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                routine.id.as_str(),
                routine.name.as_str(),
                routine.icon.as_str(),
                routine.color.as_str(),
                routine.order,
                bool_to_int(routine.is_favorite),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::RoutineNotFound(routine.id.clone()));
        }
        Ok(())
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        if !self.routine_exists(&task.routine_id)? {
            return Err(RepoError::RoutineNotFound(task.routine_id.clone()));
        }

        self.begin_write()?;
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                routine_id = ?2,
                name = ?3,
                is_completed = ?4,
                sort_order = ?5,
                type = ?6,
                duration_minutes = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                task.id.as_str(),
                task.routine_id.as_str(),
                task.name.as_str(),
                bool_to_int(task.is_completed),
                task.order,
                task.kind.as_str(),
                task.duration_minutes,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(task.id.clone()));
        }
        Ok(())
    }

    fn delete_routine(&self, id: &str) -> RepoResult<()> {
        self.begin_write()?;
        let changed = self
            .conn
            .execute("DELETE FROM routines WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::RoutineNotFound(id.to_string()));
        }
        Ok(())
    }

    fn delete_task(&self, id: &str) -> RepoResult<()> {
        self.begin_write()?;
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(id.to_string()));
        }
        Ok(())
    }

    fn update_order(&self, target: OrderTarget<'_>, new_order: i64) -> RepoResult<()> {
        self.begin_write()?;
        match target {
            OrderTarget::Routine(id) => {
                let changed = self.conn.execute(
                    "UPDATE routines
                     SET sort_order = ?2,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?1;",
                    params![id, new_order],
                )?;
                if changed == 0 {
                    return Err(RepoError::RoutineNotFound(id.to_string()));
                }
            }
            OrderTarget::Task(id) => {
                let changed = self.conn.execute(
                    "UPDATE tasks
                     SET sort_order = ?2,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?1;",
                    params![id, new_order],
                )?;
                if changed == 0 {
                    return Err(RepoError::TaskNotFound(id.to_string()));
                }
            }
        }
        Ok(())
    }

    fn list_routines_sorted_by_order(&self) -> RepoResult<Vec<Routine>> {
        let mut tasks_by_routine: HashMap<String, Vec<Task>> = HashMap::new();
        {
            let mut stmt = self
                .conn
                .prepare(&format!("{TASK_SELECT_SQL} ORDER BY rowid ASC;"))?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let task = parse_task_row(row)?;
                tasks_by_routine
                    .entry(task.routine_id.clone())
                    .or_default()
                    .push(task);
            }
        }

        let mut stmt = self.conn.prepare(&format!(
            "{ROUTINE_SELECT_SQL} ORDER BY sort_order ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut routines = Vec::new();
        while let Some(row) = rows.next()? {
            let mut routine = parse_routine_row(row)?;
            routine.tasks = tasks_by_routine.remove(&routine.id).unwrap_or_default();
            routines.push(routine);
        }
        Ok(routines)
    }

    fn list_tasks_for_routine_sorted_by_order(&self, routine_id: &str) -> RepoResult<Vec<Task>> {
        if !self.routine_exists(routine_id)? {
            return Err(RepoError::RoutineNotFound(routine_id.to_string()));
        }

        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE routine_id = ?1
             ORDER BY sort_order ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([routine_id])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn commit(&self) -> RepoResult<()> {
        if self.conn.is_autocommit() {
            return Ok(());
        }
        match self.conn.execute_batch("COMMIT;") {
            Ok(()) => {
                info!("event=repo_commit module=repo status=ok");
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=repo_commit module=repo status=error error_code=commit_failed error={}",
                    err
                );
                Err(err.into())
            }
        }
    }

    fn rollback(&self) -> RepoResult<()> {
        if self.conn.is_autocommit() {
            return Ok(());
        }
        self.conn.execute_batch("ROLLBACK;")?;
        info!("event=repo_rollback module=repo status=ok");
        Ok(())
    }
}

fn resolve_id(candidate: Option<&str>) -> RepoResult<String> {
    match candidate {
        None => Ok(new_entity_id()),
        Some(value) if value.trim().is_empty() => Err(RepoError::InvalidId(value.to_string())),
        Some(value) => Ok(value.to_string()),
    }
}

fn parse_routine_row(row: &Row<'_>) -> RepoResult<Routine> {
    let color_text: String = row.get("color")?;
    let color = RoutineColor::parse(&color_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid color `{color_text}` in routines.color"))
    })?;

    Ok(Routine {
        id: row.get("id")?,
        name: row.get("name")?,
        icon: row.get("icon")?,
        color,
        order: row.get("sort_order")?,
        is_favorite: parse_bool(row.get("is_favorite")?, "routines.is_favorite")?,
        tasks: Vec::new(),
    })
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let type_text: String = row.get("type")?;
    let kind = TaskType::parse(&type_text)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid task type `{type_text}` in tasks.type")))?;

    let duration_minutes = match row.get::<_, Option<i64>>("duration_minutes")? {
        Some(value) => Some(u32::try_from(value).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid duration `{value}` in tasks.duration_minutes"
            ))
        })?),
        None => None,
    };

    Ok(Task {
        id: row.get("id")?,
        routine_id: row.get("routine_id")?,
        name: row.get("name")?,
        is_completed: parse_bool(row.get("is_completed")?, "tasks.is_completed")?,
        order: row.get("sort_order")?,
        kind,
        duration_minutes,
    })
}

fn parse_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["routines", "tasks"] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
