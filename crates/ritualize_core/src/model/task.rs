//! Task domain model.
//!
//! # Responsibility
//! - Define the item record stored inside a routine's checklist.
//! - Distinguish actionable tasks from milestone section headers.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `order` is a position key only; `duration_minutes` carries durations.
//! - Milestones are never counted as completable work.

use super::new_entity_id;
use serde::{Deserialize, Serialize};

/// Stable task identifier.
pub type TaskId = String;

/// Kind of checklist entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Actionable item that can be checked off.
    #[default]
    Task,
    /// Non-actionable header that opens a new section.
    Milestone,
}

impl TaskType {
    /// Stable token used in storage and CSV.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Milestone => "milestone",
        }
    }

    /// Parses an exact storage token. Unknown tokens yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "task" => Some(Self::Task),
            "milestone" => Some(Self::Milestone),
            _ => None,
        }
    }
}

/// One entry in a routine's checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Owning routine. Non-owning back reference resolved through the repository.
    pub routine_id: String,
    pub name: String,
    pub is_completed: bool,
    /// Sort key within the owning routine. Not unique, not contiguous.
    pub order: i64,
    /// Serialized as `type` to match the interchange column naming.
    #[serde(rename = "type")]
    pub kind: TaskType,
    /// Optional expected duration, independent from `order`.
    pub duration_minutes: Option<u32>,
}

impl Task {
    /// Creates a task with a generated id, attached to `routine_id`.
    pub fn new(
        routine_id: impl Into<String>,
        name: impl Into<String>,
        order: i64,
        kind: TaskType,
    ) -> Self {
        Self::with_id(new_entity_id(), routine_id, name, order, kind)
    }

    /// Creates a task with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        id: impl Into<String>,
        routine_id: impl Into<String>,
        name: impl Into<String>,
        order: i64,
        kind: TaskType,
    ) -> Self {
        Self {
            id: id.into(),
            routine_id: routine_id.into(),
            name: name.into(),
            is_completed: false,
            order,
            kind,
            duration_minutes: None,
        }
    }

    pub fn is_milestone(&self) -> bool {
        self.kind == TaskType::Milestone
    }

    /// Whether this entry counts as completable work.
    pub fn is_actionable(&self) -> bool {
        !self.is_milestone()
    }
}

/// Unsaved task form state.
///
/// `name` may be empty while the form is open; the service rejects blank
/// names on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    /// Caller-provided id (import paths). Generated when `None`.
    pub id: Option<TaskId>,
    pub name: String,
    pub kind: TaskType,
    pub is_completed: bool,
    /// Explicit order. Appended after the last task when `None`.
    pub order: Option<i64>,
    pub duration_minutes: Option<u32>,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>, kind: TaskType) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }
}
