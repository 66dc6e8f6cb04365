//! Routine domain model.
//!
//! # Responsibility
//! - Define the named checklist record and its presentation tokens.
//! - Derive the sorted task view and the next insertion order.
//!
//! # Invariants
//! - `id` is stable and never reused for another routine.
//! - `sorted_tasks()` is recomputed on every call; nothing is cached.
//! - Sorting is stable, so equal `order` keys keep insertion order.

use super::new_entity_id;
use super::task::Task;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Stable routine identifier.
pub type RoutineId = String;

/// Icon token used when the caller does not pick one.
pub const DEFAULT_ROUTINE_ICON: &str = "checklist";

/// Fixed palette of routine colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineColor {
    Blue,
    #[default]
    Red,
    Green,
    Yellow,
    Purple,
    Orange,
    Pink,
    Brown,
    Gray,
    Black,
}

impl RoutineColor {
    /// All palette entries in declaration order.
    pub const ALL: [RoutineColor; 10] = [
        Self::Blue,
        Self::Red,
        Self::Green,
        Self::Yellow,
        Self::Purple,
        Self::Orange,
        Self::Pink,
        Self::Brown,
        Self::Gray,
        Self::Black,
    ];

    /// Stable token used in storage and CSV.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Purple => "purple",
            Self::Orange => "orange",
            Self::Pink => "pink",
            Self::Brown => "brown",
            Self::Gray => "gray",
            Self::Black => "black",
        }
    }

    /// Parses an exact storage token. Unknown tokens yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|color| color.as_str() == value)
    }
}

impl Display for RoutineColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation defaults applied to new routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineDefaults {
    pub icon: String,
    pub color: RoutineColor,
}

impl Default for RoutineDefaults {
    fn default() -> Self {
        Self {
            icon: DEFAULT_ROUTINE_ICON.to_string(),
            color: RoutineColor::default(),
        }
    }
}

/// A named, ordered checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    pub id: RoutineId,
    pub name: String,
    /// Opaque symbol token chosen by the UI.
    pub icon: String,
    pub color: RoutineColor,
    /// Sort key among all routines. Not unique, not contiguous.
    pub order: i64,
    pub is_favorite: bool,
    /// Owned tasks in insertion order. Use `sorted_tasks()` for display order.
    pub tasks: Vec<Task>,
}

impl Routine {
    /// Creates an empty routine with a generated id.
    pub fn new(name: impl Into<String>, icon: impl Into<String>, color: RoutineColor) -> Self {
        Self::with_id(new_entity_id(), name, icon, color)
    }

    /// Creates an empty routine with a caller-provided id.
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        icon: impl Into<String>,
        color: RoutineColor,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            color,
            order: 0,
            is_favorite: false,
            tasks: Vec::new(),
        }
    }

    /// Tasks ascending by `order`; ties keep insertion order.
    pub fn sorted_tasks(&self) -> Vec<&Task> {
        let mut sorted = self.tasks.iter().collect::<Vec<_>>();
        sorted.sort_by_key(|task| task.order);
        sorted
    }

    /// Order value that places a new task after every existing one.
    pub fn next_task_order(&self) -> i64 {
        crate::ordering::next_order(self.sorted_tasks().last().map(|task| task.order))
    }
}

/// Unsaved routine form state.
///
/// `name` may be empty while the form is open. Dropping the draft is how a
/// cancelled form is discarded; nothing is persisted until the service saves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineDraft {
    /// Caller-provided id (import paths). Generated when `None`.
    pub id: Option<RoutineId>,
    pub name: String,
    pub icon: String,
    pub color: RoutineColor,
    pub is_favorite: bool,
    /// Explicit order. Appended after the last routine when `None`.
    pub order: Option<i64>,
}

impl RoutineDraft {
    /// Empty form pre-filled with presentation defaults.
    pub fn from_defaults(defaults: &RoutineDefaults) -> Self {
        Self {
            id: None,
            name: String::new(),
            icon: defaults.icon.clone(),
            color: defaults.color,
            is_favorite: false,
            order: None,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for RoutineDraft {
    fn default() -> Self {
        Self::from_defaults(&RoutineDefaults::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{Routine, RoutineColor, RoutineDraft, DEFAULT_ROUTINE_ICON};
    use crate::model::task::{Task, TaskType};

    #[test]
    fn color_tokens_roundtrip_through_parse() {
        for color in RoutineColor::ALL {
            assert_eq!(RoutineColor::parse(color.as_str()), Some(color));
        }
        assert_eq!(RoutineColor::parse("teal"), None);
        assert_eq!(RoutineColor::parse("Blue"), None);
    }

    #[test]
    fn sorted_tasks_is_stable_for_equal_orders() {
        let mut routine = Routine::with_id("r1", "Morning", "sun", RoutineColor::Blue);
        routine
            .tasks
            .push(Task::with_id("late", "r1", "Late", 5, TaskType::Task));
        routine
            .tasks
            .push(Task::with_id("tie-a", "r1", "Tie A", 1, TaskType::Task));
        routine
            .tasks
            .push(Task::with_id("tie-b", "r1", "Tie B", 1, TaskType::Task));

        let ids = routine
            .sorted_tasks()
            .into_iter()
            .map(|task| task.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["tie-a", "tie-b", "late"]);
    }

    #[test]
    fn next_task_order_follows_last_sorted_task() {
        let mut routine = Routine::with_id("r1", "Morning", "sun", RoutineColor::Blue);
        assert_eq!(routine.next_task_order(), 1);

        routine
            .tasks
            .push(Task::with_id("a", "r1", "A", 7, TaskType::Task));
        routine
            .tasks
            .push(Task::with_id("b", "r1", "B", 2, TaskType::Task));
        assert_eq!(routine.next_task_order(), 8);
    }

    #[test]
    fn default_draft_uses_presentation_defaults() {
        let draft = RoutineDraft::default();
        assert!(draft.name.is_empty());
        assert_eq!(draft.icon, DEFAULT_ROUTINE_ICON);
        assert_eq!(draft.color, RoutineColor::Red);
        assert!(draft.id.is_none());
    }
}
