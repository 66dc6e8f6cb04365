//! Milestone sectioning and completion aggregates.
//!
//! # Responsibility
//! - Group a routine's sorted tasks into named sections opened by milestones.
//! - Answer "is every actionable task done" for a routine.
//!
//! # Invariants
//! - Milestones are headers only and never appear inside a section.
//! - Sections without tasks are never emitted.
//! - Both functions are pure and recomputed on every read.

use crate::model::task::Task;

/// Label of the section that holds tasks before the first milestone.
pub const DEFAULT_SECTION_NAME: &str = "Others";

/// One display group of tasks under a milestone name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSection {
    pub name: String,
    pub tasks: Vec<Task>,
}

/// Groups `sorted_tasks` into sections using [`DEFAULT_SECTION_NAME`] for
/// tasks preceding the first milestone.
pub fn sectionize<'a, I>(sorted_tasks: I) -> Vec<TaskSection>
where
    I: IntoIterator<Item = &'a Task>,
{
    sectionize_with_default(sorted_tasks, DEFAULT_SECTION_NAME)
}

/// Same as [`sectionize`] with a caller-chosen leading section label.
pub fn sectionize_with_default<'a, I>(sorted_tasks: I, default_name: &str) -> Vec<TaskSection>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut sections = Vec::new();
    let mut current_name = default_name.to_string();
    let mut buffer: Vec<Task> = Vec::new();

    for task in sorted_tasks {
        if task.is_milestone() {
            if !buffer.is_empty() {
                sections.push(TaskSection {
                    name: current_name,
                    tasks: std::mem::take(&mut buffer),
                });
            }
            current_name = task.name.clone();
        } else {
            buffer.push(task.clone());
        }
    }

    if !buffer.is_empty() {
        sections.push(TaskSection {
            name: current_name,
            tasks: buffer,
        });
    }

    sections
}

/// Whether every actionable task is completed.
///
/// An empty list is never "all completed". Milestones are skipped, so a list
/// holding only milestones counts as completed.
pub fn is_all_tasks_completed<'a, I>(tasks: I) -> bool
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut seen_any = false;
    for task in tasks {
        seen_any = true;
        if task.is_actionable() && !task.is_completed {
            return false;
        }
    }
    seen_any
}
