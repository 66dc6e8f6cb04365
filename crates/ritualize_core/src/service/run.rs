//! Guided walk through a routine's actionable tasks.
//!
//! # Invariants
//! - Steps are the routine's non-milestone tasks in sorted order, captured
//!   when the run starts.
//! - The cursor never goes below zero and stops one past the last step.

use crate::model::routine::{Routine, RoutineId};
use crate::model::task::Task;

/// In-memory cursor over one routine's steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineRun {
    routine_id: RoutineId,
    steps: Vec<Task>,
    cursor: usize,
}

impl RoutineRun {
    /// Starts at the first actionable task.
    pub fn new(routine: &Routine) -> Self {
        let steps = routine
            .sorted_tasks()
            .into_iter()
            .filter(|task| task.is_actionable())
            .cloned()
            .collect();
        Self {
            routine_id: routine.id.clone(),
            steps,
            cursor: 0,
        }
    }

    pub fn routine_id(&self) -> &str {
        &self.routine_id
    }

    pub fn steps(&self) -> &[Task] {
        &self.steps
    }

    /// Zero-based index of the current step.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&Task> {
        self.steps.get(self.cursor)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    /// Moves past the current step without completing it.
    pub fn skip(&mut self) {
        if !self.is_finished() {
            self.cursor += 1;
        }
    }

    pub fn previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Marks the current step completed and advances. Returns the completed
    /// step, or `None` when the run is already finished.
    pub fn complete_current(&mut self) -> Option<&Task> {
        let index = self.cursor;
        let step = self.steps.get_mut(index)?;
        step.is_completed = true;
        self.cursor += 1;
        self.steps.get(index)
    }

    /// `(completed, total)` over the run's steps.
    pub fn progress(&self) -> (usize, usize) {
        let completed = self.steps.iter().filter(|task| task.is_completed).count();
        (completed, self.steps.len())
    }
}
