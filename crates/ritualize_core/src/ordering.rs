//! Order-key maintenance for routines and tasks.
//!
//! # Responsibility
//! - Compute insertion order for new entries.
//! - Compute new order keys when one entry is dragged to another position.
//!
//! # Invariants
//! - A move keeps the same set of entries and relocates exactly one.
//! - The moved entry receives `to` as its key; entries at positions `>= to`
//!   are bumped by one; entries before `to` keep their key.
//! - When that shift alone would not reproduce the dragged arrangement
//!   (keys drifted away from positions), keys are first rebased onto
//!   positions `0..n` and the same shift is applied.
//! - Key arithmetic never overflows. An append after `i64::MAX` reuses
//!   `i64::MAX` and relies on the insertion-order tie-break; a shift that
//!   would overflow takes the rebase path.
//!
//! Both task reorder (within one routine) and routine reorder (global) go
//! through the same functions.

use crate::model::routine::Routine;
use crate::model::task::Task;

/// Entity carrying an integer sort key.
pub trait OrderKeyed {
    fn order(&self) -> i64;
    fn set_order(&mut self, order: i64);
}

impl OrderKeyed for Task {
    fn order(&self) -> i64 {
        self.order
    }

    fn set_order(&mut self, order: i64) {
        self.order = order;
    }
}

impl OrderKeyed for Routine {
    fn order(&self) -> i64 {
        self.order
    }

    fn set_order(&mut self, order: i64) {
        self.order = order;
    }
}

/// Key for a new entry appended after `last` (the current maximum in sorted
/// order), or after an implicit `0` when the list is empty.
///
/// Saturates at `i64::MAX`. Equal keys sort by insertion order, so the new
/// entry still lands last.
pub fn next_order(last: Option<i64>) -> i64 {
    last.unwrap_or(0).saturating_add(1)
}

/// Stable ascending sort by order key. Ties keep their current relative order.
pub fn sort_by_order<T: OrderKeyed>(items: &mut [T]) {
    items.sort_by_key(|item| item.order());
}

/// Result of planning a move over a sorted key sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    /// New key per input position (aligned with the input slice).
    pub orders: Vec<i64>,
    /// Whether keys were rebased onto positions before shifting.
    pub rebased: bool,
}

impl MovePlan {
    /// Positions whose key differs from `current`, with their new key.
    pub fn changes<'a>(&'a self, current: &'a [i64]) -> impl Iterator<Item = (usize, i64)> + 'a {
        self.orders
            .iter()
            .zip(current)
            .enumerate()
            .filter(|(_, (next, previous))| next != previous)
            .map(|(index, (next, _))| (index, *next))
    }
}

/// Plans moving the entry at `from` so it lands before the entry currently
/// at `to` (`to == len` means "to the end").
///
/// `current` must be the key sequence in displayed (sorted) order.
///
/// # Panics
/// Panics when `from >= current.len()` or `to > current.len()`. Indices come
/// from list-reorder gestures and are a caller precondition.
pub fn plan_move(current: &[i64], from: usize, to: usize) -> MovePlan {
    let len = current.len();
    assert!(from < len, "move source index {from} out of range for {len} entries");
    assert!(to <= len, "move destination index {to} out of range for {len} entries");

    if let Some(shifted) = shift_orders(current, from, to) {
        if arranges_as_moved(&shifted, from, to) {
            return MovePlan {
                orders: shifted,
                rebased: false,
            };
        }
    }

    MovePlan {
        orders: rebased_orders(len, from, to),
        rebased: true,
    }
}

/// Applies a move in place to entries already in sorted order.
///
/// Only keys change; the slice itself is not reordered. Returns whether the
/// keys were rebased.
///
/// # Panics
/// Same preconditions as [`plan_move`].
pub fn apply_move<T: OrderKeyed>(sorted: &mut [T], from: usize, to: usize) -> bool {
    let current = sorted.iter().map(OrderKeyed::order).collect::<Vec<_>>();
    let plan = plan_move(&current, from, to);
    for (item, order) in sorted.iter_mut().zip(plan.orders) {
        item.set_order(order);
    }
    plan.rebased
}

/// Original positions listed in the arrangement a drag from `from` to `to`
/// produces.
pub fn moved_positions(len: usize, from: usize, to: usize) -> Vec<usize> {
    let mut positions = (0..len).collect::<Vec<_>>();
    let item = positions.remove(from);
    let destination = if to > from { to - 1 } else { to };
    positions.insert(destination, item);
    positions
}

// `None` when a bumped key would overflow.
fn shift_orders(current: &[i64], from: usize, to: usize) -> Option<Vec<i64>> {
    let destination_key = i64::try_from(to).ok()?;
    current
        .iter()
        .enumerate()
        .map(|(index, &order)| {
            if index == from {
                Some(destination_key)
            } else if index >= to {
                order.checked_add(1)
            } else {
                Some(order)
            }
        })
        .collect()
}

// Shift rule applied to keys rebased onto positions; values stay within `0..=len`.
fn rebased_orders(len: usize, from: usize, to: usize) -> Vec<i64> {
    (0..len)
        .map(|index| {
            let key = if index == from {
                to
            } else if index >= to {
                index + 1
            } else {
                index
            };
            key as i64
        })
        .collect()
}

// Strictly increasing keys along the expected arrangement means the sorted
// view shows exactly that arrangement, independent of tie-breaking.
fn arranges_as_moved(orders: &[i64], from: usize, to: usize) -> bool {
    moved_positions(orders.len(), from, to)
        .windows(2)
        .all(|pair| orders[pair[0]] < orders[pair[1]])
}

#[cfg(test)]
mod tests {
    use super::{apply_move, moved_positions, next_order, plan_move, sort_by_order};
    use crate::model::task::{Task, TaskType};

    fn tasks_with_orders(orders: &[i64]) -> Vec<Task> {
        orders
            .iter()
            .enumerate()
            .map(|(index, &order)| {
                Task::with_id(format!("t{index}"), "r1", format!("Task {index}"), order, TaskType::Task)
            })
            .collect()
    }

    fn sorted_ids(tasks: &[Task]) -> Vec<String> {
        let mut sorted = tasks.to_vec();
        sort_by_order(&mut sorted);
        sorted.into_iter().map(|task| task.id).collect()
    }

    #[test]
    fn next_order_appends_after_last() {
        assert_eq!(next_order(None), 1);
        assert_eq!(next_order(Some(0)), 1);
        assert_eq!(next_order(Some(41)), 42);
    }

    #[test]
    fn aligned_keys_follow_shift_rule_exactly() {
        let plan = plan_move(&[0, 1, 2, 3], 0, 2);
        assert!(!plan.rebased);
        assert_eq!(plan.orders, vec![2, 1, 3, 4]);

        let plan = plan_move(&[0, 1, 2, 3], 3, 0);
        assert!(!plan.rebased);
        assert_eq!(plan.orders, vec![1, 2, 3, 0]);
    }

    #[test]
    fn keys_before_destination_are_untouched() {
        let plan = plan_move(&[0, 1, 2, 3, 4], 4, 2);
        assert!(!plan.rebased);
        assert_eq!(&plan.orders[..2], &[0, 1]);
        assert_eq!(plan.orders[4], 2);
        assert_eq!(&plan.orders[2..4], &[3, 4]);
    }

    #[test]
    fn drifted_keys_are_rebased_when_shift_would_misplace() {
        // Shifting alone gives [2, 6, 8]: the moved entry would stay first.
        let plan = plan_move(&[5, 6, 7], 0, 2);
        assert!(plan.rebased);
        assert_eq!(plan.orders, vec![2, 1, 3]);
    }

    #[test]
    fn drifted_keys_keep_shift_when_it_already_works() {
        let plan = plan_move(&[1, 2, 3], 2, 0);
        assert!(!plan.rebased);
        assert_eq!(plan.orders, vec![2, 3, 0]);
    }

    #[test]
    fn changes_lists_only_modified_positions() {
        let current = [0, 1, 2, 3];
        let plan = plan_move(&current, 3, 1);
        let changes = plan.changes(&current).collect::<Vec<_>>();
        assert_eq!(changes, vec![(1, 2), (2, 3), (3, 1)]);
    }

    #[test]
    fn every_single_move_lands_at_requested_position() {
        for initial in [vec![0, 1, 2, 3, 4], vec![1, 2, 3, 4, 5], vec![3, 3, 9, 10, 40]] {
            let len = initial.len();
            for from in 0..len {
                for to in 0..=len {
                    let mut tasks = tasks_with_orders(&initial);
                    sort_by_order(&mut tasks);
                    let before = tasks.iter().map(|task| task.id.clone()).collect::<Vec<_>>();

                    apply_move(&mut tasks, from, to);

                    let expected = moved_positions(len, from, to)
                        .into_iter()
                        .map(|index| before[index].clone())
                        .collect::<Vec<_>>();
                    assert_eq!(
                        sorted_ids(&tasks),
                        expected,
                        "initial={initial:?} from={from} to={to}"
                    );
                }
            }
        }
    }

    #[test]
    fn repeated_moves_preserve_membership_and_position() {
        let mut tasks = tasks_with_orders(&[1, 2, 3, 4, 5, 6]);
        let moves = [(0, 6), (5, 0), (2, 4), (3, 1), (1, 5), (4, 4), (0, 3)];

        for (from, to) in moves {
            sort_by_order(&mut tasks);
            let moved_id = tasks[from].id.clone();
            apply_move(&mut tasks, from, to);

            let ids = sorted_ids(&tasks);
            assert_eq!(ids.len(), 6);
            let destination = if to > from { to - 1 } else { to };
            assert_eq!(ids[destination], moved_id, "from={from} to={to}");
        }

        let mut ids = sorted_ids(&tasks);
        ids.sort();
        assert_eq!(ids, vec!["t0", "t1", "t2", "t3", "t4", "t5"]);
    }

    #[test]
    fn next_order_saturates_at_max_key() {
        assert_eq!(next_order(Some(i64::MAX)), i64::MAX);
        assert_eq!(next_order(Some(i64::MAX - 1)), i64::MAX);
    }

    #[test]
    fn shift_that_would_overflow_is_rebased() {
        let plan = plan_move(&[1, i64::MAX], 0, 1);
        assert!(plan.rebased);
        assert_eq!(plan.orders, vec![1, 2]);

        let plan = plan_move(&[i64::MAX, i64::MAX], 1, 0);
        assert!(plan.rebased);
        assert_eq!(plan.orders, vec![1, 0]);
    }

    #[test]
    fn max_key_moves_without_overflow_when_not_bumped() {
        let plan = plan_move(&[1, i64::MAX], 1, 0);
        assert!(!plan.rebased);
        assert_eq!(plan.orders, vec![2, 0]);
    }

    #[test]
    fn every_move_lands_correctly_with_extreme_keys() {
        let initial = [i64::MIN, -4, i64::MAX - 1, i64::MAX, i64::MAX];
        let len = initial.len();
        for from in 0..len {
            for to in 0..=len {
                let mut tasks = tasks_with_orders(&initial);
                sort_by_order(&mut tasks);
                let before = tasks.iter().map(|task| task.id.clone()).collect::<Vec<_>>();

                apply_move(&mut tasks, from, to);

                let expected = moved_positions(len, from, to)
                    .into_iter()
                    .map(|index| before[index].clone())
                    .collect::<Vec<_>>();
                assert_eq!(sorted_ids(&tasks), expected, "from={from} to={to}");
            }
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_source_is_a_precondition_violation() {
        plan_move(&[0, 1], 2, 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_destination_is_a_precondition_violation() {
        plan_move(&[0, 1], 0, 3);
    }
}
