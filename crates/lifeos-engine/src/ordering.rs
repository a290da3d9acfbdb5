//! Shared reorder arithmetic.
//!
//! Manual reordering persists through the priority column: the first item of
//! the new ordering gets the highest value, `priority = len - index`. Both
//! the task list and the project backlog use the same rewrite.

use lifeos_core::Goal;
use lifeos_store::PriorityRewrite;

/// Batched `{id, priority}` rewrites for a caller-supplied ordering.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub(crate) fn priority_rewrites(ordered: &[Goal]) -> Vec<PriorityRewrite> {
    let len = ordered.len();
    ordered
        .iter()
        .enumerate()
        .map(|(index, goal)| PriorityRewrite {
            id: goal.id,
            priority: (len - index) as i32,
        })
        .collect()
}
