//! Scene ordering within a timeline.
//!
//! Scenes carry a 1-based `order`. These functions compute the writes needed
//! to append, renumber after a delete, and apply a drag-and-drop reorder. The
//! repository layer executes the plans inside a transaction.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::CoreError;
use crate::types::DbId;

/// A scene's identity and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneSlot {
    pub id: DbId,
    pub order: i32,
}

/// One `order` write produced by a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAssignment {
    pub scene_id: DbId,
    pub order: i32,
}

/// Canonical scene comparator: ascending `order`, then ascending id.
///
/// The id tie-break keeps results stable when concurrent writes left two
/// scenes sharing an order.
pub fn compare_slots(a: &SceneSlot, b: &SceneSlot) -> Ordering {
    a.order.cmp(&b.order).then(a.id.cmp(&b.id))
}

/// Order for a scene appended to a timeline whose highest order is `max`.
pub fn next_order(max: Option<i32>) -> i32 {
    max.map_or(1, |m| m + 1)
}

/// Renumber scenes to `1..=N` in canonical order, closing any gaps.
///
/// Only scenes whose order actually changes are returned.
pub fn renumber(slots: &[SceneSlot]) -> Vec<OrderAssignment> {
    let mut sorted = slots.to_vec();
    sorted.sort_by(compare_slots);
    sorted
        .iter()
        .enumerate()
        .filter_map(|(index, slot)| {
            let order = index as i32 + 1;
            (slot.order != order).then_some(OrderAssignment {
                scene_id: slot.id,
                order,
            })
        })
        .collect()
}

/// Assign `order = index + 1` following `requested`.
///
/// `requested` must be a permutation of `existing`: every scene of the
/// timeline exactly once and nothing else. A partial list would leave
/// duplicate orders behind, so it is rejected.
pub fn reorder(existing: &[DbId], requested: &[DbId]) -> Result<Vec<OrderAssignment>, CoreError> {
    let known: HashSet<DbId> = existing.iter().copied().collect();
    let mut seen = HashSet::with_capacity(requested.len());

    for id in requested {
        if !known.contains(id) {
            return Err(CoreError::Validation(format!(
                "scene_ids: scene {id} does not belong to this timeline"
            )));
        }
        if !seen.insert(*id) {
            return Err(CoreError::Validation(format!(
                "scene_ids: scene {id} is listed more than once"
            )));
        }
    }
    if seen.len() != known.len() {
        return Err(CoreError::Validation(format!(
            "scene_ids: expected all {} scenes of the timeline, got {}",
            known.len(),
            seen.len()
        )));
    }

    Ok(requested
        .iter()
        .enumerate()
        .map(|(index, id)| OrderAssignment {
            scene_id: *id,
            order: index as i32 + 1,
        })
        .collect())
}

/// True when the orders are exactly `1..=N`.
pub fn is_contiguous(slots: &[SceneSlot]) -> bool {
    let mut orders: Vec<i32> = slots.iter().map(|s| s.order).collect();
    orders.sort_unstable();
    orders.iter().enumerate().all(|(i, o)| *o == i as i32 + 1)
}
