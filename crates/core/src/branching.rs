//! Branch graph logic: branch-copy planning and ancestry walks.
//!
//! A timeline may branch from a scene through a nullable `branch_from`
//! reference. Nothing in storage keeps these references acyclic, so the
//! ancestry walk detects revisits instead of assuming a tree.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::CoreError;
use crate::ordering::{compare_slots, SceneSlot};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Color given to a branch timeline when the request omits one.
pub const DEFAULT_BRANCH_COLOR: &str = "#F59E0B";

/// Color given to a new timeline when the request omits one.
pub const DEFAULT_TIMELINE_COLOR: &str = "#1CB0F6";

// ---------------------------------------------------------------------------
// Branch copy
// ---------------------------------------------------------------------------

/// One scene to duplicate into the new branch timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchCopy {
    pub source_scene_id: DbId,
    pub new_order: i32,
}

/// Scenes after the branch point, renumbered from 1 in their original
/// relative order. The branch-point scene itself is not copied.
pub fn plan_branch_copy(source_order: i32, timeline: &[SceneSlot]) -> Vec<BranchCopy> {
    let mut later: Vec<SceneSlot> = timeline
        .iter()
        .filter(|s| s.order > source_order)
        .copied()
        .collect();
    later.sort_by(compare_slots);
    later
        .into_iter()
        .enumerate()
        .map(|(index, slot)| BranchCopy {
            source_scene_id: slot.id,
            new_order: index as i32 + 1,
        })
        .collect()
}

/// A branch origin must live in the same universe as the timeline.
pub fn ensure_same_universe(
    timeline_universe_id: DbId,
    scene_universe_id: DbId,
) -> Result<(), CoreError> {
    if timeline_universe_id == scene_universe_id {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "branch_from_id: scene belongs to a different universe".to_string(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Ancestry
// ---------------------------------------------------------------------------

/// The branch reference of one timeline, resolved to the origin scene's
/// timeline.
#[derive(Debug, Clone, Copy)]
pub struct BranchLink {
    pub timeline_id: DbId,
    pub branch_from_scene_id: Option<DbId>,
    pub origin_timeline_id: Option<DbId>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AncestryStep {
    pub timeline_id: DbId,
    /// The scene this timeline branched from, if any.
    pub branch_from_scene_id: Option<DbId>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Ancestry {
    /// The starting timeline first, its root last.
    pub steps: Vec<AncestryStep>,
    /// True when the walk stopped because it revisited a timeline.
    pub cyclic: bool,
}

/// Follow `branch_from` links from `start` until a root or a revisit.
pub fn ancestry(start: DbId, links: &[BranchLink]) -> Ancestry {
    let by_id: HashMap<DbId, &BranchLink> = links.iter().map(|l| (l.timeline_id, l)).collect();
    let mut visited = HashSet::new();
    let mut steps = Vec::new();
    let mut current = Some(start);

    while let Some(timeline_id) = current {
        if !visited.insert(timeline_id) {
            return Ancestry { steps, cyclic: true };
        }
        let link = by_id.get(&timeline_id);
        steps.push(AncestryStep {
            timeline_id,
            branch_from_scene_id: link.and_then(|l| l.branch_from_scene_id),
        });
        current = link.and_then(|l| l.origin_timeline_id);
    }

    Ancestry {
        steps,
        cyclic: false,
    }
}
