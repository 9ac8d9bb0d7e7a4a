//! Rigid-island grouping
//!
//! Fixed joints weld bodies into one rigid island. [`merge_fixed_groups`]
//! unions group ids across fixed joints; [`reconcile_hierarchy`] then
//! re-parents island members so editor nesting follows physics grouping.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::SceneError;
use crate::scene::{GraphError, GroupId, NodeId, Scene};

/// Union-find over group ids with path compression
#[derive(Debug, Default)]
pub struct GroupMerger {
    parent: BTreeMap<GroupId, GroupId>,
}

impl GroupMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Representative of a group id
    pub fn find(&mut self, group: GroupId) -> GroupId {
        let mut root = group;
        while let Some(&next) = self.parent.get(&root) {
            if next == root {
                break;
            }
            root = next;
        }

        // Path compression
        let mut current = group;
        while current != root {
            let next = self.parent.get(&current).copied().unwrap_or(root);
            self.parent.insert(current, root);
            current = next;
        }
        root
    }

    /// Merge `other` into `keep`'s class; returns false when already joined
    pub fn union(&mut self, keep: GroupId, other: GroupId) -> bool {
        let keep = self.find(keep);
        let other = self.find(other);
        if keep == other {
            return false;
        }
        self.parent.insert(other, keep);
        true
    }
}

/// Union the groups of every fixed joint's bodies and relabel nodes.
///
/// Joints are processed in id order. Nodes with group 0 are never merged.
/// Returns the number of nodes whose group id changed.
pub fn merge_fixed_groups(scene: &mut Scene) -> usize {
    let mut merger = GroupMerger::new();
    for joint in scene.joints().filter(|j| j.kind.is_fixed()) {
        let Some(node2) = joint.node2 else { continue };
        let (Some(a), Some(b)) = (scene.node(joint.node1), scene.node(node2)) else {
            continue;
        };
        if a.group_id == 0 || b.group_id == 0 {
            continue;
        }
        if merger.union(a.group_id, b.group_id) {
            tracing::debug!(
                "Fixed joint '{}' merges group {} into {}",
                joint.name,
                b.group_id,
                a.group_id
            );
        }
    }

    let mut relabeled = 0;
    let ids: Vec<NodeId> = scene.node_ids().to_vec();
    for id in ids {
        let Some(node) = scene.node_mut(id) else { continue };
        if node.group_id == 0 {
            continue;
        }
        let group = merger.find(node.group_id);
        if group != node.group_id {
            node.group_id = group;
            relabeled += 1;
        }
    }
    relabeled
}

/// Members of every non-zero group, in depth-first order
pub fn islands(scene: &Scene) -> BTreeMap<GroupId, Vec<NodeId>> {
    let mut islands: BTreeMap<GroupId, Vec<NodeId>> = BTreeMap::new();
    for id in scene.depth_first() {
        if let Some(node) = scene.node(id)
            && node.group_id != 0
        {
            islands.entry(node.group_id).or_default().push(id);
        }
    }
    islands
}

/// Outcome of hierarchy reconciliation
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Applied parent changes, in order
    pub reparented: Vec<(NodeId, Option<NodeId>)>,
    /// Islands that were left untouched
    pub diagnostics: Vec<SceneError>,
}

/// Re-parent the members of each multi-body island under its attachment body.
///
/// The attachment body is the unique node2 of the non-fixed joints reaching
/// into the island; otherwise the first island member acting as node1 of a
/// non-fixed joint. Islands without an attachment body, or whose plan would
/// create a cycle, are reported as `AmbiguousGrouping` and left unchanged.
pub fn reconcile_hierarchy(scene: &mut Scene) -> Reconciliation {
    let mut outcome = Reconciliation::default();

    for (group_id, members) in islands(scene) {
        if members.len() < 2 {
            continue;
        }
        let member_set: BTreeSet<NodeId> = members.iter().copied().collect();

        let mut candidates: Vec<NodeId> = Vec::new();
        for joint in scene.joints().filter(|j| !j.kind.is_fixed()) {
            if let Some(node2) = joint.node2
                && member_set.contains(&node2)
                && !candidates.contains(&node2)
            {
                candidates.push(node2);
            }
        }

        let target = if let [only] = candidates.as_slice() {
            Some(*only)
        } else {
            if candidates.len() > 1 {
                tracing::warn!(
                    "Group {} has {} joint attachment bodies, expected one",
                    group_id,
                    candidates.len()
                );
            }
            members.iter().copied().find(|&id| {
                scene
                    .joints()
                    .any(|j| !j.kind.is_fixed() && j.node1 == id)
            })
        };

        let Some(target) = target else {
            outcome.diagnostics.push(SceneError::AmbiguousGrouping {
                group_id,
                reason: "no joint attaches to this island".into(),
            });
            continue;
        };

        let applied = plan_island(scene, target, &members, &member_set).and_then(|plan| {
            apply_plan(scene, &plan).map_err(|err| err.to_string())?;
            Ok(plan)
        });
        match applied {
            Ok(plan) => outcome.reparented.extend(plan),
            Err(reason) => outcome
                .diagnostics
                .push(SceneError::AmbiguousGrouping { group_id, reason }),
        }
    }

    for diagnostic in &outcome.diagnostics {
        tracing::warn!("{}", diagnostic);
    }
    outcome
}

/// Apply parent changes in order, all or nothing.
///
/// The plan is replayed on a copy of the parent links first; the scene is
/// only touched when every step is valid.
pub(crate) fn apply_plan(
    scene: &mut Scene,
    plan: &[(NodeId, Option<NodeId>)],
) -> Result<(), GraphError> {
    let mut parents: BTreeMap<NodeId, Option<NodeId>> =
        scene.nodes().map(|n| (n.id, n.parent)).collect();

    for &(child, parent) in plan {
        if !parents.contains_key(&child) {
            return Err(GraphError::NodeNotFound(child));
        }
        if let Some(parent) = parent {
            let mut current = Some(parent);
            while let Some(id) = current {
                if id == child {
                    return Err(GraphError::WouldCreateCycle { child, parent });
                }
                current = *parents.get(&id).ok_or(GraphError::NodeNotFound(id))?;
            }
        }
        parents.insert(child, parent);
    }

    for &(child, parent) in plan {
        scene.set_parent(child, parent)?;
    }
    Ok(())
}

/// Parent changes moving every member under `target`.
///
/// `target` itself is lifted to its nearest ancestor outside the island.
fn plan_island(
    scene: &Scene,
    target: NodeId,
    members: &[NodeId],
    member_set: &BTreeSet<NodeId>,
) -> Result<Vec<(NodeId, Option<NodeId>)>, String> {
    let parent_of = |id: NodeId| scene.node(id).and_then(|n| n.parent);

    let mut anchor = parent_of(target);
    while let Some(id) = anchor {
        if !member_set.contains(&id) {
            break;
        }
        anchor = parent_of(id);
    }

    // Members above the new attachment point would end up below themselves
    let mut current = anchor;
    while let Some(id) = current {
        if member_set.contains(&id) {
            let name = scene.node(id).map(|n| n.name.as_str()).unwrap_or("?");
            return Err(format!(
                "member '{name}' is an ancestor of the island attachment point"
            ));
        }
        current = parent_of(id);
    }

    let mut plan = Vec::new();
    if parent_of(target) != anchor {
        plan.push((target, anchor));
    }
    for &member in members {
        if member != target && parent_of(member) != Some(target) {
            plan.push((member, Some(target)));
        }
    }
    Ok(plan)
}
