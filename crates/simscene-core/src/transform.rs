//! World ⟷ parent-relative transform resolution
//!
//! Physics records are anchored at the node pivot, not at the editor object
//! origin. The pivot frame of a node is `(world_pivot, world.rotation)`;
//! relative transforms are expressed between pivot frames.

use glam::Vec3;

use crate::scene::{Node, Scene};
use crate::types::Pose;

/// Pivot-anchored world pose used by the physics engine
pub fn physics_pose(node: &Node) -> Pose {
    Pose::new(node.world_pivot(), node.world.rotation)
}

/// Transform of `node` relative to `parent`; roots keep their world pose
pub fn world_to_relative(node: &Node, parent: Option<&Node>) -> Pose {
    let own = physics_pose(node);
    match parent {
        Some(parent) => {
            let parent_rotation = parent.world.rotation.inverse();
            Pose {
                position: parent_rotation * (own.position - parent.world_pivot()),
                rotation: (parent_rotation * own.rotation).normalize(),
            }
        }
        None => own,
    }
}

/// Object-origin world pose from a parent-relative pose and the node pivot.
///
/// Inverse of [`world_to_relative`]; `parent` must already carry its world
/// transform.
pub fn relative_to_world(relative: &Pose, pivot: Vec3, parent: Option<&Node>) -> Pose {
    let pivot_frame = match parent {
        Some(parent) => physics_pose(parent).compose(relative),
        None => *relative,
    };
    Pose {
        position: pivot_frame.position - pivot_frame.rotation * pivot,
        rotation: pivot_frame.rotation,
    }
}

/// World pose of the render geometry: physics pose followed by the visual offset
pub fn visual_world_pose(node: &Node) -> Pose {
    physics_pose(node).compose(&node.visual_offset)
}

impl Scene {
    /// Fill every node's `local` pose from its world pose
    pub fn resolve_relative_transforms(&mut self) {
        for id in self.depth_first() {
            let Some(node) = self.node(id) else { continue };
            let parent = node.parent.and_then(|p| self.node(p));
            let local = world_to_relative(node, parent);
            if let Some(node) = self.node_mut(id) {
                node.local = local;
            }
        }
    }

    /// Rebuild world poses from `local` top-down, parents before children
    pub fn resolve_world_transforms(&mut self) {
        for id in self.depth_first() {
            let Some(node) = self.node(id) else { continue };
            let parent = node.parent.and_then(|p| self.node(p));
            let world = relative_to_world(&node.local, node.pivot, parent);
            if let Some(node) = self.node_mut(id) {
                node.world = world;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::{EulerRot, Quat};

    fn node(id: u32, position: Vec3, rotation: Quat, pivot: Vec3) -> Node {
        let mut node = Node::new(id, format!("n{id}"));
        node.world = Pose::new(position, rotation);
        node.pivot = pivot;
        node
    }

    #[test]
    fn test_root_relative_is_pivot_world() {
        let root = node(1, Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::new(0.0, 0.0, 0.5));
        let rel = world_to_relative(&root, None);
        assert_relative_eq!(rel.position.z, 3.5);
        assert_relative_eq!(rel.position.x, 1.0);
    }

    #[test]
    fn test_relative_position_in_parent_frame() {
        let parent = node(1, Vec3::ZERO, Quat::from_rotation_z(std::f32::consts::FRAC_PI_2), Vec3::ZERO);
        let child = node(2, Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY, Vec3::ZERO);
        let rel = world_to_relative(&child, Some(&parent));
        // parent +X points along world +Y
        assert!(rel.position.abs_diff_eq(Vec3::X, 1e-6));
        let expected = Pose::new(Vec3::X, Quat::from_rotation_z(-std::f32::consts::FRAC_PI_2));
        assert!(rel.abs_diff_eq(&expected, 1e-6, 1e-6));
    }

    #[test]
    fn test_round_trip_reproduces_world() {
        let rotations = [
            Quat::IDENTITY,
            Quat::from_euler(EulerRot::XYZ, 0.4, -1.2, 2.5),
            Quat::from_euler(EulerRot::ZYX, -3.0, 0.9, 0.1),
        ];
        let pivots = [Vec3::ZERO, Vec3::new(0.3, -0.1, 0.25)];
        for (i, parent_rot) in rotations.iter().enumerate() {
            for child_rot in &rotations {
                for pivot in &pivots {
                    let parent = node(1, Vec3::new(i as f32, -2.0, 0.7), *parent_rot, *pivot);
                    let child = node(2, Vec3::new(-1.5, 4.0, 2.0), *child_rot, -*pivot);
                    let rel = world_to_relative(&child, Some(&parent));
                    let world = relative_to_world(&rel, child.pivot, Some(&parent));
                    assert!(world.abs_diff_eq(&child.world, 1e-4, 1e-4));
                }
            }
        }
    }

    #[test]
    fn test_scene_resolution_top_down() {
        let mut scene = Scene::new();
        scene
            .add_node(node(1, Vec3::new(0.0, 0.0, 1.0), Quat::from_rotation_x(0.5), Vec3::ZERO))
            .unwrap();
        let mut child = node(2, Vec3::new(1.0, 1.0, 1.0), Quat::from_rotation_y(-0.3), Vec3::Z * 0.1);
        child.parent = Some(1);
        scene.add_node(child).unwrap();
        let mut grandchild = node(3, Vec3::new(2.0, 0.0, -1.0), Quat::IDENTITY, Vec3::ZERO);
        grandchild.parent = Some(2);
        scene.add_node(grandchild).unwrap();

        let expected: Vec<Pose> = scene.nodes().map(|n| n.world).collect();
        scene.resolve_relative_transforms();
        for id in [1, 2, 3] {
            scene.node_mut(id).unwrap().world = Pose::IDENTITY;
        }
        scene.resolve_world_transforms();

        for (node, want) in scene.nodes().zip(expected) {
            assert!(node.world.abs_diff_eq(&want, 1e-4, 1e-4), "node {}", node.id);
        }
    }

    #[test]
    fn test_visual_pose_recovers_origin() {
        let mut mesh_node = node(
            1,
            Vec3::new(2.0, 0.0, 0.0),
            Quat::from_rotation_z(1.0),
            Vec3::new(0.5, 0.5, 0.0),
        );
        mesh_node.visual_offset = Pose::from_position(-mesh_node.pivot);
        let visual = visual_world_pose(&mesh_node);
        assert!(visual.abs_diff_eq(&mesh_node.world, 1e-5, 1e-5));
    }
}
