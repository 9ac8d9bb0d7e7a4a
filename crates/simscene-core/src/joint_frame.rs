//! Joint anchor, axis, and angular-offset resolution

use glam::Vec3;

use crate::error::{ElementKind, SceneError, SceneResult};
use crate::scene::{Joint, Scene};
use crate::types::AnchorPolicy;

/// Squared-length threshold below which an axis is degenerate
const DEGENERATE_AXIS_EPS: f32 = 1e-12;

/// Resolved frame of a non-fixed joint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointFrame {
    /// Anchor in world space
    pub anchor: Vec3,
    /// Unit axis in world space
    pub axis: Vec3,
    /// Angular offset between joint frame and node2 (radians)
    pub angle_offset: f32,
}

/// Resolve the frame of one joint.
///
/// Returns `Ok(None)` for fixed joints, which only feed group merging.
pub fn resolve_joint_frame(joint: &Joint, scene: &Scene) -> SceneResult<Option<JointFrame>> {
    if joint.kind.is_fixed() {
        return Ok(None);
    }

    let node1 = scene.node(joint.node1).ok_or_else(|| {
        SceneError::unresolved(ElementKind::Joint, &joint.name, "nodeindex1", joint.node1)
    })?;
    let node2 = joint.node2.and_then(|id| scene.node(id));

    let p1 = node1.world_pivot();
    let anchor = match (joint.anchor_policy, node2) {
        (AnchorPolicy::AtNode1, _) => p1,
        (AnchorPolicy::AtNode2, Some(node2)) => node2.world_pivot(),
        (AnchorPolicy::Midpoint, Some(node2)) => (p1 + node2.world_pivot()) * 0.5,
        (AnchorPolicy::Custom(anchor), _) => anchor,
        (policy, None) => {
            tracing::debug!(
                "Joint '{}' has anchor {} but no node2, anchoring at node1",
                joint.name,
                policy.name()
            );
            p1
        }
    };

    let mut axis = joint.frame_rotation * (Vec3::Z * joint.frame_scale.z);
    if joint.invert_axis {
        axis = -axis;
    }
    if axis.length_squared() < DEGENERATE_AXIS_EPS {
        return Err(SceneError::DegenerateAxis {
            id: joint.id,
            name: joint.name.clone(),
        });
    }
    let axis = axis.normalize();

    let angle_offset = match (joint.authored_offset, node2) {
        (Some(offset), _) => offset,
        (None, Some(node2)) => {
            let v1 = joint.frame_rotation * Vec3::X;
            let v2 = node2.world.rotation * Vec3::X;
            let cross = v1.cross(v2);
            let angle = cross.length().atan2(v1.dot(v2));
            if (joint.frame_rotation.inverse() * cross).z > 0.0 {
                -angle
            } else {
                angle
            }
        }
        (None, None) => 0.0,
    };

    Ok(Some(JointFrame {
        anchor,
        axis,
        angle_offset,
    }))
}

impl Scene {
    /// Resolve and store the frames of all non-fixed joints.
    ///
    /// A degenerate axis aborts the pass.
    pub fn resolve_joint_frames(&mut self) -> SceneResult<usize> {
        let mut resolved = Vec::new();
        for joint in self.joints() {
            if let Some(frame) = resolve_joint_frame(joint, self)? {
                resolved.push((joint.id, frame));
            }
        }

        let count = resolved.len();
        for (id, frame) in resolved {
            if let Some(joint) = self.joint_mut(id) {
                joint.anchor = frame.anchor;
                joint.axis = frame.axis;
                joint.angle_offset = frame.angle_offset;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::scene::Node;
    use crate::types::{JointKind, Pose};
    use approx::assert_relative_eq;
    use glam::Quat;

    fn two_bodies() -> Scene {
        let mut scene = Scene::new();
        let mut a = Node::new(1, "a");
        a.world = Pose::from_position(Vec3::new(0.0, 0.0, 0.0));
        scene.add_node(a).unwrap();
        let mut b = Node::new(2, "b");
        b.parent = Some(1);
        b.world = Pose::new(Vec3::new(2.0, 0.0, 1.0), Quat::from_rotation_z(0.5));
        scene.add_node(b).unwrap();
        scene
    }

    fn hinge(policy: AnchorPolicy) -> Joint {
        Joint::new(1, "hinge", JointKind::Hinge, 1)
            .with_node2(2)
            .with_anchor_policy(policy)
    }

    #[test]
    fn test_anchor_policies() {
        let scene = two_bodies();
        let at = |policy| resolve_joint_frame(&hinge(policy), &scene).unwrap().unwrap().anchor;

        assert_eq!(at(AnchorPolicy::AtNode1), Vec3::ZERO);
        assert_eq!(at(AnchorPolicy::AtNode2), Vec3::new(2.0, 0.0, 1.0));
        assert_eq!(at(AnchorPolicy::Midpoint), Vec3::new(1.0, 0.0, 0.5));
        let custom = Vec3::new(7.0, 8.0, 9.0);
        assert_eq!(at(AnchorPolicy::Custom(custom)), custom);
    }

    #[test]
    fn test_missing_node2_anchors_at_node1() {
        let scene = two_bodies();
        let joint = Joint::new(1, "free", JointKind::Ball, 2).with_anchor_policy(AnchorPolicy::Midpoint);
        let frame = resolve_joint_frame(&joint, &scene).unwrap().unwrap();
        assert_eq!(frame.anchor, Vec3::new(2.0, 0.0, 1.0));
        assert_eq!(frame.angle_offset, 0.0);
    }

    #[test]
    fn test_axis_follows_frame_and_inversion() {
        let scene = two_bodies();
        let rotation = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        let mut joint = hinge(AnchorPolicy::AtNode2).with_frame_rotation(rotation);
        let frame = resolve_joint_frame(&joint, &scene).unwrap().unwrap();
        assert!(frame.axis.abs_diff_eq(-Vec3::Y, 1e-6));

        joint.invert_axis = true;
        let frame = resolve_joint_frame(&joint, &scene).unwrap().unwrap();
        assert!(frame.axis.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn test_degenerate_axis_is_fatal() {
        let mut scene = two_bodies();
        let mut joint = hinge(AnchorPolicy::AtNode2);
        joint.frame_scale = Vec3::new(1.0, 1.0, 0.0);
        scene.add_joint(joint).unwrap();

        let err = scene.resolve_joint_frames().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateAxis);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_fixed_joint_has_no_frame() {
        let scene = two_bodies();
        let mut joint = Joint::new(3, "weld", JointKind::Fixed, 1).with_node2(2);
        joint.frame_scale = Vec3::ZERO;
        assert_eq!(resolve_joint_frame(&joint, &scene).unwrap(), None);
    }

    #[test]
    fn test_angle_offset_sign() {
        let scene = two_bodies();
        // node2 is rotated +0.5 about Z relative to an identity joint frame
        let frame = resolve_joint_frame(&hinge(AnchorPolicy::AtNode2), &scene)
            .unwrap()
            .unwrap();
        assert_relative_eq!(frame.angle_offset, -0.5, epsilon = 1e-5);

        let turned = hinge(AnchorPolicy::AtNode2).with_frame_rotation(Quat::from_rotation_z(1.0));
        let frame = resolve_joint_frame(&turned, &scene).unwrap().unwrap();
        assert_relative_eq!(frame.angle_offset, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_authored_offset_used_verbatim() {
        let scene = two_bodies();
        let mut joint = hinge(AnchorPolicy::AtNode2);
        joint.authored_offset = Some(1.25);
        let frame = resolve_joint_frame(&joint, &scene).unwrap().unwrap();
        assert_eq!(frame.angle_offset, 1.25);
    }
}
