//! Joint (physical constraint) definition

use glam::{Quat, Vec3};

use crate::types::{AnchorPolicy, JointKind};

use super::NodeId;

pub type JointId = u32;

/// A physical constraint linking one or two nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub id: JointId,
    pub name: String,
    pub kind: JointKind,
    pub node1: NodeId,
    pub node2: Option<NodeId>,
    pub anchor_policy: AnchorPolicy,
    /// World rotation of the joint frame (axis = frame +Z)
    pub frame_rotation: Quat,
    /// Non-uniform scale of the joint frame
    pub frame_scale: Vec3,
    pub invert_axis: bool,
    /// Resolved anchor in world space
    pub anchor: Vec3,
    /// Resolved unit axis in world space
    pub axis: Vec3,
    pub low_stop: Option<f32>,
    pub high_stop: Option<f32>,
    pub spring_const: Option<f32>,
    pub damping_const: Option<f32>,
    /// Resolved angular offset in radians
    pub angle_offset: f32,
    /// Offset authored by hand; used verbatim instead of being computed
    pub authored_offset: Option<f32>,
}

impl Joint {
    pub fn new(id: JointId, name: impl Into<String>, kind: JointKind, node1: NodeId) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            node1,
            node2: None,
            anchor_policy: AnchorPolicy::default(),
            frame_rotation: Quat::IDENTITY,
            frame_scale: Vec3::ONE,
            invert_axis: false,
            anchor: Vec3::ZERO,
            axis: Vec3::Z,
            low_stop: None,
            high_stop: None,
            spring_const: None,
            damping_const: None,
            angle_offset: 0.0,
            authored_offset: None,
        }
    }

    pub fn with_node2(mut self, node2: NodeId) -> Self {
        self.node2 = Some(node2);
        self
    }

    pub fn with_anchor_policy(mut self, policy: AnchorPolicy) -> Self {
        self.anchor_policy = policy;
        self
    }

    pub fn with_frame_rotation(mut self, rotation: Quat) -> Self {
        self.frame_rotation = rotation;
        self
    }

    /// Whether export pairs this joint with a motor record
    pub fn needs_motor(&self) -> bool {
        self.kind.is_motorized() && self.spring_const.is_none()
    }
}
