//! Sensor definition

use std::collections::BTreeMap;

use super::{JointId, NodeId};

pub type SensorId = u32;

/// Type-specific sensor parameters
#[derive(Debug, Clone, PartialEq)]
pub enum SensorParams {
    /// Force/torque at a joint
    Joint6Dof { node: NodeId, joint: JointId },
    /// Ray fan attached to a node
    Ray {
        attached_node: NodeId,
        width: u32,
        opening_width: f32,
        max_distance: f32,
    },
    /// Any other sensor type; fields are kept as text
    Generic {
        type_name: String,
        fields: BTreeMap<String, String>,
    },
}

impl SensorParams {
    pub const JOINT_6DOF: &'static str = "Joint6DOF";
    pub const RAY: &'static str = "RaySensor";

    pub fn type_name(&self) -> &str {
        match self {
            SensorParams::Joint6Dof { .. } => Self::JOINT_6DOF,
            SensorParams::Ray { .. } => Self::RAY,
            SensorParams::Generic { type_name, .. } => type_name,
        }
    }
}

/// Sensor sampling scene objects
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pub id: SensorId,
    pub name: String,
    /// Sampling rate in Hz
    pub rate: f32,
    /// Node or joint ids in authoring order
    pub referenced_ids: Vec<u32>,
    pub params: SensorParams,
}
