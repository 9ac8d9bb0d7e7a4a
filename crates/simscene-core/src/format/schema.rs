//! Typed records for each scene element kind

use glam::{Quat, Vec3};

use crate::config::FormatVersion;
use crate::scene::{GroupId, JointId, MassSpec, Material, Motor, NodeId, Sensor};
use crate::types::{AnchorPolicy, JointKind, Pose, PrimitiveKind};

/// Filename marker for nodes without a mesh file
pub const PRIMITIVE_FILENAME: &str = "PRIMITIVE";

/// One `<node>` element
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub name: String,
    pub origname: String,
    /// Mesh file name, or `None` for primitives
    pub filename: Option<String>,
    pub index: NodeId,
    pub group_id: GroupId,
    pub primitive: PrimitiveKind,
    /// Parent node; the pose is then relative to it
    pub relative_id: Option<NodeId>,
    /// Pivot-frame pose, world or parent-relative
    pub pose: Pose,
    pub movable: bool,
    pub extents: Vec3,
    /// 0 = no material
    pub material_id: u32,
    pub mass: MassSpec,
    pub pivot: Vec3,
    pub visual_size: Vec3,
    pub visual_offset: Pose,
    pub collision_bitmask: u32,
}

/// One `<joint>` element
#[derive(Debug, Clone, PartialEq)]
pub struct JointRecord {
    pub name: String,
    pub index: JointId,
    pub kind: JointKind,
    pub node1: NodeId,
    pub node2: Option<NodeId>,
    pub anchor_policy: AnchorPolicy,
    pub anchor: Vec3,
    pub axis: Vec3,
    pub low_stop: Option<f32>,
    pub high_stop: Option<f32>,
    pub damping_const: Option<f32>,
    pub spring_const: Option<f32>,
    pub angle_offset: f32,
}

/// A complete scene description
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneDescription {
    pub version: FormatVersion,
    pub nodes: Vec<NodeRecord>,
    pub joints: Vec<JointRecord>,
    pub motors: Vec<Motor>,
    pub materials: Vec<Material>,
    pub sensors: Vec<Sensor>,
}

impl SceneDescription {
    pub fn new(version: FormatVersion) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }
}

/// Compatibility notes logged when reading an old scene
pub(crate) const LEGACY_VERSION_NOTES: &[&str] = &[
    "sphere extents are diameters instead of radii",
    "primitive types may be numeric codes instead of names",
    "Joint6DOF sensors may list ids instead of nodeID/jointID",
    "nodes carry no <pivot>",
];

/// Extents as stored for `version`; 0.1 spheres use the diameter
pub(crate) fn extents_for_version(primitive: PrimitiveKind, extents: Vec3, version: FormatVersion) -> Vec3 {
    if primitive == PrimitiveKind::Sphere && version == FormatVersion::V0_1 {
        extents * 2.0
    } else {
        extents
    }
}

/// Extents read from a file of `version`, in current convention
pub(crate) fn extents_from_version(primitive: PrimitiveKind, extents: Vec3, version: FormatVersion) -> Vec3 {
    if primitive == PrimitiveKind::Sphere && version == FormatVersion::V0_1 {
        extents * 0.5
    } else {
        extents
    }
}

pub(crate) fn is_identity(pose: &Pose) -> bool {
    pose.position == Vec3::ZERO && pose.rotation == Quat::IDENTITY
}
