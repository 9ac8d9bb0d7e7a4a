//! Node (rigid body / geometry proxy) definition

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::mesh::Mesh;
use crate::types::{Pose, PrimitiveKind};

pub type NodeId = u32;
pub type GroupId = u32;
pub type MaterialId = u32;

/// Mass specification; mass and density are mutually exclusive
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum MassSpec {
    #[default]
    Unset,
    Mass(f32),
    Density(f32),
}

/// A rigid body or geometry proxy in the scene graph
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub parent: Option<NodeId>,
    /// 0 = ungrouped; otherwise shared by one rigid island
    pub group_id: GroupId,
    /// Transform relative to the parent (world transform for roots)
    pub local: Pose,
    /// Transform of the object origin in world space
    pub world: Pose,
    /// Bounding-box centroid in local coordinates
    pub pivot: Vec3,
    pub extents: Vec3,
    /// Size of the render geometry
    pub visual_size: Vec3,
    /// Pose of the render mesh origin in the pivot frame
    pub visual_offset: Pose,
    pub primitive: PrimitiveKind,
    pub mass: MassSpec,
    pub material_id: Option<MaterialId>,
    pub collision_bitmask: u32,
    pub movable: bool,
    /// Mesh asset file name inside the archive
    pub filename: Option<String>,
    pub mesh: Option<Mesh>,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            group_id: 0,
            local: Pose::IDENTITY,
            world: Pose::IDENTITY,
            pivot: Vec3::ZERO,
            extents: Vec3::ONE,
            visual_size: Vec3::ONE,
            visual_offset: Pose::IDENTITY,
            primitive: PrimitiveKind::Box,
            mass: MassSpec::Unset,
            material_id: None,
            collision_bitmask: 0,
            movable: true,
            filename: None,
            mesh: None,
        }
    }

    /// Pivot (physics origin) in world space
    pub fn world_pivot(&self) -> Vec3 {
        self.world.transform_point(self.pivot)
    }

    /// Whether the node ships its own mesh file
    pub fn is_mesh_backed(&self) -> bool {
        self.mesh.is_some()
    }
}
