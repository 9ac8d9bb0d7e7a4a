//! Scene graph model
//!
//! Typed in-memory records for one export or import pass:
//! - Node: rigid body / geometry proxy in a parent/child tree
//! - Joint: constraint between one or two nodes
//! - Material, Motor, Sensor: flat records referenced by id

mod graph;
mod joint;
mod material;
mod motor;
mod node;
mod sensor;

use std::collections::{BTreeMap, HashMap};

pub use joint::*;
pub use material::*;
pub use motor::*;
pub use node::*;
pub use sensor::*;

/// Scene graph for a single pass
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    /// Insertion order of nodes
    order: Vec<NodeId>,
    /// Children per node, in insertion order
    children: BTreeMap<NodeId, Vec<NodeId>>,
    joints: BTreeMap<JointId, Joint>,
    node_name_index: HashMap<String, NodeId>,
    joint_name_index: HashMap<String, JointId>,
    pub materials: Vec<Material>,
    pub motors: Vec<Motor>,
    pub sensors: Vec<Sensor>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Mutable node access; change parents through [`Scene::set_parent`]
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.node_name_index
            .get(name)
            .and_then(|id| self.nodes.get(id))
    }

    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(&id)
    }

    pub fn joint_mut(&mut self, id: JointId) -> Option<&mut Joint> {
        self.joints.get_mut(&id)
    }

    /// Joints in id order
    pub fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.joints.values()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn joint_by_name(&self, name: &str) -> Option<&Joint> {
        self.joint_name_index
            .get(name)
            .and_then(|id| self.joints.get(id))
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.iter().find(|m| m.id == id)
    }
}

/// Scene graph invariant violations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),

    #[error("Duplicate joint id: {0}")]
    DuplicateJoint(JointId),

    #[error("Parenting node {child} under {parent} would create a cycle")]
    WouldCreateCycle { child: NodeId, parent: NodeId },
}
