//! Graph operations for Scene (add, parent, traverse)

use super::{GraphError, Joint, JointId, Node, NodeId, Scene};

impl Scene {
    /// Add a node; its parent (if any) must already be in the scene
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        if let Some(parent) = node.parent {
            if !self.nodes.contains_key(&parent) {
                return Err(GraphError::NodeNotFound(parent));
            }
            self.children.entry(parent).or_default().push(id);
        }

        self.node_name_index.insert(node.name.clone(), id);
        self.nodes.insert(id, node);
        self.order.push(id);
        Ok(id)
    }

    /// Add a joint; node1 and node2 (if set) must exist
    pub fn add_joint(&mut self, joint: Joint) -> Result<JointId, GraphError> {
        let id = joint.id;
        if self.joints.contains_key(&id) {
            return Err(GraphError::DuplicateJoint(id));
        }
        if !self.nodes.contains_key(&joint.node1) {
            return Err(GraphError::NodeNotFound(joint.node1));
        }
        if let Some(node2) = joint.node2
            && !self.nodes.contains_key(&node2)
        {
            return Err(GraphError::NodeNotFound(node2));
        }

        self.joint_name_index.insert(joint.name.clone(), id);
        self.joints.insert(id, joint);
        Ok(id)
    }

    /// Re-parent a node (None makes it a root)
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&child) {
            return Err(GraphError::NodeNotFound(child));
        }
        if let Some(parent) = parent {
            if !self.nodes.contains_key(&parent) {
                return Err(GraphError::NodeNotFound(parent));
            }
            if self.would_create_cycle(parent, child) {
                return Err(GraphError::WouldCreateCycle { child, parent });
            }
        }

        let old = self.nodes.get(&child).and_then(|n| n.parent);
        if old == parent {
            return Ok(());
        }
        if let Some(old) = old
            && let Some(siblings) = self.children.get_mut(&old)
        {
            siblings.retain(|&id| id != child);
        }
        if let Some(parent) = parent {
            self.children.entry(parent).or_default().push(child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = parent;
        }
        Ok(())
    }

    /// Check if parenting child under parent would create a cycle
    pub(crate) fn would_create_cycle(&self, parent_id: NodeId, child_id: NodeId) -> bool {
        // Check if child is an ancestor of parent (or the parent itself)
        let mut current = Some(parent_id);
        while let Some(id) = current {
            if id == child_id {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    /// Children of a node in insertion order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Root nodes in insertion order
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| n.parent.is_none())
            .map(|n| n.id)
            .collect()
    }

    /// All nodes, parents before children, depth-first from the roots
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots().into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        out
    }
}
