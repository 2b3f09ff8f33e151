//! Arena-based node tree. `Scene` owns a flat `Vec<NodeData>`; a `NodeId`
//! indexes it, and `NodeData::parent` is the tree's only back-reference —
//! a non-owning index rather than a pointer, so the tree has one owner
//! (the arena) with no shared mutability anywhere.

use glam::Mat4;

use crate::metadata::Metadata;

/// Index of a node within a [`crate::scene::Scene`]'s node arena. The root
/// node is always `NodeId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

#[derive(Debug, Clone, Default)]
pub struct NodeData {
    pub name: String,
    pub transform: Mat4,
    /// Non-owning back-reference; `None` only for the root.
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Indices into `Scene::meshes`.
    pub meshes: Vec<u32>,
    pub metadata: Metadata,
}

impl NodeData {
    fn new(name: impl Into<String>, parent: Option<NodeId>) -> Self {
        NodeData {
            name: name.into(),
            transform: Mat4::IDENTITY,
            parent,
            children: Vec::new(),
            meshes: Vec::new(),
            metadata: Metadata::new(),
        }
    }
}

/// Owns every node in a scene; indexed by [`NodeId`].
#[derive(Debug, Clone)]
pub struct NodeArena {
    nodes: Vec<NodeData>,
}

impl NodeArena {
    /// Creates an arena containing just a root node.
    pub fn new(root_name: impl Into<String>) -> Self {
        NodeArena {
            nodes: vec![NodeData::new(root_name, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn get(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeData)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i), n))
    }

    /// Adds a new child of `parent`, returning its id. `parent` must already
    /// exist in this arena.
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData::new(name, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Depth-first pre-order walk starting at `start`.
    pub fn walk(&self, start: NodeId) -> NodeWalk<'_> {
        NodeWalk {
            arena: self,
            stack: vec![start],
        }
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(NodeId)
    }
}

pub struct NodeWalk<'a> {
    arena: &'a NodeArena,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for NodeWalk<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let data = self.arena.get(id);
        // Push in reverse so children are visited in declaration order.
        for &child in data.children.iter().rev() {
            self.stack.push(child);
        }
        Some(id)
    }
}
