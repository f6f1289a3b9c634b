//! In-memory node graph produced and consumed by the LSF codec.
//!
//! The tree is arena-backed: a [`Resource`] owns a flat vector of nodes and
//! all parent/child relations are [`NodeId`] indices into it, so there are
//! no back-pointers and parent lookup stays O(1).

use indexmap::IndexMap;

use crate::formats::common::{AttributeValue, PackedVersion};

/// Index of a node inside its owning [`Resource`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which node/attribute record shape and side tables the file carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataFormat {
    /// Compact records, no sibling or key tables.
    None,
    /// Extended records with next-sibling indices and a node-key table.
    #[default]
    KeysAndAdjacency,
}

impl MetadataFormat {
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(MetadataFormat::None),
            1 => Some(MetadataFormat::KeysAndAdjacency),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_raw(self) -> u32 {
        match self {
            MetadataFormat::None => 0,
            MetadataFormat::KeysAndAdjacency => 1,
        }
    }

    /// True when next-sibling and key tables are present.
    #[must_use]
    pub fn has_adjacency(self) -> bool {
        self == MetadataFormat::KeysAndAdjacency
    }
}

/// A labeled tree vertex.
///
/// Attribute order and child-name group order both preserve insertion
/// order; siblings inside one name group keep their sequence.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub attributes: IndexMap<String, AttributeValue>,
    pub children: IndexMap<String, Vec<NodeId>>,
    /// Name of the attribute acting as the node's stable identity key
    /// (adjacency-format files only).
    pub key_attribute: Option<String>,
}

impl Node {
    fn new(name: String, parent: Option<NodeId>) -> Self {
        Self {
            name,
            parent,
            ..Self::default()
        }
    }
}

/// A decoded LSF document: engine version, format discriminant and the
/// region roots of the node arena.
#[derive(Debug, Clone, Default)]
pub struct Resource {
    pub version: PackedVersion,
    pub metadata_format: MetadataFormat,
    nodes: Vec<Node>,
    regions: IndexMap<String, NodeId>,
}

impl Resource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named top-level root and return its id.
    pub fn add_region(&mut self, name: impl Into<String>) -> NodeId {
        let name = name.into();
        let id = self.push(Node::new(name.clone(), None));
        self.regions.insert(name, id);
        id
    }

    /// Append a child under `parent`, preserving sibling order within the
    /// child's name group.
    pub fn append_child(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let name = name.into();
        let id = self.push(Node::new(name.clone(), Some(parent)));
        self.nodes[parent.index()]
            .children
            .entry(name)
            .or_default()
            .push(id);
        id
    }

    /// Set or replace an attribute on a node.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: AttributeValue,
    ) {
        self.nodes[id.index()].attributes.insert(name.into(), value);
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Region name → root node id, in insertion order.
    #[must_use]
    pub fn regions(&self) -> &IndexMap<String, NodeId> {
        &self.regions
    }

    #[must_use]
    pub fn region(&self, name: &str) -> Option<NodeId> {
        self.regions.get(name).copied()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Direct children of a node, flattened across name groups in
    /// insertion order.
    pub fn children_of(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.index()]
            .children
            .values()
            .flatten()
            .copied()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_links_and_sibling_order() {
        let mut res = Resource::new();
        let root = res.add_region("root");
        let a1 = res.append_child(root, "item");
        let b = res.append_child(root, "other");
        let a2 = res.append_child(root, "item");

        assert_eq!(res.node(a1).parent, Some(root));
        assert_eq!(res.node(root).children["item"], vec![a1, a2]);
        let order: Vec<NodeId> = res.children_of(root).collect();
        assert_eq!(order, vec![a1, a2, b]);
    }
}
