//! Typed graph model for one mined pattern or anomaly instance
//!
//! A `GraphModel` is built incrementally while a dump record is parsed and is
//! read-only afterwards. Nodes are keyed by id, so traversal order is the id
//! order and both output encoders are reproducible byte for byte.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Node identifier as written by the mining tool
pub type NodeId = u64;

/// Node category carried by the type tag of a dump node line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Field or variable access (tag `0`)
    Field,
    /// Method invocation (tag `1`)
    Method,
    /// Control structure such as IF or WHILE (tag `2`)
    Control,
    /// Anything else the miner emits (tag `3`)
    Other,
}

impl NodeKind {
    /// Parse the numeric type tag used in pattern dumps
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "0" => Some(NodeKind::Field),
            "1" => Some(NodeKind::Method),
            "2" => Some(NodeKind::Control),
            "3" => Some(NodeKind::Other),
            _ => None,
        }
    }

    /// Numeric type tag for this kind
    pub fn tag(self) -> u8 {
        match self {
            NodeKind::Field => 0,
            NodeKind::Method => 1,
            NodeKind::Control => 2,
            NodeKind::Other => 3,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Field => "field",
            NodeKind::Method => "method",
            NodeKind::Control => "control",
            NodeKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// One node of a mined subgraph
///
/// Identity is the `id` alone: equality and hashing ignore every other field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub class_name: String,
    pub object_name: String,
    pub member_name: String,
    pub start_line: u32,
    pub end_line: u32,
}

impl GraphNode {
    /// `<className>.<memberName>`, the entry this node contributes to a method bag
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.class_name, self.member_name)
    }
}

impl PartialEq for GraphNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GraphNode {}

impl Hash for GraphNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Directed graph of one pattern or anomaly, plus its provenance files
#[derive(Debug, Clone, PartialEq)]
pub struct GraphModel {
    pattern_id: String,
    frequency: u32,
    nodes: BTreeMap<NodeId, GraphNode>,
    edges: BTreeMap<NodeId, Vec<NodeId>>,
    files: Vec<String>,
}

impl GraphModel {
    pub fn new(pattern_id: impl Into<String>, frequency: u32) -> Self {
        Self {
            pattern_id: pattern_id.into(),
            frequency,
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            files: Vec::new(),
        }
    }

    pub fn pattern_id(&self) -> &str {
        &self.pattern_id
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Add a node; returns false (and keeps the first node) when the id is already present
    pub fn add_node(&mut self, node: GraphNode) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.nodes.insert(node.id, node);
        true
    }

    /// Add the edge `src -> dst`
    ///
    /// The miner sometimes references nodes outside the mined window, so an
    /// edge with an unknown endpoint is dropped and `false` is returned.
    pub fn add_edge(&mut self, src: NodeId, dst: NodeId) -> bool {
        if !self.has_node(src) || !self.has_node(dst) {
            return false;
        }
        self.edges.entry(src).or_default().push(dst);
        true
    }

    pub fn add_file(&mut self, file: impl Into<String>) {
        self.files.push(file.into());
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    /// Nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Destinations of `src` in insertion order
    pub fn successors(&self, src: NodeId) -> &[NodeId] {
        self.edges.get(&src).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All `(src, dst)` pairs, sources ascending, destinations in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.edges
            .iter()
            .flat_map(|(src, dsts)| dsts.iter().map(move |dst| (*src, *dst)))
    }

    /// Sum of all adjacency-list lengths
    pub fn total_edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Provenance files in dump order
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Sorted qualified names of all method nodes (duplicates kept)
    pub fn method_bag(&self) -> Vec<String> {
        let mut bag: Vec<String> = self
            .nodes()
            .filter(|n| n.kind == NodeKind::Method)
            .map(GraphNode::qualified_name)
            .collect();
        bag.sort();
        bag
    }
}
