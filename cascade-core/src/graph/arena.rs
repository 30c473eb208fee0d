//! Node Arena
//!
//! The arena owns every node of one reactive graph, indexed by [`NodeId`].
//! Edges are stored on both ends: a parent lists its `children`, a child
//! lists its `sources`. Keeping the reverse edge lets a computation detach
//! itself from all of its parents before it re-derives, so each run starts
//! with an empty dependency set and rebuilds it from the reads it performs.

use std::collections::HashMap;

use indexmap::IndexSet;

use super::node::{Node, NodeId};

/// All nodes in a graph, plus the edges between them.
#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    nodes: HashMap<NodeId, Node>,
}

impl NodeArena {
    /// Create a new empty arena.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Add a node to the graph.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node from the graph.
    ///
    /// Also removes all edges involving this node. The removed node is
    /// handed back so the caller can drop it (and whatever its derivation
    /// captured) after releasing its borrow of the arena.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&node_id)?;

        for source_id in node.sources() {
            if let Some(source) = self.nodes.get_mut(source_id) {
                source.remove_child(node_id);
            }
        }

        for child_id in node.children() {
            if let Some(child) = self.nodes.get_mut(child_id) {
                child.remove_source(node_id);
            }
        }

        Some(node)
    }

    /// Get a reference to a node.
    pub fn get(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable reference to a node.
    pub fn get_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Record that `child` read `parent`.
    ///
    /// Returns `true` if the edge is new.
    pub fn add_edge(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.nodes.contains_key(&child) {
            return false;
        }
        let added = match self.nodes.get_mut(&parent) {
            Some(parent_node) => parent_node.add_child(child),
            None => return false,
        };
        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.add_source(parent);
        }
        added
    }

    /// Remove `child` from every parent it read, returning those parents.
    pub fn detach_sources(&mut self, child: NodeId) -> IndexSet<NodeId> {
        let sources = match self.nodes.get_mut(&child) {
            Some(node) => node.take_sources(),
            None => return IndexSet::new(),
        };
        for source_id in &sources {
            if let Some(source) = self.nodes.get_mut(source_id) {
                source.remove_child(child);
            }
        }
        sources
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
