// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Traversal options and result types

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Edge, EdgeId, EdgeType, Node, NodeId, NodeType};

/// Direction of traversal relative to stored edge direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Direction {
    /// Follow outgoing edges
    #[default]
    Forward,
    /// Follow incoming edges
    Backward,
    /// Follow edges either way
    Both,
}

/// Options accepted by the traversal and classification operations
pub struct TraversalOptions {
    /// Maximum traversal depth; -1 means unbounded
    pub max_depth: i64,
    pub direction: Direction,
    /// Node types included in results; empty allows all. Non-matching
    /// nodes are still expanded.
    pub node_types: Vec<NodeType>,
    /// Edge types followed; empty allows all
    pub edge_types: Vec<EdgeType>,
    /// When this returns true for a node, traversal does not expand past it
    pub stop_condition: Option<Box<dyn Fn(&Node) -> bool + Send + Sync>>,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            max_depth: -1,
            direction: Direction::Forward,
            node_types: Vec::new(),
            edge_types: Vec::new(),
            stop_condition: None,
        }
    }
}

impl TraversalOptions {
    pub fn node_type_matches(&self, node: &Node) -> bool {
        self.node_types.is_empty() || self.node_types.contains(&node.node_type)
    }

    pub fn edge_type_matches(&self, edge: &Edge) -> bool {
        self.edge_types.is_empty() || self.edge_types.contains(&edge.edge_type)
    }

    /// Drop edges whose type the filter excludes
    pub fn filter_edges(&self, edges: Vec<Edge>) -> Vec<Edge> {
        if self.edge_types.is_empty() {
            return edges;
        }
        edges
            .into_iter()
            .filter(|e| self.edge_type_matches(e))
            .collect()
    }
}

/// Result of a traversal: visited nodes (after the node-type filter), the
/// edges in visit order, the path of node IDs, and distance = |path| - 1.
#[derive(Debug, Clone, Serialize)]
pub struct TraversalResult {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub path: Vec<NodeId>,
    pub distance: i64,
}

/// A path between two nodes; length is the number of edges
#[derive(Debug, Clone, Serialize)]
pub struct PathResult {
    pub from_node_id: NodeId,
    pub to_node_id: NodeId,
    pub path: Vec<NodeId>,
    pub length: usize,
    pub edges: Vec<EdgeId>,
}

/// Aggregate statistics for one graph
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub node_type_count: BTreeMap<NodeType, usize>,
    pub edge_type_count: BTreeMap<EdgeType, usize>,
    pub max_depth: usize,
    pub root_node_count: usize,
    pub leaf_node_count: usize,
    pub orphan_node_count: usize,
    pub has_cycles: bool,
    pub connected_components: usize,
}
