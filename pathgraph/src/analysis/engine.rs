// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Traversal, path finding, cycle enumeration, and graph metrics
//!
//! Each operation takes one storage snapshot up front and works against it
//! for its whole duration, so concurrent writes are never observed mid-run.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use super::louvain;
use super::types::{Direction, GraphStats, PathResult, TraversalOptions, TraversalResult};
use crate::error::{GraphError, Result};
use crate::model::{Edge, Node, NodeId};
use crate::storage::{GraphStore, StoreSnapshot};

/// Read-only analysis engine over a graph store
pub struct GraphAnalyzer {
    store: GraphStore,
}

/// Edges reachable from `node_id` under `direction`
fn connected_edges(
    snap: &StoreSnapshot<'_>,
    graph_id: &str,
    node_id: &str,
    direction: Direction,
) -> Result<Vec<Edge>> {
    match direction {
        Direction::Forward => snap.outgoing_edges(graph_id, node_id),
        Direction::Backward => snap.incoming_edges(graph_id, node_id),
        Direction::Both => {
            let mut edges = snap.outgoing_edges(graph_id, node_id)?;
            edges.extend(snap.incoming_edges(graph_id, node_id)?);
            Ok(edges)
        }
    }
}

/// The node on the far side of `edge` when standing at `current`, or None
/// when the edge does not leave `current` under `direction`.
fn next_node_id<'e>(edge: &'e Edge, current: &str, direction: Direction) -> Option<&'e NodeId> {
    match direction {
        Direction::Forward => (edge.from_node_id == current).then_some(&edge.to_node_id),
        Direction::Backward => (edge.to_node_id == current).then_some(&edge.from_node_id),
        Direction::Both => {
            if edge.from_node_id == current {
                Some(&edge.to_node_id)
            } else if edge.to_node_id == current {
                Some(&edge.from_node_id)
            } else {
                None
            }
        }
    }
}

impl GraphAnalyzer {
    pub fn new(store: GraphStore) -> Self {
        Self { store }
    }

    /// Iterative depth-first search from `start_node_id`.
    ///
    /// Nodes failing the node-type filter are left out of the result but
    /// still expanded. Edges are pushed in reverse order so the traversal
    /// visits them left to right.
    pub fn depth_first_search(
        &self,
        graph_id: &str,
        start_node_id: &str,
        options: Option<&TraversalOptions>,
    ) -> Result<TraversalResult> {
        let defaults = TraversalOptions::default();
        let opts = options.unwrap_or(&defaults);
        let snap = self.store.snapshot()?;

        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut nodes: Vec<Node> = Vec::new();
        let mut edges: Vec<Edge> = Vec::new();
        let mut path: Vec<NodeId> = Vec::new();
        let mut stack: Vec<(NodeId, i64)> = vec![(start_node_id.to_string(), 0)];

        while let Some((node_id, depth)) = stack.pop() {
            if visited.contains(&node_id) {
                continue;
            }
            if opts.max_depth >= 0 && depth > opts.max_depth {
                continue;
            }
            visited.insert(node_id.clone());

            // A missing start node fails the whole call.
            let node = snap.get_node(graph_id, &node_id)?;

            let stopped = opts
                .stop_condition
                .as_ref()
                .map(|stop| stop(&node))
                .unwrap_or(false);

            if opts.node_type_matches(&node) {
                path.push(node_id.clone());
                nodes.push(node);
            }

            // A stop node is reported but expands no further.
            if stopped {
                continue;
            }

            let connected = opts.filter_edges(connected_edges(&snap, graph_id, &node_id, opts.direction)?);
            for edge in connected.into_iter().rev() {
                if let Some(next) = next_node_id(&edge, &node_id, opts.direction) {
                    if !visited.contains(next) {
                        let next = next.clone();
                        edges.push(edge);
                        stack.push((next, depth + 1));
                    }
                }
            }
        }

        let distance = path.len() as i64 - 1;
        Ok(TraversalResult {
            nodes,
            edges,
            path,
            distance,
        })
    }

    /// Enumerate every complete path from `start_node_id`, exploring all
    /// branches with backtracking. A branch that reaches a node already on
    /// the current path is emitted as a cycle closing on that node.
    pub fn all_paths(
        &self,
        graph_id: &str,
        start_node_id: &str,
        options: Option<&TraversalOptions>,
    ) -> Result<Vec<TraversalResult>> {
        let defaults = TraversalOptions::default();
        let opts = options.unwrap_or(&defaults);
        let snap = self.store.snapshot()?;

        let mut all_paths = Vec::new();
        let mut visited = HashSet::new();
        find_all_paths(
            &snap,
            graph_id,
            start_node_id,
            None,
            &mut visited,
            &[],
            &[],
            0,
            opts,
            &mut all_paths,
        )?;
        Ok(all_paths)
    }

    /// Transitive closure over outgoing edges, excluding the start node
    pub fn all_dependencies(
        &self,
        graph_id: &str,
        node_id: &str,
        options: Option<&TraversalOptions>,
    ) -> Result<Vec<Node>> {
        let result = self.depth_first_search(graph_id, node_id, options)?;
        Ok(result
            .nodes
            .into_iter()
            .filter(|node| node.id != node_id)
            .collect())
    }

    /// Transitive closure over incoming edges, excluding the start node
    pub fn all_dependents(
        &self,
        graph_id: &str,
        node_id: &str,
        options: Option<&TraversalOptions>,
    ) -> Result<Vec<Node>> {
        let mut opts = TraversalOptions::default();
        if let Some(options) = options {
            opts.max_depth = options.max_depth;
            opts.node_types = options.node_types.clone();
            opts.edge_types = options.edge_types.clone();
        }
        opts.direction = Direction::Backward;

        let result = self.depth_first_search(graph_id, node_id, Some(&opts))?;
        Ok(result
            .nodes
            .into_iter()
            .filter(|node| node.id != node_id)
            .collect())
    }

    /// Single-source single-target breadth-first shortest path
    pub fn shortest_path(
        &self,
        graph_id: &str,
        from_node_id: &str,
        to_node_id: &str,
        options: Option<&TraversalOptions>,
    ) -> Result<PathResult> {
        let defaults = TraversalOptions::default();
        let opts = options.unwrap_or(&defaults);
        let snap = self.store.snapshot()?;

        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
        let mut in_edge: HashMap<NodeId, String> = HashMap::new();

        let mut queue: VecDeque<NodeId> = VecDeque::new();
        queue.push_back(from_node_id.to_string());
        visited.insert(from_node_id.to_string());

        let mut found = false;
        while let Some(current) = queue.pop_front() {
            if current == to_node_id {
                found = true;
                break;
            }

            let connected = connected_edges(&snap, graph_id, &current, opts.direction)?;
            for edge in connected {
                if let Some(next) = next_node_id(&edge, &current, opts.direction) {
                    if !visited.contains(next) {
                        visited.insert(next.clone());
                        parent.insert(next.clone(), current.clone());
                        in_edge.insert(next.clone(), edge.id.clone());
                        queue.push_back(next.clone());
                    }
                }
            }
        }

        if !found {
            return Err(GraphError::NoPath {
                from: from_node_id.to_string(),
                to: to_node_id.to_string(),
            });
        }

        // Walk parents back to the source.
        let mut path: Vec<NodeId> = Vec::new();
        let mut edges: Vec<String> = Vec::new();
        let mut current = to_node_id.to_string();
        while current != from_node_id {
            path.insert(0, current.clone());
            if let Some(edge_id) = in_edge.get(&current) {
                edges.insert(0, edge_id.clone());
            }
            current = parent[&current].clone();
        }
        path.insert(0, from_node_id.to_string());

        Ok(PathResult {
            from_node_id: from_node_id.to_string(),
            to_node_id: to_node_id.to_string(),
            length: path.len() - 1,
            path,
            edges,
        })
    }

    /// Every forward path of minimal length between two nodes.
    ///
    /// Lockstep BFS: once the target is first reached at distance d, any
    /// queued item still at distance d that reaches the target is accepted,
    /// and the first dequeued item past d ends the search.
    pub fn all_shortest_paths(
        &self,
        graph_id: &str,
        from_node_id: &str,
        to_node_id: &str,
    ) -> Result<Vec<PathResult>> {
        let snap = self.store.snapshot()?;

        struct QueueItem {
            node_id: NodeId,
            path: Vec<NodeId>,
            edges: Vec<Edge>,
            dist: usize,
        }

        let mut queue: VecDeque<QueueItem> = VecDeque::new();
        queue.push_back(QueueItem {
            node_id: from_node_id.to_string(),
            path: vec![from_node_id.to_string()],
            edges: Vec::new(),
            dist: 0,
        });

        let mut best_dist: HashMap<NodeId, usize> = HashMap::new();
        let mut all_paths: Vec<PathResult> = Vec::new();
        let mut min_distance: Option<usize> = None;

        while let Some(current) = queue.pop_front() {
            if let Some(min) = min_distance {
                if current.dist > min {
                    break;
                }
            }

            if current.node_id == to_node_id {
                let min = *min_distance.get_or_insert(current.dist);
                if current.dist == min {
                    all_paths.push(PathResult {
                        from_node_id: from_node_id.to_string(),
                        to_node_id: to_node_id.to_string(),
                        path: current.path.clone(),
                        length: current.dist,
                        edges: current.edges.iter().map(|e| e.id.clone()).collect(),
                    });
                }
                continue;
            }

            if let Some(&seen) = best_dist.get(&current.node_id) {
                if seen < current.dist {
                    continue;
                }
            }
            best_dist.insert(current.node_id.clone(), current.dist);

            for edge in snap.outgoing_edges(graph_id, &current.node_id)? {
                let next = edge.to_node_id.clone();
                if current.path.contains(&next) {
                    continue;
                }
                let mut path = current.path.clone();
                path.push(next.clone());
                let mut edges = current.edges.clone();
                edges.push(edge);
                queue.push_back(QueueItem {
                    node_id: next,
                    path,
                    edges,
                    dist: current.dist + 1,
                });
            }
        }

        Ok(all_paths)
    }

    /// Enumerate all elementary cycles, deduplicated by rotating each cycle
    /// to start at its lexicographically smallest node.
    pub fn find_all_cycles(
        &self,
        graph_id: &str,
        options: Option<&TraversalOptions>,
    ) -> Result<Vec<Vec<NodeId>>> {
        let defaults = TraversalOptions::default();
        let opts = options.unwrap_or(&defaults);
        let snap = self.store.snapshot()?;

        let all_nodes = snap.list_nodes(graph_id)?;
        let mut all_cycles: Vec<Vec<NodeId>> = Vec::new();
        for node in &all_nodes {
            let mut path = vec![node.id.clone()];
            let mut blocked = HashSet::new();
            find_cycles(
                &snap,
                graph_id,
                &node.id,
                &node.id,
                &mut path,
                &mut blocked,
                &mut all_cycles,
                opts,
            )?;
        }

        let mut unique: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
        for cycle in all_cycles {
            let normalized = normalize_cycle(cycle);
            unique.insert(normalized.join("->"), normalized);
        }
        Ok(unique.into_values().collect())
    }

    /// True when the graph (restricted to the edge-type filter) contains a
    /// directed cycle
    pub fn has_cycles(&self, graph_id: &str, options: Option<&TraversalOptions>) -> Result<bool> {
        Ok(!self.find_all_cycles(graph_id, options)?.is_empty())
    }

    /// Nodes with no incoming edges.
    ///
    /// Only the edge-type filter applies; a node-type filter is accepted
    /// and deliberately ignored.
    pub fn root_nodes(
        &self,
        graph_id: &str,
        options: Option<&TraversalOptions>,
    ) -> Result<Vec<Node>> {
        let snap = self.store.snapshot()?;
        let mut roots = Vec::new();
        for node in snap.list_nodes(graph_id)? {
            let incoming = snap.incoming_edges(graph_id, &node.id)?;
            let incoming = match options {
                Some(opts) => opts.filter_edges(incoming),
                None => incoming,
            };
            if incoming.is_empty() {
                roots.push(node);
            }
        }
        Ok(roots)
    }

    /// Nodes with no outgoing edges. Same filter behavior as `root_nodes`.
    pub fn leaf_nodes(
        &self,
        graph_id: &str,
        options: Option<&TraversalOptions>,
    ) -> Result<Vec<Node>> {
        let snap = self.store.snapshot()?;
        let mut leaves = Vec::new();
        for node in snap.list_nodes(graph_id)? {
            let outgoing = snap.outgoing_edges(graph_id, &node.id)?;
            let outgoing = match options {
                Some(opts) => opts.filter_edges(outgoing),
                None => outgoing,
            };
            if outgoing.is_empty() {
                leaves.push(node);
            }
        }
        Ok(leaves)
    }

    /// Nodes with neither incoming nor outgoing edges. No filters apply.
    pub fn orphan_nodes(
        &self,
        graph_id: &str,
        _options: Option<&TraversalOptions>,
    ) -> Result<Vec<Node>> {
        let snap = self.store.snapshot()?;
        let mut orphans = Vec::new();
        for node in snap.list_nodes(graph_id)? {
            let incoming = snap.incoming_edges(graph_id, &node.id)?;
            let outgoing = snap.outgoing_edges(graph_id, &node.id)?;
            if incoming.is_empty() && outgoing.is_empty() {
                orphans.push(node);
            }
        }
        Ok(orphans)
    }

    /// Longest simple path from any root, in edges
    pub fn max_depth(&self, graph_id: &str, options: Option<&TraversalOptions>) -> Result<usize> {
        let roots = self.root_nodes(graph_id, options)?;
        let snap = self.store.snapshot()?;

        let mut max_depth = 0;
        for root in roots {
            let mut visited = HashSet::new();
            let depth = node_depth(&snap, graph_id, &root.id, &mut visited, 0)?;
            if depth > max_depth {
                max_depth = depth;
            }
        }
        Ok(max_depth)
    }

    /// Number of weakly connected components (undirected flood fill)
    pub fn connected_component_count(
        &self,
        graph_id: &str,
        _options: Option<&TraversalOptions>,
    ) -> Result<usize> {
        let snap = self.store.snapshot()?;
        let all_nodes = snap.list_nodes(graph_id)?;

        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut components = 0;
        for node in &all_nodes {
            if !visited.contains(&node.id) {
                components += 1;
                mark_component(&snap, graph_id, &node.id, &mut visited)?;
            }
        }
        Ok(components)
    }

    /// Aggregate statistics for one graph
    pub fn graph_stats(
        &self,
        graph_id: &str,
        options: Option<&TraversalOptions>,
    ) -> Result<GraphStats> {
        let snap = self.store.snapshot()?;
        let all_nodes = snap.list_nodes(graph_id)?;
        let all_edges = snap.list_edges(graph_id)?;

        let mut stats = GraphStats {
            node_count: all_nodes.len(),
            edge_count: all_edges.len(),
            ..GraphStats::default()
        };
        for node in &all_nodes {
            *stats.node_type_count.entry(node.node_type.clone()).or_insert(0) += 1;
        }
        for edge in &all_edges {
            *stats.edge_type_count.entry(edge.edge_type.clone()).or_insert(0) += 1;
        }
        drop(snap);

        stats.root_node_count = self.root_nodes(graph_id, options)?.len();
        stats.leaf_node_count = self.leaf_nodes(graph_id, options)?.len();
        stats.orphan_node_count = self.orphan_nodes(graph_id, options)?.len();
        stats.has_cycles = self.has_cycles(graph_id, options)?;
        stats.max_depth = self.max_depth(graph_id, options)?;
        stats.connected_components = self.connected_component_count(graph_id, options)?;

        Ok(stats)
    }

    /// Degree centrality for one node or every node.
    ///
    /// The edge-type filter does not apply here.
    pub fn degree_centrality(
        &self,
        graph_id: &str,
        node_id: Option<&str>,
        direction: Direction,
    ) -> Result<BTreeMap<NodeId, usize>> {
        let snap = self.store.snapshot()?;
        let nodes = match node_id {
            Some(id) => vec![snap.get_node(graph_id, id)?],
            None => snap.list_nodes(graph_id)?,
        };

        let mut scores = BTreeMap::new();
        for node in nodes {
            let mut degree = 0;
            if matches!(direction, Direction::Forward | Direction::Both) {
                degree += snap.outgoing_edges(graph_id, &node.id)?.len();
            }
            if matches!(direction, Direction::Backward | Direction::Both) {
                degree += snap.incoming_edges(graph_id, &node.id)?.len();
            }
            scores.insert(node.id, degree);
        }
        Ok(scores)
    }

    /// Louvain community detection over the undirected simple rendering of
    /// the graph. The partition the algorithm settles on is returned as-is.
    pub fn louvain_communities(
        &self,
        graph_id: &str,
        resolution: f64,
    ) -> Result<Vec<Vec<NodeId>>> {
        let snap = self.store.snapshot()?;
        louvain::communities(&snap, graph_id, resolution)
    }
}

#[allow(clippy::too_many_arguments)]
fn find_all_paths(
    snap: &StoreSnapshot<'_>,
    graph_id: &str,
    node_id: &str,
    previous_edge_id: Option<&str>,
    visited: &mut HashSet<NodeId>,
    current_path: &[NodeId],
    current_edges: &[Edge],
    depth: i64,
    opts: &TraversalOptions,
    all_paths: &mut Vec<TraversalResult>,
) -> Result<()> {
    if opts.max_depth >= 0 && depth > opts.max_depth {
        return Ok(());
    }
    if visited.contains(node_id) {
        return Ok(());
    }

    let node = snap.get_node(graph_id, node_id)?;

    if let Some(stop) = &opts.stop_condition {
        if stop(&node) {
            return Ok(());
        }
    }

    let mut path = current_path.to_vec();
    if opts.node_type_matches(&node) {
        path.push(node_id.to_string());
    }

    visited.insert(node_id.to_string());
    let result = explore_paths(
        snap,
        graph_id,
        node_id,
        previous_edge_id,
        visited,
        &path,
        current_edges,
        depth,
        opts,
        all_paths,
    );
    // Unmark when backtracking so sibling branches may revisit.
    visited.remove(node_id);
    result
}

#[allow(clippy::too_many_arguments)]
fn explore_paths(
    snap: &StoreSnapshot<'_>,
    graph_id: &str,
    node_id: &str,
    previous_edge_id: Option<&str>,
    visited: &mut HashSet<NodeId>,
    path: &[NodeId],
    current_edges: &[Edge],
    depth: i64,
    opts: &TraversalOptions,
    all_paths: &mut Vec<TraversalResult>,
) -> Result<()> {
    let mut connected =
        opts.filter_edges(connected_edges(snap, graph_id, node_id, opts.direction)?);

    // In Both mode, exclude the edge just traversed so a step back along
    // the same edge does not count as a continuation.
    if opts.direction == Direction::Both {
        if let Some(prev) = previous_edge_id {
            connected.retain(|edge| edge.id != prev);
        }
    }

    // No way forward: the current path is complete.
    if connected.is_empty() {
        if !path.is_empty() {
            let mut nodes = Vec::with_capacity(path.len());
            for path_node_id in path {
                nodes.push(snap.get_node(graph_id, path_node_id)?);
            }
            all_paths.push(TraversalResult {
                nodes,
                edges: current_edges.to_vec(),
                path: path.to_vec(),
                distance: path.len() as i64 - 1,
            });
        }
        return Ok(());
    }

    for edge in connected {
        let Some(next) = next_node_id(&edge, node_id, opts.direction) else {
            continue;
        };
        let next = next.clone();

        let mut new_edges = current_edges.to_vec();
        new_edges.push(edge.clone());

        if visited.contains(&next) {
            // The neighbour sits on the current path: emit the cycle from
            // its first occurrence, re-closing on it.
            if let Some(cycle_start) = path.iter().position(|id| *id == next) {
                let mut cycle_path: Vec<NodeId> = path[cycle_start..].to_vec();
                let cycle_edges: Vec<Edge> = new_edges[cycle_start..].to_vec();

                let mut cycle_nodes = Vec::with_capacity(cycle_path.len() + 1);
                for path_node_id in &cycle_path {
                    cycle_nodes.push(snap.get_node(graph_id, path_node_id)?);
                }
                cycle_nodes.push(cycle_nodes[0].clone());
                cycle_path.push(cycle_path[0].clone());

                all_paths.push(TraversalResult {
                    nodes: cycle_nodes,
                    edges: cycle_edges,
                    distance: cycle_path.len() as i64 - 1,
                    path: cycle_path,
                });
            }
        } else {
            find_all_paths(
                snap,
                graph_id,
                &next,
                Some(edge.id.as_str()),
                visited,
                path,
                &new_edges,
                depth + 1,
                opts,
                all_paths,
            )?;
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn find_cycles(
    snap: &StoreSnapshot<'_>,
    graph_id: &str,
    start_node_id: &str,
    current_node_id: &str,
    path: &mut Vec<NodeId>,
    blocked: &mut HashSet<NodeId>,
    cycles: &mut Vec<Vec<NodeId>>,
    opts: &TraversalOptions,
) -> Result<()> {
    blocked.insert(current_node_id.to_string());

    let result = (|| -> Result<()> {
        let edges = opts.filter_edges(snap.outgoing_edges(graph_id, current_node_id)?);
        for edge in edges {
            let neighbour = &edge.to_node_id;
            if neighbour == start_node_id {
                let mut cycle = path.clone();
                cycle.push(start_node_id.to_string());
                cycles.push(cycle);
            } else if !blocked.contains(neighbour) {
                path.push(neighbour.clone());
                find_cycles(
                    snap,
                    graph_id,
                    start_node_id,
                    neighbour,
                    path,
                    blocked,
                    cycles,
                    opts,
                )?;
                path.pop();
            }
        }
        Ok(())
    })();

    // Unblock on backtrack.
    blocked.remove(current_node_id);
    result
}

/// Rotate a cycle so its lexicographically smallest node comes first,
/// keeping the closing repetition of that node at the end.
fn normalize_cycle(path: Vec<NodeId>) -> Vec<NodeId> {
    if path.len() <= 1 {
        return path;
    }
    let nodes = &path[..path.len() - 1];
    let mut min_index = 0;
    for i in 1..nodes.len() {
        if nodes[i] < nodes[min_index] {
            min_index = i;
        }
    }
    let mut rotated: Vec<NodeId> = nodes[min_index..]
        .iter()
        .chain(nodes[..min_index].iter())
        .cloned()
        .collect();
    rotated.push(rotated[0].clone());
    rotated
}

/// Depth of the longest simple path below `node_id`. The visited set is
/// unmarked on backtrack so rejoining branches measure their own depth.
fn node_depth(
    snap: &StoreSnapshot<'_>,
    graph_id: &str,
    node_id: &str,
    visited: &mut HashSet<NodeId>,
    current_depth: usize,
) -> Result<usize> {
    if visited.contains(node_id) {
        return Ok(current_depth);
    }
    visited.insert(node_id.to_string());

    let mut max_child_depth = current_depth;
    for edge in snap.outgoing_edges(graph_id, node_id)? {
        let child_depth = node_depth(snap, graph_id, &edge.to_node_id, visited, current_depth + 1)?;
        if child_depth > max_child_depth {
            max_child_depth = child_depth;
        }
    }

    visited.remove(node_id);
    Ok(max_child_depth)
}

/// Flood-fill one weakly connected component
fn mark_component(
    snap: &StoreSnapshot<'_>,
    graph_id: &str,
    node_id: &str,
    visited: &mut HashSet<NodeId>,
) -> Result<()> {
    if visited.contains(node_id) {
        return Ok(());
    }
    visited.insert(node_id.to_string());

    let mut edges = snap.outgoing_edges(graph_id, node_id)?;
    edges.extend(snap.incoming_edges(graph_id, node_id)?);

    for edge in edges {
        if edge.from_node_id == node_id && !visited.contains(&edge.to_node_id) {
            mark_component(snap, graph_id, &edge.to_node_id, visited)?;
        }
        if edge.to_node_id == node_id && !visited.contains(&edge.from_node_id) {
            mark_component(snap, graph_id, &edge.from_node_id, visited)?;
        }
    }
    Ok(())
}
