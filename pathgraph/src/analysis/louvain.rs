// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Louvain community detection
//!
//! The stored directed multigraph is rendered as an undirected simple
//! graph (parallel edges deduplicated, self-loops dropped), then a
//! standard two-phase Louvain modularity maximization runs over it: local
//! moving until no node improves modularity, aggregation of communities
//! into supernodes, repeated until the partition stops shrinking. The
//! sweep order is deterministic, so the same graph always yields the same
//! partition.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::error::Result;
use crate::model::NodeId;
use crate::storage::StoreSnapshot;

/// Partition a graph into communities of node IDs
pub(crate) fn communities(
    snap: &StoreSnapshot<'_>,
    graph_id: &str,
    resolution: f64,
) -> Result<Vec<Vec<NodeId>>> {
    let graph = to_undirected_simple(snap, graph_id)?;
    if graph.node_count() == 0 {
        return Ok(Vec::new());
    }

    // Weighted adjacency lists indexed by petgraph node index.
    let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); graph.node_count()];
    for edge in graph.edge_references() {
        let (a, b) = (edge.source().index(), edge.target().index());
        let weight = *edge.weight();
        adjacency[a].push((b, weight));
        adjacency[b].push((a, weight));
    }

    let membership = partition(adjacency, resolution);

    let ids: Vec<NodeId> = graph.node_weights().cloned().collect();
    Ok(membership
        .into_iter()
        .map(|members| members.into_iter().map(|i| ids[i].clone()).collect())
        .collect())
}

/// Render the stored graph as an undirected simple graph with unit edge
/// weights. Parallel edges collapse; self-loops are dropped.
fn to_undirected_simple(
    snap: &StoreSnapshot<'_>,
    graph_id: &str,
) -> Result<UnGraph<NodeId, f64>> {
    let nodes = snap.list_nodes(graph_id)?;
    let edges = snap.list_edges(graph_id)?;

    let mut graph: UnGraph<NodeId, f64> = UnGraph::new_undirected();
    let mut index: HashMap<NodeId, NodeIndex> = HashMap::new();
    for node in &nodes {
        let idx = graph.add_node(node.id.clone());
        index.insert(node.id.clone(), idx);
    }
    for edge in &edges {
        let (Some(&a), Some(&b)) = (
            index.get(&edge.from_node_id),
            index.get(&edge.to_node_id),
        ) else {
            continue;
        };
        if a == b {
            continue;
        }
        graph.update_edge(a, b, 1.0);
    }
    Ok(graph)
}

/// Multi-level Louvain: local moving, then aggregation, until the number
/// of communities stops shrinking. Returns, per community, the member
/// indices of the original graph.
fn partition(mut adjacency: Vec<Vec<(usize, f64)>>, resolution: f64) -> Vec<Vec<usize>> {
    let mut members: Vec<Vec<usize>> = (0..adjacency.len()).map(|i| vec![i]).collect();

    loop {
        let assignment = local_moving(&adjacency, resolution);
        let (assignment, community_count) = renumber(assignment);
        if community_count == adjacency.len() {
            break;
        }

        let mut merged: Vec<Vec<usize>> = vec![Vec::new(); community_count];
        for (node, &community) in assignment.iter().enumerate() {
            merged[community].extend(members[node].iter().copied());
        }
        members = merged;

        adjacency = aggregate(&adjacency, &assignment, community_count);
    }

    members
}

/// Phase one: sweep nodes in index order, moving each to the neighbouring
/// community with the highest modularity gain, until a full sweep moves
/// nothing.
fn local_moving(adjacency: &[Vec<(usize, f64)>], resolution: f64) -> Vec<usize> {
    let n = adjacency.len();
    let mut community: Vec<usize> = (0..n).collect();

    // Self-loop weight counts twice towards a node's degree.
    let degree: Vec<f64> = adjacency
        .iter()
        .enumerate()
        .map(|(v, neighbours)| {
            neighbours
                .iter()
                .map(|&(u, w)| if u == v { 2.0 * w } else { w })
                .sum()
        })
        .collect();
    let two_m: f64 = degree.iter().sum();
    if two_m == 0.0 {
        return community;
    }

    let mut community_total: Vec<f64> = degree.clone();

    loop {
        let mut moved = false;
        for v in 0..n {
            let current = community[v];

            // Edge weight from v to each neighbouring community.
            let mut links: HashMap<usize, f64> = HashMap::new();
            for &(u, w) in &adjacency[v] {
                if u == v {
                    continue;
                }
                *links.entry(community[u]).or_insert(0.0) += w;
            }

            community_total[current] -= degree[v];

            let gain = |c: usize, weight: f64| {
                weight - resolution * community_total[c] * degree[v] / two_m
            };

            let mut best = current;
            let mut best_gain = gain(current, links.get(&current).copied().unwrap_or(0.0));

            let mut candidates: Vec<(usize, f64)> =
                links.iter().map(|(&c, &w)| (c, w)).collect();
            candidates.sort_by_key(|&(c, _)| c);
            for (c, weight) in candidates {
                if c == current {
                    continue;
                }
                let g = gain(c, weight);
                if g > best_gain + 1e-12 {
                    best_gain = g;
                    best = c;
                }
            }

            community_total[best] += degree[v];
            if best != current {
                community[v] = best;
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }

    community
}

/// Compact community labels to 0..k in order of first appearance
fn renumber(assignment: Vec<usize>) -> (Vec<usize>, usize) {
    let mut relabel: HashMap<usize, usize> = HashMap::new();
    let mut next = 0;
    let compacted = assignment
        .into_iter()
        .map(|c| {
            *relabel.entry(c).or_insert_with(|| {
                let label = next;
                next += 1;
                label
            })
        })
        .collect();
    (compacted, next)
}

/// Phase two: collapse each community into one supernode; internal edges
/// become self-loops carrying the summed internal weight.
fn aggregate(
    adjacency: &[Vec<(usize, f64)>],
    assignment: &[usize],
    community_count: usize,
) -> Vec<Vec<(usize, f64)>> {
    let mut weights: HashMap<(usize, usize), f64> = HashMap::new();
    for (v, neighbours) in adjacency.iter().enumerate() {
        for &(u, w) in neighbours {
            // Each undirected edge appears in both endpoint lists; keep one.
            if u < v {
                continue;
            }
            let (cv, cu) = (assignment[v], assignment[u]);
            let key = if cv <= cu { (cv, cu) } else { (cu, cv) };
            *weights.entry(key).or_insert(0.0) += w;
        }
    }

    let mut new_adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); community_count];
    for ((a, b), w) in weights {
        new_adjacency[a].push((b, w));
        if a != b {
            new_adjacency[b].push((a, w));
        }
    }
    for neighbours in &mut new_adjacency {
        neighbours.sort_by_key(|&(c, _)| c);
    }
    new_adjacency
}
