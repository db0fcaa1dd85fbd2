// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! `ANALYSIS.*` commands
//!
//! Paths render in arrow notation: `node:type->edge:type->node:type…`,
//! with `<-` whenever an edge was traversed opposite its stored direction.
//! Multi-path replies are prefixed with a result count.

use std::collections::BTreeSet;

use super::edge::parse_format;
use crate::analysis::{Direction, GraphAnalyzer, PathResult, TraversalOptions, TraversalResult};
use crate::error::{GraphError, Result};
use crate::model::{Edge, NodeId};
use crate::redis::protocol::Reply;
use crate::storage::GraphStore;

pub struct AnalysisCommands {
    store: GraphStore,
    analyzer: GraphAnalyzer,
}

impl AnalysisCommands {
    pub fn new(store: GraphStore) -> Self {
        Self {
            analyzer: GraphAnalyzer::new(store.clone()),
            store,
        }
    }

    pub fn handle(&self, verb: &str, args: &[String]) -> Result<Reply> {
        match verb {
            "SHORTESTPATH" => self.shortest_path(args),
            "CENTRALITY" => self.centrality(args),
            "CLUSTERING" => self.clustering(args),
            "CYCLES" => self.cycles(args),
            "TRAVERSE" => self.traverse(args),
            _ => Err(GraphError::BadArgument(format!(
                "unknown ANALYSIS command: {verb}"
            ))),
        }
    }

    /// `ANALYSIS.SHORTESTPATH <graph> <from> <to> [FORMAT simple|detailed]`
    fn shortest_path(&self, args: &[String]) -> Result<Reply> {
        if args.len() < 3 {
            return Err(GraphError::BadArgument(
                "ANALYSIS.SHORTESTPATH requires at least 3 arguments: graph, from, to".to_string(),
            ));
        }
        let graph_id = &args[0];
        let mut format = "detailed";
        let mut i = 3;
        while i < args.len() {
            if args[i] == "FORMAT" && i + 1 < args.len() {
                i += 1;
                format = parse_format(&args[i])?;
            }
            i += 1;
        }

        let path = self.analyzer.shortest_path(graph_id, &args[1], &args[2], None)?;

        if format == "simple" {
            return self.simple_path_reply(graph_id, &path);
        }

        let all_paths = self.analyzer.all_shortest_paths(graph_id, &args[1], &args[2])?;
        if all_paths.is_empty() {
            return Ok(Reply::Null);
        }
        self.multi_path_reply(graph_id, &all_paths)
    }

    /// `ANALYSIS.CENTRALITY <graph> <type> [node_id] [DIRECTION in|out|both]`
    fn centrality(&self, args: &[String]) -> Result<Reply> {
        if args.len() < 2 {
            return Err(GraphError::BadArgument(
                "ANALYSIS.CENTRALITY requires at least 2 arguments: graph, type".to_string(),
            ));
        }
        let graph_id = &args[0];
        let centrality_type = args[1].to_lowercase();

        let mut node_id: Option<&str> = None;
        let mut direction = Direction::Both;

        let mut i = 2;
        while i < args.len() {
            if args[i].to_uppercase() == "DIRECTION" {
                let value = args.get(i + 1).ok_or_else(|| {
                    GraphError::BadArgument("DIRECTION option requires an argument".to_string())
                })?;
                direction = parse_direction(&value.to_lowercase())?;
                i += 2;
            } else {
                if node_id.is_some() {
                    return Err(GraphError::BadArgument(format!(
                        "unexpected argument: {}. node_id already provided",
                        args[i]
                    )));
                }
                node_id = Some(args[i].as_str());
                i += 1;
            }
        }

        match centrality_type.as_str() {
            "degree" => {
                let scores = self.analyzer.degree_centrality(graph_id, node_id, direction)?;
                let mut result = Vec::with_capacity(scores.len() * 2);
                for (id, score) in scores {
                    result.push(id);
                    result.push(score.to_string());
                }
                Ok(Reply::Array(result))
            }
            "betweenness" | "closeness" => Ok(Reply::Array(vec![
                "centrality".to_string(),
                centrality_type,
                "not_implemented".to_string(),
            ])),
            other => Err(GraphError::BadArgument(format!(
                "unknown centrality type: {other}"
            ))),
        }
    }

    /// `ANALYSIS.CLUSTERING <graph> [algorithm] [parameters_json]`
    fn clustering(&self, args: &[String]) -> Result<Reply> {
        if args.is_empty() {
            return Err(GraphError::BadArgument(
                "ANALYSIS.CLUSTERING requires at least 1 argument: graph".to_string(),
            ));
        }
        let graph_id = &args[0];
        let algorithm = args.get(1).map(String::as_str).unwrap_or("louvain");

        let mut resolution = 1.0;
        if let Some(params) = args.get(2) {
            let params: serde_json::Value = serde_json::from_str(params)
                .map_err(|e| GraphError::BadArgument(format!("invalid parameters JSON: {e}")))?;
            if let Some(value) = params.get("resolution") {
                resolution = value.as_f64().ok_or_else(|| {
                    GraphError::BadArgument("resolution parameter must be a float".to_string())
                })?;
            }
        }

        match algorithm {
            "louvain" => {
                let communities = self.analyzer.louvain_communities(graph_id, resolution)?;
                Ok(Reply::Nested(communities))
            }
            "connected_components" => {
                let count = self.analyzer.connected_component_count(graph_id, None)?;
                Ok(Reply::Array(vec![
                    "connected_components".to_string(),
                    count.to_string(),
                ]))
            }
            other => Err(GraphError::BadArgument(format!(
                "unknown clustering algorithm: {other}"
            ))),
        }
    }

    /// `ANALYSIS.CYCLES <graph> [NODETYPE|NODETYPES t…] [EDGETYPE|EDGETYPES t…] [FORMAT simple|detailed]`
    fn cycles(&self, args: &[String]) -> Result<Reply> {
        if args.is_empty() {
            return Err(GraphError::BadArgument(
                "ANALYSIS.CYCLES requires at least 1 argument: graph".to_string(),
            ));
        }
        let graph_id = &args[0];
        let mut format = "detailed";
        let mut options = TraversalOptions::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "NODETYPE" | "NODETYPES" => {
                    i += 1;
                    while i < args.len() && !is_cycles_keyword(&args[i]) {
                        options.node_types.push(args[i].clone());
                        i += 1;
                    }
                }
                "EDGETYPE" | "EDGETYPES" => {
                    i += 1;
                    while i < args.len() && !is_cycles_keyword(&args[i]) {
                        options.edge_types.push(args[i].clone());
                        i += 1;
                    }
                }
                "FORMAT" => {
                    let value = args.get(i + 1).ok_or_else(|| {
                        GraphError::BadArgument("FORMAT option requires an argument".to_string())
                    })?;
                    format = parse_format(value)?;
                    i += 2;
                }
                other => {
                    return Err(GraphError::BadArgument(format!(
                        "unknown option for ANALYSIS.CYCLES: {other}"
                    )))
                }
            }
        }

        let cycles = self.analyzer.find_all_cycles(graph_id, Some(&options))?;
        if cycles.is_empty() {
            return Ok(Reply::Null);
        }

        if format == "simple" {
            // The unique set of nodes participating in any cycle, sorted.
            let mut unique: BTreeSet<NodeId> = BTreeSet::new();
            for cycle in &cycles {
                for node_id in &cycle[..cycle.len() - 1] {
                    unique.insert(node_id.clone());
                }
            }
            let mut result = Vec::with_capacity(unique.len());
            for node_id in unique {
                let node = self.store.get_node(graph_id, &node_id)?;
                result.push(format!("{}:{}", node.id, node.node_type));
            }
            return Ok(Reply::Array(result));
        }

        self.detailed_cycle_reply(graph_id, &cycles)
    }

    /// `ANALYSIS.TRAVERSE <graph> <start> [DIRECTION d] [NODETYPES t…] [EDGETYPES t…] [FORMAT f]`
    fn traverse(&self, args: &[String]) -> Result<Reply> {
        if args.len() < 2 {
            return Err(GraphError::BadArgument(
                "ANALYSIS.TRAVERSE requires at least 2 arguments: graph, start_node".to_string(),
            ));
        }
        let graph_id = &args[0];
        let start_node_id = &args[1];
        let mut options = TraversalOptions::default();
        let mut format = "detailed";

        let mut i = 2;
        while i < args.len() {
            match args[i].as_str() {
                "DIRECTION" => {
                    let value = args.get(i + 1).ok_or_else(|| {
                        GraphError::BadArgument("DIRECTION option requires an argument".to_string())
                    })?;
                    options.direction = parse_direction(value)?;
                    i += 2;
                }
                "NODETYPES" => {
                    i += 1;
                    while i < args.len() && !is_traverse_keyword(&args[i]) {
                        options.node_types.push(args[i].clone());
                        i += 1;
                    }
                }
                "EDGETYPES" => {
                    i += 1;
                    while i < args.len() && !is_traverse_keyword(&args[i]) {
                        options.edge_types.push(args[i].clone());
                        i += 1;
                    }
                }
                "FORMAT" => {
                    let value = args.get(i + 1).ok_or_else(|| {
                        GraphError::BadArgument("FORMAT option requires an argument".to_string())
                    })?;
                    format = parse_format(value)?;
                    i += 2;
                }
                other => {
                    return Err(GraphError::BadArgument(format!(
                        "unknown option for ANALYSIS.TRAVERSE: {other}"
                    )))
                }
            }
        }

        if format == "detailed" {
            // Detailed output enumerates every branch as its own path.
            let all_paths = self.analyzer.all_paths(graph_id, start_node_id, Some(&options))?;
            if all_paths.is_empty() {
                return Ok(Reply::Null);
            }
            return Ok(multi_traversal_reply(&all_paths));
        }

        let result = self.analyzer.depth_first_search(graph_id, start_node_id, Some(&options))?;
        if result.nodes.is_empty() {
            return Ok(Reply::Null);
        }
        Ok(Reply::Array(
            result
                .nodes
                .iter()
                .map(|node| format!("{}:{}", node.id, node.node_type))
                .collect(),
        ))
    }

    /// Flat `<id>:<type>` rendering of one path
    fn simple_path_reply(&self, graph_id: &str, path: &PathResult) -> Result<Reply> {
        if path.path.is_empty() {
            return Ok(Reply::Null);
        }
        let mut result = Vec::with_capacity(path.path.len());
        for node_id in &path.path {
            let node = self.store.get_node(graph_id, node_id)?;
            result.push(format!("{}:{}", node.id, node.node_type));
        }
        Ok(Reply::Array(result))
    }

    /// Count plus one arrow string per path
    fn multi_path_reply(&self, graph_id: &str, all_paths: &[PathResult]) -> Result<Reply> {
        let mut result = Vec::with_capacity(all_paths.len() + 1);
        result.push(all_paths.len().to_string());

        for path in all_paths {
            let mut rendered = String::new();
            for (i, node_id) in path.path.iter().enumerate() {
                let node = self.store.get_node(graph_id, node_id)?;
                rendered.push_str(&node.id);
                rendered.push(':');
                rendered.push_str(&node.node_type);

                if i + 1 < path.path.len() && i < path.edges.len() {
                    match self.store.get_edge(graph_id, &path.edges[i]) {
                        Ok(edge) => {
                            let arrow = arrow_for(node_id, &path.path[i + 1], &edge);
                            rendered.push_str(arrow);
                            rendered.push_str(&edge.id);
                            rendered.push(':');
                            rendered.push_str(&edge.edge_type);
                            rendered.push_str(arrow);
                        }
                        Err(_) => rendered.push_str("->unknown:unknown->"),
                    }
                }
            }
            result.push(rendered);
        }
        Ok(Reply::Array(result))
    }

    /// Count plus one arrow string per cycle; each cycle closes on its
    /// first node.
    fn detailed_cycle_reply(&self, graph_id: &str, cycles: &[Vec<NodeId>]) -> Result<Reply> {
        let mut rendered_cycles = Vec::with_capacity(cycles.len());
        for cycle in cycles {
            if cycle.is_empty() {
                continue;
            }
            let mut nodes = Vec::with_capacity(cycle.len());
            for node_id in cycle {
                nodes.push(self.store.get_node(graph_id, node_id)?);
            }

            let mut rendered = String::new();
            for i in 0..nodes.len() - 1 {
                let current = &nodes[i];
                let next = &nodes[i + 1];
                rendered.push_str(&current.id);
                rendered.push(':');
                rendered.push_str(&current.node_type);

                match self.find_edge_between(graph_id, &current.id, &next.id)? {
                    Some(edge) => {
                        let arrow = arrow_for(&current.id, &next.id, &edge);
                        rendered.push_str(arrow);
                        rendered.push_str(&edge.id);
                        rendered.push(':');
                        rendered.push_str(&edge.edge_type);
                        rendered.push_str(arrow);
                    }
                    None => rendered.push_str("->unknown:unknown->"),
                }
            }
            let last = &nodes[nodes.len() - 1];
            rendered.push_str(&last.id);
            rendered.push(':');
            rendered.push_str(&last.node_type);

            rendered_cycles.push(rendered);
        }

        let mut result = Vec::with_capacity(rendered_cycles.len() + 1);
        result.push(rendered_cycles.len().to_string());
        result.extend(rendered_cycles);
        Ok(Reply::Array(result))
    }

    /// First edge connecting `from` to `to` in stored direction
    fn find_edge_between(&self, graph_id: &str, from: &str, to: &str) -> Result<Option<Edge>> {
        for edge in self.store.get_outgoing_edges(graph_id, from)? {
            if edge.to_node_id == to {
                return Ok(Some(edge));
            }
        }
        for edge in self.store.get_incoming_edges(graph_id, to)? {
            if edge.from_node_id == from {
                return Ok(Some(edge));
            }
        }
        Ok(None)
    }
}

/// `->` when the edge runs with the rendered step, `<-` when it was
/// traversed against its stored direction.
fn arrow_for(from: &str, to: &str, edge: &Edge) -> &'static str {
    if edge.from_node_id == from && edge.to_node_id == to {
        "->"
    } else if edge.to_node_id == from && edge.from_node_id == to {
        "<-"
    } else {
        "->"
    }
}

/// Count plus one arrow string per traversal path; traversal results
/// carry their edges in step order.
fn multi_traversal_reply(all_paths: &[TraversalResult]) -> Reply {
    let mut result = Vec::with_capacity(all_paths.len() + 1);
    result.push(all_paths.len().to_string());

    for path in all_paths {
        let mut rendered = String::new();
        for (i, node) in path.nodes.iter().enumerate() {
            rendered.push_str(&node.id);
            rendered.push(':');
            rendered.push_str(&node.node_type);

            if i + 1 < path.nodes.len() && i < path.edges.len() {
                let edge = &path.edges[i];
                let arrow = arrow_for(&node.id, &path.nodes[i + 1].id, edge);
                rendered.push_str(arrow);
                rendered.push_str(&edge.id);
                rendered.push(':');
                rendered.push_str(&edge.edge_type);
                rendered.push_str(arrow);
            }
        }
        result.push(rendered);
    }
    Reply::Array(result)
}

fn parse_direction(raw: &str) -> Result<Direction> {
    match raw {
        "in" => Ok(Direction::Backward),
        "out" => Ok(Direction::Forward),
        "both" => Ok(Direction::Both),
        other => Err(GraphError::BadArgument(format!("invalid DIRECTION: {other}"))),
    }
}

fn is_cycles_keyword(arg: &str) -> bool {
    matches!(arg, "NODETYPE" | "NODETYPES" | "EDGETYPE" | "EDGETYPES" | "FORMAT")
}

fn is_traverse_keyword(arg: &str) -> bool {
    matches!(arg, "NODETYPES" | "EDGETYPES" | "DIRECTION" | "FORMAT")
}
