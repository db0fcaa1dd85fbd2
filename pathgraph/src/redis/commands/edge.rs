// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! `EDGE.*` commands

use chrono::{Duration, Utc};

use super::node::{format_expiry, parse_attrs_and_ttl, parse_filter_value};
use crate::error::{GraphError, Result};
use crate::model::{Attributes, Edge, Node};
use crate::redis::protocol::Reply;
use crate::storage::GraphStore;

pub struct EdgeCommands {
    store: GraphStore,
}

struct NeighborInfo {
    node: Node,
    edge: Edge,
    incoming: bool,
}

impl EdgeCommands {
    pub fn new(store: GraphStore) -> Self {
        Self { store }
    }

    pub fn handle(&self, verb: &str, args: &[String]) -> Result<Reply> {
        match verb {
            "CREATE" => self.create(args),
            "GET" => self.get(args),
            "UPDATE" => self.update(args),
            "DELETE" => self.delete(args),
            "FILTER" => self.filter(args),
            "NEIGHBORS" => self.neighbors(args),
            "LIST" => self.list(args),
            "EXISTS" => self.exists(args),
            _ => Err(GraphError::BadArgument(format!(
                "unknown EDGE command: {verb}"
            ))),
        }
    }

    /// `EDGE.CREATE <graph> <id> <from> <to> <type> [attributes_json] [TTL <seconds>]`
    fn create(&self, args: &[String]) -> Result<Reply> {
        if args.len() < 5 {
            return Err(GraphError::BadArgument(
                "EDGE.CREATE requires at least 5 arguments: graph, id, from, to, type".to_string(),
            ));
        }
        let (attributes, ttl_seconds) = parse_attrs_and_ttl(&args[5..])?;

        let mut edge = Edge::new(
            args[1].clone(),
            args[2].clone(),
            args[3].clone(),
            args[4].clone(),
        );
        edge.attributes = attributes;
        if ttl_seconds > 0 {
            edge.expires_at = Some(Utc::now() + Duration::seconds(ttl_seconds));
        }

        self.store.create_edge(&args[0], &edge)?;
        Ok(Reply::ok())
    }

    /// `EDGE.GET <graph> <id>` — `[id, from, to, type, attributes_json, expires_at]`
    fn get(&self, args: &[String]) -> Result<Reply> {
        if args.len() != 2 {
            return Err(GraphError::BadArgument(
                "EDGE.GET requires exactly 2 arguments: graph, id".to_string(),
            ));
        }
        let edge = match self.store.get_edge(&args[0], &args[1]) {
            Ok(edge) => edge,
            Err(e) if e.is_not_found() => return Ok(Reply::Null),
            Err(e) => return Err(e),
        };

        Ok(Reply::Array(vec![
            edge.id,
            edge.from_node_id,
            edge.to_node_id,
            edge.edge_type,
            serde_json::to_string(&edge.attributes)?,
            format_expiry(edge.expires_at),
        ]))
    }

    /// `EDGE.UPDATE <graph> <id> <attributes_json> [TTL <seconds>]`
    fn update(&self, args: &[String]) -> Result<Reply> {
        if args.len() < 3 {
            return Err(GraphError::BadArgument(
                "EDGE.UPDATE requires at least 3 arguments: graph, id, attributes_json".to_string(),
            ));
        }
        let attributes: Attributes = serde_json::from_str(&args[2])
            .map_err(|e| GraphError::BadArgument(format!("invalid attributes JSON: {e}")))?;

        let mut ttl_seconds: i64 = -1;
        if args.len() > 4 && args[3].to_uppercase() == "TTL" {
            ttl_seconds = args[4]
                .parse()
                .map_err(|e| GraphError::BadArgument(format!("invalid TTL value: {e}")))?;
        }

        let mut edge = self.store.get_edge(&args[0], &args[1])?;
        edge.attributes = attributes;
        if ttl_seconds >= 0 {
            // TTL 0 removes the expiry.
            edge.expires_at = if ttl_seconds == 0 {
                None
            } else {
                Some(Utc::now() + Duration::seconds(ttl_seconds))
            };
        }

        self.store.update_edge(&args[0], &edge)?;
        Ok(Reply::ok())
    }

    /// `EDGE.DELETE <graph> <id>`
    fn delete(&self, args: &[String]) -> Result<Reply> {
        if args.len() != 2 {
            return Err(GraphError::BadArgument(
                "EDGE.DELETE requires exactly 2 arguments: graph, id".to_string(),
            ));
        }
        self.store.delete_edge(&args[0], &args[1])?;
        Ok(Reply::ok())
    }

    /// `EDGE.FILTER <graph> <attribute_key> <attribute_value>`
    fn filter(&self, args: &[String]) -> Result<Reply> {
        if args.len() != 3 {
            return Err(GraphError::BadArgument(
                "EDGE.FILTER requires exactly 3 arguments: graph, attribute_key, attribute_value"
                    .to_string(),
            ));
        }
        let value = parse_filter_value(&args[2]);
        let edges = self.store.find_edges_by_attribute(&args[0], &args[1], &value)?;

        let mut result = Vec::with_capacity(edges.len() * 5);
        for edge in edges {
            let attributes = serde_json::to_string(&edge.attributes)?;
            result.push(edge.id);
            result.push(edge.from_node_id);
            result.push(edge.to_node_id);
            result.push(edge.edge_type);
            result.push(attributes);
        }
        Ok(Reply::Array(result))
    }

    /// `EDGE.NEIGHBORS <graph> <node_id> [in|out|both] [FORMAT simple|detailed]`
    fn neighbors(&self, args: &[String]) -> Result<Reply> {
        if args.len() < 2 {
            return Err(GraphError::BadArgument(
                "EDGE.NEIGHBORS requires at least 2 arguments: graph, node_id".to_string(),
            ));
        }
        let graph_id = &args[0];
        let node_id = &args[1];
        let mut direction = "both";
        let mut format = "detailed";

        let mut i = 2;
        while i < args.len() {
            match args[i].as_str() {
                "FORMAT" if i + 1 < args.len() => {
                    i += 1;
                    format = parse_format(&args[i])?;
                }
                "in" | "out" | "both" => direction = args[i].as_str(),
                other => {
                    return Err(GraphError::BadArgument(format!("invalid argument: {other}")))
                }
            }
            i += 1;
        }

        let mut neighbors: Vec<NeighborInfo> = Vec::new();
        if direction == "in" || direction == "both" {
            for edge in self.store.get_incoming_edges(graph_id, node_id)? {
                if let Ok(node) = self.store.get_node(graph_id, &edge.from_node_id) {
                    neighbors.push(NeighborInfo {
                        node,
                        edge,
                        incoming: true,
                    });
                }
            }
        }
        if direction == "out" || direction == "both" {
            for edge in self.store.get_outgoing_edges(graph_id, node_id)? {
                if let Ok(node) = self.store.get_node(graph_id, &edge.to_node_id) {
                    neighbors.push(NeighborInfo {
                        node,
                        edge,
                        incoming: false,
                    });
                }
            }
        }

        if format == "simple" {
            return Ok(Reply::Array(
                neighbors
                    .iter()
                    .map(|info| format!("{}:{}", info.node.id, info.node.node_type))
                    .collect(),
            ));
        }

        // Detailed: count, then one arrow string per neighbour. Edges
        // pointing at the node render with reversed arrows.
        let mut result = Vec::with_capacity(neighbors.len() + 1);
        result.push(neighbors.len().to_string());
        for info in &neighbors {
            let (arrow, dir) = if info.incoming { ("<-", "in") } else { ("->", "out") };
            result.push(format!(
                "{}:{}{arrow}{}:{}{arrow}{dir}",
                info.node.id, info.node.node_type, info.edge.id, info.edge.edge_type
            ));
        }
        Ok(Reply::Array(result))
    }

    /// `EDGE.LIST <graph>` — flat array alternating id, from, to, type
    fn list(&self, args: &[String]) -> Result<Reply> {
        if args.len() != 1 {
            return Err(GraphError::BadArgument(
                "EDGE.LIST requires exactly 1 argument: graph".to_string(),
            ));
        }
        let edges = self.store.list_edges(&args[0])?;
        let mut result = Vec::with_capacity(edges.len() * 4);
        for edge in edges {
            result.push(edge.id);
            result.push(edge.from_node_id);
            result.push(edge.to_node_id);
            result.push(edge.edge_type);
        }
        Ok(Reply::Array(result))
    }

    /// `EDGE.EXISTS <graph> <id>`
    fn exists(&self, args: &[String]) -> Result<Reply> {
        if args.len() != 2 {
            return Err(GraphError::BadArgument(
                "EDGE.EXISTS requires exactly 2 arguments: graph, id".to_string(),
            ));
        }
        match self.store.get_edge(&args[0], &args[1]) {
            Ok(_) => Ok(Reply::Int(1)),
            Err(e) if e.is_not_found() => Ok(Reply::Int(0)),
            Err(e) => Err(e),
        }
    }
}

pub(crate) fn parse_format(raw: &str) -> Result<&str> {
    match raw {
        "simple" => Ok("simple"),
        "detailed" => Ok("detailed"),
        other => Err(GraphError::BadArgument(format!(
            "invalid FORMAT: {other} (must be 'simple' or 'detailed')"
        ))),
    }
}
