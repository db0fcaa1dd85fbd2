// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! `NODE.*` commands

use chrono::{Duration, SecondsFormat, Utc};

use crate::error::{GraphError, Result};
use crate::model::{AttrValue, Attributes, Node};
use crate::redis::protocol::Reply;
use crate::storage::GraphStore;

pub struct NodeCommands {
    store: GraphStore,
}

/// Parse a `TTL <seconds>` / attributes-JSON argument tail.
/// Returns `(attributes, ttl_seconds)`; ttl is -1 when absent.
pub(crate) fn parse_attrs_and_ttl(args: &[String]) -> Result<(Attributes, i64)> {
    let mut attributes = Attributes::new();
    let mut ttl_seconds: i64 = -1;

    let mut i = 0;
    while i < args.len() {
        if args[i].to_uppercase() == "TTL" {
            let value = args
                .get(i + 1)
                .ok_or_else(|| GraphError::BadArgument("TTL option requires a value".to_string()))?;
            ttl_seconds = value
                .parse()
                .map_err(|e| GraphError::BadArgument(format!("invalid TTL value: {e}")))?;
            i += 2;
        } else {
            attributes = serde_json::from_str(&args[i])
                .map_err(|e| GraphError::BadArgument(format!("invalid attributes JSON: {e}")))?;
            i += 1;
        }
    }
    Ok((attributes, ttl_seconds))
}

/// Parse a filter value as JSON, falling back to a plain string
pub(crate) fn parse_filter_value(raw: &str) -> AttrValue {
    serde_json::from_str(raw).unwrap_or_else(|_| AttrValue::String(raw.to_string()))
}

pub(crate) fn format_expiry(expires_at: Option<chrono::DateTime<Utc>>) -> String {
    expires_at
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

impl NodeCommands {
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
            "LIST" => self.list(args),
            "EXISTS" => self.exists(args),
            _ => Err(GraphError::BadArgument(format!(
                "unknown NODE command: {verb}"
            ))),
        }
    }

    /// `NODE.CREATE <graph> <id> <type> [attributes_json] [TTL <seconds>]`
    fn create(&self, args: &[String]) -> Result<Reply> {
        if args.len() < 3 {
            return Err(GraphError::BadArgument(
                "NODE.CREATE requires at least 3 arguments: graph, id, type".to_string(),
            ));
        }
        let (attributes, ttl_seconds) = parse_attrs_and_ttl(&args[3..])?;

        let mut node = Node::new(args[1].clone(), args[2].clone());
        node.attributes = attributes;
        if ttl_seconds > 0 {
            node.expires_at = Some(Utc::now() + Duration::seconds(ttl_seconds));
        }

        self.store.create_node(&args[0], &node)?;
        Ok(Reply::ok())
    }

    /// `NODE.GET <graph> <id>` — `[id, type, attributes_json, expires_at]`
    fn get(&self, args: &[String]) -> Result<Reply> {
        if args.len() != 2 {
            return Err(GraphError::BadArgument(
                "NODE.GET requires exactly 2 arguments: graph, id".to_string(),
            ));
        }
        let node = match self.store.get_node(&args[0], &args[1]) {
            Ok(node) => node,
            Err(e) if e.is_not_found() => return Ok(Reply::Null),
            Err(e) => return Err(e),
        };

        Ok(Reply::Array(vec![
            node.id,
            node.node_type,
            serde_json::to_string(&node.attributes)?,
            format_expiry(node.expires_at),
        ]))
    }

    /// `NODE.UPDATE <graph> <id> <attributes_json> [TTL <seconds>]`
    fn update(&self, args: &[String]) -> Result<Reply> {
        if args.len() < 3 {
            return Err(GraphError::BadArgument(
                "NODE.UPDATE requires at least 3 arguments: graph, id, attributes_json".to_string(),
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

        let mut node = self.store.get_node(&args[0], &args[1])?;
        node.attributes = attributes;
        if ttl_seconds >= 0 {
            // TTL 0 removes the expiry.
            node.expires_at = if ttl_seconds == 0 {
                None
            } else {
                Some(Utc::now() + Duration::seconds(ttl_seconds))
            };
        }

        self.store.update_node(&args[0], &node)?;
        Ok(Reply::ok())
    }

    /// `NODE.DELETE <graph> <id>`
    fn delete(&self, args: &[String]) -> Result<Reply> {
        if args.len() != 2 {
            return Err(GraphError::BadArgument(
                "NODE.DELETE requires exactly 2 arguments: graph, id".to_string(),
            ));
        }
        self.store.delete_node(&args[0], &args[1])?;
        Ok(Reply::ok())
    }

    /// `NODE.FILTER <graph> <attribute_key> <attribute_value>`
    fn filter(&self, args: &[String]) -> Result<Reply> {
        if args.len() != 3 {
            return Err(GraphError::BadArgument(
                "NODE.FILTER requires exactly 3 arguments: graph, attribute_key, attribute_value"
                    .to_string(),
            ));
        }
        let value = parse_filter_value(&args[2]);
        let nodes = self.store.find_nodes_by_attribute(&args[0], &args[1], &value)?;

        let mut result = Vec::with_capacity(nodes.len() * 3);
        for node in nodes {
            let attributes = serde_json::to_string(&node.attributes)?;
            result.push(node.id);
            result.push(node.node_type);
            result.push(attributes);
        }
        Ok(Reply::Array(result))
    }

    /// `NODE.LIST <graph>` — array of `<id>:<type>` strings
    fn list(&self, args: &[String]) -> Result<Reply> {
        if args.len() != 1 {
            return Err(GraphError::BadArgument(
                "NODE.LIST requires exactly 1 argument: graph".to_string(),
            ));
        }
        let nodes = self.store.list_nodes(&args[0])?;
        Ok(Reply::Array(
            nodes
                .into_iter()
                .map(|node| format!("{}:{}", node.id, node.node_type))
                .collect(),
        ))
    }

    /// `NODE.EXISTS <graph> <id>`
    fn exists(&self, args: &[String]) -> Result<Reply> {
        if args.len() != 2 {
            return Err(GraphError::BadArgument(
                "NODE.EXISTS requires exactly 2 arguments: graph, id".to_string(),
            ));
        }
        match self.store.get_node(&args[0], &args[1]) {
            Ok(_) => Ok(Reply::Int(1)),
            Err(e) if e.is_not_found() => Ok(Reply::Int(0)),
            Err(e) => Err(e),
        }
    }
}
