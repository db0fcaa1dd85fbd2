// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! `GRAPH.*` commands

use crate::error::{GraphError, Result};
use crate::model::Graph;
use crate::redis::protocol::Reply;
use crate::storage::GraphStore;

pub struct GraphCommands {
    store: GraphStore,
}

impl GraphCommands {
    pub fn new(store: GraphStore) -> Self {
        Self { store }
    }

    pub fn handle(&self, verb: &str, args: &[String]) -> Result<Reply> {
        match verb {
            "CREATE" => self.create(args),
            "DELETE" => self.delete(args),
            "LIST" => self.list(),
            "GET" => self.get(args),
            "EXISTS" => self.exists(args),
            _ => Err(GraphError::BadArgument(format!(
                "unknown GRAPH command: {verb}"
            ))),
        }
    }

    /// `GRAPH.CREATE <name> [description]`
    fn create(&self, args: &[String]) -> Result<Reply> {
        if args.is_empty() {
            return Err(GraphError::BadArgument(
                "GRAPH.CREATE requires at least 1 argument: name".to_string(),
            ));
        }
        let name = &args[0];
        let description = args.get(1).cloned().unwrap_or_default();

        let graph = Graph::new(name.clone(), name.clone(), description);
        self.store.create_graph(&graph)?;
        Ok(Reply::ok())
    }

    /// `GRAPH.DELETE <name>`
    fn delete(&self, args: &[String]) -> Result<Reply> {
        if args.len() != 1 {
            return Err(GraphError::BadArgument(
                "GRAPH.DELETE requires exactly 1 argument: name".to_string(),
            ));
        }
        self.store.delete_graph(&args[0])?;
        Ok(Reply::ok())
    }

    /// `GRAPH.LIST` — flat array alternating id, description
    fn list(&self) -> Result<Reply> {
        let graphs = self.store.list_graphs()?;
        let mut result = Vec::with_capacity(graphs.len() * 2);
        for graph in graphs {
            result.push(graph.id);
            result.push(graph.description);
        }
        Ok(Reply::Array(result))
    }

    /// `GRAPH.GET <name>` — `[id, name, description, node_count, edge_count]`
    fn get(&self, args: &[String]) -> Result<Reply> {
        if args.len() != 1 {
            return Err(GraphError::BadArgument(
                "GRAPH.GET requires exactly 1 argument: name".to_string(),
            ));
        }
        let graph = match self.store.get_graph(&args[0]) {
            Ok(graph) => graph,
            Err(e) if e.is_not_found() => return Ok(Reply::Null),
            Err(e) => return Err(e),
        };

        let node_count = self.store.count_nodes(&graph.id)?;
        let edge_count = self.store.count_edges(&graph.id)?;

        Ok(Reply::Array(vec![
            graph.id,
            graph.name,
            graph.description,
            node_count.to_string(),
            edge_count.to_string(),
        ]))
    }

    /// `GRAPH.EXISTS <name>`
    fn exists(&self, args: &[String]) -> Result<Reply> {
        if args.len() != 1 {
            return Err(GraphError::BadArgument(
                "GRAPH.EXISTS requires exactly 1 argument: name".to_string(),
            ));
        }
        match self.store.get_graph(&args[0]) {
            Ok(_) => Ok(Reply::Int(1)),
            Err(e) if e.is_not_found() => Ok(Reply::Int(0)),
            Err(e) => Err(e),
        }
    }
}
