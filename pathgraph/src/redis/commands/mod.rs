// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Command routing
//!
//! Commands are namespaced as `GRAPH.* | NODE.* | EDGE.* | ANALYSIS.*`,
//! plus the unary built-ins `PING` and `INFO`. The verb is upper-cased by
//! the connection loop before routing.

mod analysis;
mod edge;
mod graph;
mod node;

pub use analysis::AnalysisCommands;
pub use edge::EdgeCommands;
pub use graph::GraphCommands;
pub use node::NodeCommands;

use crate::error::{GraphError, Result};
use crate::redis::protocol::Reply;
use crate::storage::GraphStore;

/// Routes commands to their namespace handlers
pub struct CommandHandler {
    graph: GraphCommands,
    node: NodeCommands,
    edge: EdgeCommands,
    analysis: AnalysisCommands,
}

impl CommandHandler {
    pub fn new(store: GraphStore) -> Self {
        Self {
            graph: GraphCommands::new(store.clone()),
            node: NodeCommands::new(store.clone()),
            edge: EdgeCommands::new(store.clone()),
            analysis: AnalysisCommands::new(store),
        }
    }

    /// Route and execute one command
    pub fn handle(&self, command: &str, args: &[String]) -> Result<Reply> {
        let (namespace, verb) = match command.split_once('.') {
            Some((namespace, verb)) => (namespace, Some(verb)),
            None => (command, None),
        };

        match namespace {
            "PING" => Ok(handle_ping(args)),
            "INFO" => Ok(handle_info()),
            "GRAPH" => self.graph.handle(require_verb("GRAPH", verb)?, args),
            "NODE" => self.node.handle(require_verb("NODE", verb)?, args),
            "EDGE" => self.edge.handle(require_verb("EDGE", verb)?, args),
            "ANALYSIS" => self.analysis.handle(require_verb("ANALYSIS", verb)?, args),
            _ => Err(GraphError::BadArgument(format!(
                "unknown command: {command}"
            ))),
        }
    }
}

fn require_verb<'a>(namespace: &str, verb: Option<&'a str>) -> Result<&'a str> {
    verb.ok_or_else(|| GraphError::BadArgument(format!("incomplete {namespace} command")))
}

fn handle_ping(args: &[String]) -> Reply {
    match args.first() {
        None => Reply::Simple("PONG".to_string()),
        Some(message) => Reply::Bulk(message.clone()),
    }
}

fn handle_info() -> Reply {
    let info = [
        "# pathgraph".to_string(),
        format!("version:{}", crate::VERSION),
        "redis_protocol:enabled".to_string(),
        "storage_engine:sled".to_string(),
    ];
    Reply::Bulk(info.join("\r\n"))
}
