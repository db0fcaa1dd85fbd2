// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! PathGraph - a persistent property-graph database with a Redis-wire
//! command surface
//!
//! Typed, attributed nodes and directed edges live in named graphs backed
//! by an embedded ordered key-value store. The library provides:
//!
//! - **Storage engine**: transactional CRUD with secondary type,
//!   adjacency, and expiry indexes, cascading deletes, and TTL
//! - **Analysis engine**: DFS, all-paths enumeration, BFS shortest
//!   paths, elementary-cycle enumeration, classification and statistics,
//!   degree centrality, and Louvain community detection
//! - **Command dispatcher**: the `GRAPH.* | NODE.* | EDGE.* | ANALYSIS.*`
//!   command set over RESP, with a thread-per-connection TCP server
//!
//! ```no_run
//! use pathgraph::{Graph, GraphStore, Node};
//!
//! let store = GraphStore::open("./data")?;
//! store.create_graph(&Graph::new("deps", "deps", "service dependencies"))?;
//! store.create_node("deps", &Node::new("auth", "service"))?;
//! # Ok::<(), pathgraph::GraphError>(())
//! ```

pub mod analysis;
pub mod error;
pub mod keys;
pub mod kvs;
pub mod model;
pub mod redis;
pub mod storage;

pub use analysis::{Direction, GraphAnalyzer, GraphStats, PathResult, TraversalOptions, TraversalResult};
pub use error::{GraphError, Result};
pub use model::{AttrValue, Attributes, Edge, Graph, Node};
pub use storage::{GraphStore, TtlManager};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
