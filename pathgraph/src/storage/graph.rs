// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graph record operations
//!
//! Graph create and update are upserts. Deleting a graph cascades through
//! every node (which in turn cascades through incident edges), then sweeps
//! any remaining edge records, then removes the graph record itself.
//! Deleting a graph that does not exist is a no-op.

use log::{debug, warn};

use super::{edge, node, GraphStore, StoreSnapshot};
use crate::error::{GraphError, Result};
use crate::keys;
use crate::model::Graph;

impl GraphStore {
    /// Create or replace a graph record
    pub fn create_graph(&self, graph: &Graph) -> Result<()> {
        let value = serde_json::to_vec(graph)?;
        self.kvs.update(|txn| {
            txn.set(&keys::graph_key(&graph.id), &value);
            Ok(())
        })?;
        debug!("created graph '{}'", graph.id);
        Ok(())
    }

    /// Fetch a graph record
    pub fn get_graph(&self, graph_id: &str) -> Result<Graph> {
        self.snapshot()?.get_graph(graph_id)
    }

    /// Replace an existing graph record; fails if the graph is absent
    pub fn update_graph(&self, graph: &Graph) -> Result<()> {
        let value = serde_json::to_vec(graph)?;
        self.kvs.update(|txn| {
            if txn.get(&keys::graph_key(&graph.id))?.is_none() {
                return Err(GraphError::GraphNotFound(graph.id.clone()));
            }
            txn.set(&keys::graph_key(&graph.id), &value);
            Ok(())
        })
    }

    /// Delete a graph and everything in it
    pub fn delete_graph(&self, graph_id: &str) -> Result<()> {
        self.kvs.update(|txn| {
            // Phase 1: delete nodes; each cascades through incident edges.
            for (key, _) in txn.seek_prefix(&keys::node_iter_prefix(graph_id))? {
                let Some(node_id) = keys::node_id_from_key(graph_id, &key).map(str::to_string)
                else {
                    continue;
                };
                if let Err(e) = node::delete_node_tx(txn, graph_id, &node_id) {
                    // Keep cleaning up; the cascade is best-effort.
                    warn!(
                        "graph '{}' delete: failed to delete node '{}': {}",
                        graph_id, node_id, e
                    );
                }
            }

            // Phase 2: sweep edges the node cascade did not reach.
            for (key, _) in txn.seek_prefix(&keys::edge_iter_prefix(graph_id))? {
                let Some(edge_id) = keys::edge_id_from_key(graph_id, &key).map(str::to_string)
                else {
                    continue;
                };
                if let Err(e) = edge::delete_edge_tx(txn, graph_id, &edge_id) {
                    warn!(
                        "graph '{}' delete: failed to delete edge '{}': {}",
                        graph_id, edge_id, e
                    );
                }
            }

            // Phase 3: the graph record itself.
            txn.delete(&keys::graph_key(graph_id));
            Ok(())
        })?;
        debug!("deleted graph '{}'", graph_id);
        Ok(())
    }

    /// List every graph in the store
    pub fn list_graphs(&self) -> Result<Vec<Graph>> {
        self.snapshot()?.list_graphs()
    }
}

impl StoreSnapshot<'_> {
    /// Fetch a graph record
    pub fn get_graph(&self, graph_id: &str) -> Result<Graph> {
        let value = self
            .snap
            .get(&keys::graph_key(graph_id))?
            .ok_or_else(|| GraphError::GraphNotFound(graph_id.to_string()))?;
        Ok(serde_json::from_slice(&value)?)
    }

    /// List every graph in the store
    pub fn list_graphs(&self) -> Result<Vec<Graph>> {
        let mut graphs = Vec::new();
        for entry in self.snap.seek_prefix(&keys::graph_iter_prefix()) {
            let (_, value) = entry?;
            graphs.push(serde_json::from_slice(&value)?);
        }
        Ok(graphs)
    }
}
