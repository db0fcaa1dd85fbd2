// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Node operations
//!
//! Every node write maintains the type index and, when an expiry is set,
//! exactly one expiry-index entry. Deleting a node cascades through every
//! edge with that node as either endpoint, in the same transaction.

use log::{debug, warn};

use super::{edge, GraphStore, StoreSnapshot};
use crate::error::{GraphError, Result};
use crate::keys;
use crate::kvs::WriteTxn;
use crate::model::{AttrValue, Node};

impl GraphStore {
    /// Create or replace a node (upsert)
    pub fn create_node(&self, graph_id: &str, node: &Node) -> Result<()> {
        self.kvs.update(|txn| create_node_tx(txn, graph_id, node))?;
        debug!("created node '{}' in graph '{}'", node.id, graph_id);
        Ok(())
    }

    /// Fetch a node
    pub fn get_node(&self, graph_id: &str, node_id: &str) -> Result<Node> {
        self.snapshot()?.get_node(graph_id, node_id)
    }

    /// Replace an existing node, rewriting indexes that its changes touch
    pub fn update_node(&self, graph_id: &str, node: &Node) -> Result<()> {
        self.kvs.update(|txn| update_node_tx(txn, graph_id, node))
    }

    /// Delete a node and every edge incident on it
    pub fn delete_node(&self, graph_id: &str, node_id: &str) -> Result<()> {
        self.kvs.update(|txn| delete_node_tx(txn, graph_id, node_id))?;
        debug!("deleted node '{}' from graph '{}'", node_id, graph_id);
        Ok(())
    }

    /// List every node in a graph
    pub fn list_nodes(&self, graph_id: &str) -> Result<Vec<Node>> {
        self.snapshot()?.list_nodes(graph_id)
    }

    /// List nodes of one type through the type index
    pub fn list_nodes_by_type(&self, graph_id: &str, node_type: &str) -> Result<Vec<Node>> {
        self.snapshot()?.list_nodes_by_type(graph_id, node_type)
    }

    /// Full scan over a graph's nodes comparing one attribute structurally.
    /// There is no attribute index; callers use this for small graphs and
    /// administrative queries.
    pub fn find_nodes_by_attribute(
        &self,
        graph_id: &str,
        attr_key: &str,
        attr_value: &AttrValue,
    ) -> Result<Vec<Node>> {
        self.snapshot()?
            .find_nodes_by_attribute(graph_id, attr_key, attr_value)
    }
}

impl StoreSnapshot<'_> {
    /// Fetch a node
    pub fn get_node(&self, graph_id: &str, node_id: &str) -> Result<Node> {
        let value = self
            .snap
            .get(&keys::node_key(graph_id, node_id))?
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
        Ok(serde_json::from_slice(&value)?)
    }

    /// List every node in a graph
    pub fn list_nodes(&self, graph_id: &str) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        for entry in self.snap.seek_prefix(&keys::node_iter_prefix(graph_id)) {
            let (_, value) = entry?;
            nodes.push(serde_json::from_slice(&value)?);
        }
        Ok(nodes)
    }

    /// List nodes of one type through the type index.
    /// The index value carries the authoritative node ID; entries whose
    /// node is gone are skipped.
    pub fn list_nodes_by_type(&self, graph_id: &str, node_type: &str) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        for entry in self
            .snap
            .seek_prefix(&keys::node_type_iter_prefix(graph_id, node_type))
        {
            let (_, value) = entry?;
            let node_id = String::from_utf8_lossy(&value).into_owned();
            match self.get_node(graph_id, &node_id) {
                Ok(node) => nodes.push(node),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(nodes)
    }

    /// Full scan comparing one attribute structurally
    pub fn find_nodes_by_attribute(
        &self,
        graph_id: &str,
        attr_key: &str,
        attr_value: &AttrValue,
    ) -> Result<Vec<Node>> {
        let nodes = self.list_nodes(graph_id)?;
        Ok(nodes
            .into_iter()
            .filter(|node| node.get_attribute(attr_key) == Some(attr_value))
            .collect())
    }
}

pub(crate) fn create_node_tx(txn: &mut WriteTxn<'_>, graph_id: &str, node: &Node) -> Result<()> {
    let value = serde_json::to_vec(node)?;
    txn.set(&keys::node_key(graph_id, &node.id), &value);

    txn.set(
        &keys::node_type_index_key(graph_id, &node.node_type, &node.id),
        node.id.as_bytes(),
    );

    // A node with an already-past expiry is still stored; the next sweep
    // collects it.
    if let Some(expires_at) = node.expires_at {
        txn.set(
            &keys::expiry_index_key(graph_id, &node.id, expires_at),
            node.id.as_bytes(),
        );
    }

    Ok(())
}

pub(crate) fn get_node_tx(txn: &WriteTxn<'_>, graph_id: &str, node_id: &str) -> Result<Node> {
    let value = txn
        .get(&keys::node_key(graph_id, node_id))?
        .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
    Ok(serde_json::from_slice(&value)?)
}

pub(crate) fn update_node_tx(txn: &mut WriteTxn<'_>, graph_id: &str, node: &Node) -> Result<()> {
    let existing = get_node_tx(txn, graph_id, &node.id)?;

    if existing.node_type != node.node_type {
        txn.delete(&keys::node_type_index_key(
            graph_id,
            &existing.node_type,
            &node.id,
        ));
        txn.set(
            &keys::node_type_index_key(graph_id, &node.node_type, &node.id),
            node.id.as_bytes(),
        );
    }

    if existing.expires_at != node.expires_at {
        if let Some(old) = existing.expires_at {
            txn.delete(&keys::expiry_index_key(graph_id, &node.id, old));
        }
        if let Some(new) = node.expires_at {
            txn.set(
                &keys::expiry_index_key(graph_id, &node.id, new),
                node.id.as_bytes(),
            );
        }
    }

    let value = serde_json::to_vec(node)?;
    txn.set(&keys::node_key(graph_id, &node.id), &value);
    Ok(())
}

pub(crate) fn delete_node_tx(txn: &mut WriteTxn<'_>, graph_id: &str, node_id: &str) -> Result<()> {
    // Fetch first: the type and expiry are needed for index cleanup.
    let node = get_node_tx(txn, graph_id, node_id)?;

    txn.delete(&keys::node_key(graph_id, node_id));
    txn.delete(&keys::node_type_index_key(
        graph_id,
        &node.node_type,
        node_id,
    ));
    if let Some(expires_at) = node.expires_at {
        txn.delete(&keys::expiry_index_key(graph_id, node_id, expires_at));
    }

    // Cascade through incident edges. The adjacency value carries the
    // authoritative edge ID. The cascade is best-effort: a dangling entry
    // whose edge already expired is logged and skipped.
    for (key, value) in txn.seek_prefix(&keys::out_edge_iter_prefix(graph_id, node_id))? {
        let edge_id = String::from_utf8_lossy(&value).into_owned();
        if let Err(e) = edge::delete_edge_tx(txn, graph_id, &edge_id) {
            warn!(
                "node '{}' delete: failed to delete outgoing edge '{}': {}",
                node_id, edge_id, e
            );
            txn.delete(&key);
        }
    }
    for (key, value) in txn.seek_prefix(&keys::in_edge_iter_prefix(graph_id, node_id))? {
        let edge_id = String::from_utf8_lossy(&value).into_owned();
        if let Err(e) = edge::delete_edge_tx(txn, graph_id, &edge_id) {
            warn!(
                "node '{}' delete: failed to delete incoming edge '{}': {}",
                node_id, edge_id, e
            );
            txn.delete(&key);
        }
    }

    Ok(())
}
