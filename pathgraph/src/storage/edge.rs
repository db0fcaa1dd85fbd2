// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Edge operations
//!
//! Edge creation verifies both endpoints exist in the same graph. Every
//! edge write maintains the type index and both adjacency-index entries.
//! Edge records carrying an expiry are stored with an engine-level TTL, so
//! they vanish on read once expired whether or not the sweeper has run;
//! lookups through the indexes skip entries whose edge is gone.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use log::debug;

use super::{node, GraphStore, StoreSnapshot};
use crate::error::{GraphError, Result};
use crate::keys;
use crate::kvs::WriteTxn;
use crate::model::{AttrValue, Edge, Node};

impl GraphStore {
    /// Create or replace an edge (upsert); both endpoints must exist
    pub fn create_edge(&self, graph_id: &str, edge: &Edge) -> Result<()> {
        self.kvs.update(|txn| create_edge_tx(txn, graph_id, edge))?;
        debug!("created edge '{}' in graph '{}'", edge.id, graph_id);
        Ok(())
    }

    /// Fetch an edge
    pub fn get_edge(&self, graph_id: &str, edge_id: &str) -> Result<Edge> {
        self.snapshot()?.get_edge(graph_id, edge_id)
    }

    /// Replace an existing edge, rewriting indexes its changes touch
    pub fn update_edge(&self, graph_id: &str, edge: &Edge) -> Result<()> {
        self.kvs.update(|txn| update_edge_tx(txn, graph_id, edge))
    }

    /// Delete an edge and its index entries
    pub fn delete_edge(&self, graph_id: &str, edge_id: &str) -> Result<()> {
        self.kvs.update(|txn| delete_edge_tx(txn, graph_id, edge_id))?;
        debug!("deleted edge '{}' from graph '{}'", edge_id, graph_id);
        Ok(())
    }

    /// List every edge in a graph
    pub fn list_edges(&self, graph_id: &str) -> Result<Vec<Edge>> {
        self.snapshot()?.list_edges(graph_id)
    }

    /// List edges of one type through the type index
    pub fn list_edges_by_type(&self, graph_id: &str, edge_type: &str) -> Result<Vec<Edge>> {
        self.snapshot()?.list_edges_by_type(graph_id, edge_type)
    }

    /// Edges leaving a node
    pub fn get_outgoing_edges(&self, graph_id: &str, node_id: &str) -> Result<Vec<Edge>> {
        self.snapshot()?.outgoing_edges(graph_id, node_id)
    }

    /// Edges arriving at a node
    pub fn get_incoming_edges(&self, graph_id: &str, node_id: &str) -> Result<Vec<Edge>> {
        self.snapshot()?.incoming_edges(graph_id, node_id)
    }

    /// Nodes adjacent to a node in either direction, deduplicated
    pub fn get_connected_nodes(&self, graph_id: &str, node_id: &str) -> Result<Vec<Node>> {
        self.snapshot()?.connected_nodes(graph_id, node_id)
    }

    /// Full scan over a graph's edges comparing one attribute structurally
    pub fn find_edges_by_attribute(
        &self,
        graph_id: &str,
        attr_key: &str,
        attr_value: &AttrValue,
    ) -> Result<Vec<Edge>> {
        self.snapshot()?
            .find_edges_by_attribute(graph_id, attr_key, attr_value)
    }
}

impl StoreSnapshot<'_> {
    /// Fetch an edge
    pub fn get_edge(&self, graph_id: &str, edge_id: &str) -> Result<Edge> {
        let value = self
            .snap
            .get(&keys::edge_key(graph_id, edge_id))?
            .ok_or_else(|| GraphError::EdgeNotFound(edge_id.to_string()))?;
        Ok(serde_json::from_slice(&value)?)
    }

    /// List every edge in a graph
    pub fn list_edges(&self, graph_id: &str) -> Result<Vec<Edge>> {
        let mut edges = Vec::new();
        for entry in self.snap.seek_prefix(&keys::edge_iter_prefix(graph_id)) {
            let (_, value) = entry?;
            edges.push(serde_json::from_slice(&value)?);
        }
        Ok(edges)
    }

    /// List edges of one type through the type index.
    /// The index value carries the authoritative edge ID; entries whose
    /// edge is gone are skipped.
    pub fn list_edges_by_type(&self, graph_id: &str, edge_type: &str) -> Result<Vec<Edge>> {
        let mut edges = Vec::new();
        for entry in self
            .snap
            .seek_prefix(&keys::edge_type_iter_prefix(graph_id, edge_type))
        {
            let (_, value) = entry?;
            let edge_id = String::from_utf8_lossy(&value).into_owned();
            match self.get_edge(graph_id, &edge_id) {
                Ok(edge) => edges.push(edge),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(edges)
    }

    /// Edges leaving a node, resolved through the outgoing adjacency index
    pub fn outgoing_edges(&self, graph_id: &str, node_id: &str) -> Result<Vec<Edge>> {
        self.adjacent_edges(graph_id, &keys::out_edge_iter_prefix(graph_id, node_id))
    }

    /// Edges arriving at a node, resolved through the incoming adjacency index
    pub fn incoming_edges(&self, graph_id: &str, node_id: &str) -> Result<Vec<Edge>> {
        self.adjacent_edges(graph_id, &keys::in_edge_iter_prefix(graph_id, node_id))
    }

    fn adjacent_edges(&self, graph_id: &str, prefix: &[u8]) -> Result<Vec<Edge>> {
        let mut edges = Vec::new();
        for entry in self.snap.seek_prefix(prefix) {
            let (_, value) = entry?;
            let edge_id = String::from_utf8_lossy(&value).into_owned();
            match self.get_edge(graph_id, &edge_id) {
                Ok(edge) => edges.push(edge),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(edges)
    }

    /// Union of outgoing targets and incoming sources, deduplicated
    pub fn connected_nodes(&self, graph_id: &str, node_id: &str) -> Result<Vec<Node>> {
        let mut by_id: BTreeMap<String, Node> = BTreeMap::new();

        for edge in self.outgoing_edges(graph_id, node_id)? {
            if by_id.contains_key(&edge.to_node_id) {
                continue;
            }
            match self.get_node(graph_id, &edge.to_node_id) {
                Ok(node) => {
                    by_id.insert(edge.to_node_id.clone(), node);
                }
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }

        for edge in self.incoming_edges(graph_id, node_id)? {
            if by_id.contains_key(&edge.from_node_id) {
                continue;
            }
            match self.get_node(graph_id, &edge.from_node_id) {
                Ok(node) => {
                    by_id.insert(edge.from_node_id.clone(), node);
                }
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(by_id.into_values().collect())
    }

    /// Full scan comparing one attribute structurally
    pub fn find_edges_by_attribute(
        &self,
        graph_id: &str,
        attr_key: &str,
        attr_value: &AttrValue,
    ) -> Result<Vec<Edge>> {
        let edges = self.list_edges(graph_id)?;
        Ok(edges
            .into_iter()
            .filter(|edge| edge.get_attribute(attr_key) == Some(attr_value))
            .collect())
    }
}

fn set_edge_record(txn: &mut WriteTxn<'_>, graph_id: &str, edge: &Edge) -> Result<bool> {
    let key = keys::edge_key(graph_id, &edge.id);
    let value = serde_json::to_vec(edge)?;
    match edge.expires_at {
        Some(expires_at) => {
            let ttl = expires_at.signed_duration_since(Utc::now());
            match ttl.to_std() {
                Ok(ttl) if ttl > Duration::ZERO => {
                    txn.set_with_ttl(&key, &value, ttl);
                    Ok(true)
                }
                // Already expired.
                _ => Ok(false),
            }
        }
        None => {
            txn.set(&key, &value);
            Ok(true)
        }
    }
}

pub(crate) fn create_edge_tx(txn: &mut WriteTxn<'_>, graph_id: &str, edge: &Edge) -> Result<()> {
    // Referential integrity: both endpoints must resolve right now.
    node::get_node_tx(txn, graph_id, &edge.from_node_id)
        .map_err(|_| GraphError::EndpointMissing(edge.from_node_id.clone()))?;
    node::get_node_tx(txn, graph_id, &edge.to_node_id)
        .map_err(|_| GraphError::EndpointMissing(edge.to_node_id.clone()))?;

    // An edge whose expiry already passed is not created at all; the
    // operation still succeeds.
    if !set_edge_record(txn, graph_id, edge)? {
        return Ok(());
    }

    txn.set(
        &keys::edge_type_index_key(graph_id, &edge.edge_type, &edge.id),
        edge.id.as_bytes(),
    );
    txn.set(
        &keys::out_edge_index_key(graph_id, &edge.from_node_id, &edge.id),
        edge.id.as_bytes(),
    );
    txn.set(
        &keys::in_edge_index_key(graph_id, &edge.to_node_id, &edge.id),
        edge.id.as_bytes(),
    );

    Ok(())
}

pub(crate) fn get_edge_tx(txn: &WriteTxn<'_>, graph_id: &str, edge_id: &str) -> Result<Edge> {
    let value = txn
        .get(&keys::edge_key(graph_id, edge_id))?
        .ok_or_else(|| GraphError::EdgeNotFound(edge_id.to_string()))?;
    Ok(serde_json::from_slice(&value)?)
}

pub(crate) fn update_edge_tx(txn: &mut WriteTxn<'_>, graph_id: &str, edge: &Edge) -> Result<()> {
    let existing = get_edge_tx(txn, graph_id, &edge.id)?;

    if existing.edge_type != edge.edge_type {
        txn.delete(&keys::edge_type_index_key(
            graph_id,
            &existing.edge_type,
            &edge.id,
        ));
        txn.set(
            &keys::edge_type_index_key(graph_id, &edge.edge_type, &edge.id),
            edge.id.as_bytes(),
        );
    }

    if existing.from_node_id != edge.from_node_id || existing.to_node_id != edge.to_node_id {
        txn.delete(&keys::out_edge_index_key(
            graph_id,
            &existing.from_node_id,
            &edge.id,
        ));
        txn.delete(&keys::in_edge_index_key(
            graph_id,
            &existing.to_node_id,
            &edge.id,
        ));

        node::get_node_tx(txn, graph_id, &edge.from_node_id)
            .map_err(|_| GraphError::EndpointMissing(edge.from_node_id.clone()))?;
        node::get_node_tx(txn, graph_id, &edge.to_node_id)
            .map_err(|_| GraphError::EndpointMissing(edge.to_node_id.clone()))?;

        txn.set(
            &keys::out_edge_index_key(graph_id, &edge.from_node_id, &edge.id),
            edge.id.as_bytes(),
        );
        txn.set(
            &keys::in_edge_index_key(graph_id, &edge.to_node_id, &edge.id),
            edge.id.as_bytes(),
        );
    }

    // An update whose expiry already passed becomes a delete.
    if !set_edge_record(txn, graph_id, edge)? {
        return delete_edge_tx(txn, graph_id, &edge.id);
    }

    Ok(())
}

pub(crate) fn delete_edge_tx(txn: &mut WriteTxn<'_>, graph_id: &str, edge_id: &str) -> Result<()> {
    let edge = get_edge_tx(txn, graph_id, edge_id)?;

    txn.delete(&keys::edge_key(graph_id, edge_id));
    txn.delete(&keys::edge_type_index_key(
        graph_id,
        &edge.edge_type,
        edge_id,
    ));
    txn.delete(&keys::out_edge_index_key(
        graph_id,
        &edge.from_node_id,
        edge_id,
    ));
    txn.delete(&keys::in_edge_index_key(graph_id, &edge.to_node_id, edge_id));

    Ok(())
}
