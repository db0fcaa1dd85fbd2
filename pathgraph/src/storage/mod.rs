// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage engine
//!
//! `GraphStore` encodes graphs, nodes, edges, and their secondary indexes
//! into keys of the ordered KV substrate, enforces referential integrity,
//! and cascades deletes. Every public operation runs in a single KVS view
//! or update; read paths are also available through `StoreSnapshot` so the
//! analysis engine can hold one consistent view for a whole computation.

mod edge;
mod graph;
mod node;
mod ttl;

pub use ttl::TtlManager;

use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::error::Result;
use crate::keys;
use crate::kvs::{Kvs, Snapshot};

/// Persistent graph store over the ordered KV substrate
#[derive(Clone)]
pub struct GraphStore {
    kvs: Arc<Kvs>,
}

impl GraphStore {
    /// Open or create a store in the given data directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let kvs = Arc::new(Kvs::open(path)?);
        Ok(Self { kvs })
    }

    /// Access the underlying substrate
    pub fn kvs(&self) -> &Arc<Kvs> {
        &self.kvs
    }

    pub fn is_open(&self) -> bool {
        self.kvs.is_open()
    }

    /// Flush and mark the store closed
    pub fn close(&self) -> Result<()> {
        self.kvs.close()
    }

    /// Take a consistent read view of the store
    pub fn snapshot(&self) -> Result<StoreSnapshot<'_>> {
        Ok(StoreSnapshot {
            snap: self.kvs.snapshot()?,
        })
    }

    /// Count nodes in a graph with a key-only scan
    pub fn count_nodes(&self, graph_id: &str) -> Result<usize> {
        self.snapshot()?.count_nodes(graph_id)
    }

    /// Count edges in a graph with a key-only scan
    pub fn count_edges(&self, graph_id: &str) -> Result<usize> {
        self.snapshot()?.count_edges(graph_id)
    }

    /// Write a point-in-time backup to `<dest>/backup.db`
    pub fn backup(&self, dest: impl AsRef<Path>) -> Result<u64> {
        let backup_file = dest.as_ref().join("backup.db");
        let mut file = std::fs::File::create(&backup_file)?;
        let written = self.kvs.backup(&mut file)?;
        info!("backup created at {} ({} bytes)", backup_file.display(), written);
        Ok(written)
    }
}

/// Consistent read view over the store
pub struct StoreSnapshot<'a> {
    snap: Snapshot<'a>,
}

impl StoreSnapshot<'_> {
    /// Count nodes in a graph with a key-only scan
    pub fn count_nodes(&self, graph_id: &str) -> Result<usize> {
        self.snap.count_prefix(&keys::node_iter_prefix(graph_id))
    }

    /// Count edges in a graph with a key-only scan
    pub fn count_edges(&self, graph_id: &str) -> Result<usize> {
        self.snap.count_prefix(&keys::edge_iter_prefix(graph_id))
    }
}
