// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Node expiration sweeper
//!
//! A single cooperative background task wakes once per minute, collects the
//! expired slice of the chronologically ordered expiry index under one read
//! snapshot, then deletes each expired node in its own write transaction so
//! one failing deletion does not block the others. Edge records carry
//! engine-level TTLs and vanish on their own; the sweeper is load-shedding
//! and catch-up for nodes, not the only expiry path.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::Utc;
use log::{debug, warn};

use super::GraphStore;
use crate::error::Result;
use crate::keys;
use crate::model::{GraphId, NodeId};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Background TTL sweeper for a store
pub struct TtlManager {
    store: GraphStore,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TtlManager {
    /// Create a manager without starting the background task
    pub fn new(store: GraphStore) -> Self {
        Self {
            store,
            stop: None,
            handle: None,
        }
    }

    /// Start the background sweep loop
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }
        let (tx, rx) = mpsc::channel();
        let store = self.store.clone();
        let handle = std::thread::Builder::new()
            .name("ttl-sweeper".to_string())
            .spawn(move || loop {
                match rx.recv_timeout(SWEEP_INTERVAL) {
                    Err(RecvTimeoutError::Timeout) => sweep_expired_nodes(&store),
                    // Stop signal or manager dropped.
                    _ => return,
                }
            })
            .expect("failed to spawn ttl sweeper thread");
        self.stop = Some(tx);
        self.handle = Some(handle);
    }

    /// Run one sweep synchronously; intended for tests
    pub fn cleanup(&self) {
        sweep_expired_nodes(&self.store);
    }

    /// Signal the background task and wait for it to finish.
    /// A sweep in progress runs to completion.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TtlManager {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Scan the expiry index for entries at or before now and delete each
/// expired node, one write transaction per node.
fn sweep_expired_nodes(store: &GraphStore) {
    let now = keys::expiry_timestamp(Utc::now());
    let mut expired: Vec<(GraphId, NodeId)> = Vec::new();

    // Phase 1: collect under a read snapshot. Lexicographic order equals
    // chronological order, so the scan stops at the first future key.
    let collected: Result<()> = store.kvs().view(|snap| {
        for entry in snap.seek_prefix(&keys::expiry_iter_prefix()) {
            let (key, value) = entry?;
            match keys::expiry_timestamp_from_key(&key) {
                Some(ts) if ts > now.as_str() => break,
                Some(_) => {
                    if let Some(pair) = keys::resolve_expiry_entry(&key, &value) {
                        expired.push(pair);
                    }
                }
                None => continue,
            }
        }
        Ok(())
    });
    if let Err(e) = collected {
        warn!("ttl sweep: failed to scan expiry index: {}", e);
        return;
    }

    // Phase 2: delete each node in its own transaction.
    for (graph_id, node_id) in expired {
        match store.delete_node(&graph_id, &node_id) {
            Ok(()) => debug!("ttl sweep: expired node '{}' in graph '{}'", node_id, graph_id),
            Err(e) => warn!("ttl sweep: failed to delete expired node '{}': {}", node_id, e),
        }
    }
}
