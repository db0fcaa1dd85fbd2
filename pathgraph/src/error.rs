// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for storage, analysis, and command handling

use thiserror::Error;

/// Error type covering every failure the engine can surface
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("database not opened")]
    NotOpen,

    #[error("graph not found: {0}")]
    GraphNotFound(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("edge not found: {0}")]
    EdgeNotFound(String),

    /// Reserved: creates are upserts, so this is never raised by them.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("edge endpoint missing: {0}")]
    EndpointMissing(String),

    #[error("no path found from {from} to {to}")]
    NoPath { from: String, to: String },

    #[error("{0}")]
    BadArgument(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Cannot be produced by a correct implementation; fatal if observed.
    #[error("index inconsistency: {0}")]
    IndexInconsistency(String),

    #[error("storage fault: {0}")]
    Kv(#[from] sled::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GraphError {
    /// True when the error means a looked-up entity is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GraphError::GraphNotFound(_)
                | GraphError::NodeNotFound(_)
                | GraphError::EdgeNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
