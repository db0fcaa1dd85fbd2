// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graph analysis engine
//!
//! Read-only consumer of storage snapshots: traversal, path finding, cycle
//! enumeration, classification, centrality, and community detection.

mod engine;
mod louvain;
mod types;

pub use engine::GraphAnalyzer;
pub use types::{Direction, GraphStats, PathResult, TraversalOptions, TraversalResult};
