// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Server configuration

/// Configuration for the Redis-protocol server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to; a bare `:port` binds all interfaces
    pub address: String,
    /// Verbose logging
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: ":6379".to_string(),
            debug: false,
        }
    }
}
