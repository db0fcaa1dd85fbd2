// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Redis-wire command surface
//!
//! Commands arrive as `NAMESPACE.VERB arg…` over RESP; the dispatcher
//! routes them to the storage and analysis engines and formats replies.

pub mod commands;
pub mod config;
pub mod protocol;
pub mod resp;
pub mod server;

pub use commands::CommandHandler;
pub use config::ServerConfig;
pub use protocol::Reply;
pub use server::Server;
