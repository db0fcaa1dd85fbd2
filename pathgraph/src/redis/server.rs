// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! TCP server loop
//!
//! Accepts any number of client connections, each served on its own
//! thread. Commands on one connection run serially; across connections
//! they run in parallel. Handler errors become `-ERR <message>` replies;
//! the connection stays open until the client goes away.

use std::io::{BufReader, BufWriter, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use log::{debug, info, warn};

use crate::error::Result;
use crate::redis::commands::CommandHandler;
use crate::redis::config::ServerConfig;
use crate::redis::protocol::Reply;
use crate::redis::resp;
use crate::storage::GraphStore;

/// Redis-protocol server for a graph store
pub struct Server {
    config: ServerConfig,
    handler: Arc<CommandHandler>,
}

impl Server {
    pub fn new(config: ServerConfig, store: GraphStore) -> Self {
        Self {
            config,
            handler: Arc::new(CommandHandler::new(store)),
        }
    }

    /// Bind and serve until the process exits
    pub fn serve(&self) -> Result<()> {
        let address = normalize_address(&self.config.address);
        let listener = TcpListener::bind(&address)?;
        info!("pathgraph server listening on {}", address);

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let handler = Arc::clone(&self.handler);
                    thread::spawn(move || handle_connection(stream, handler));
                }
                Err(e) => warn!("accept error: {}", e),
            }
        }
        Ok(())
    }
}

/// A bare `:port` binds every interface
fn normalize_address(address: &str) -> String {
    if address.starts_with(':') {
        format!("0.0.0.0{address}")
    } else {
        address.to_string()
    }
}

fn handle_connection(stream: TcpStream, handler: Arc<CommandHandler>) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    debug!("client connected: {}", peer);

    let reader = match stream.try_clone() {
        Ok(clone) => clone,
        Err(e) => {
            warn!("failed to clone stream for {}: {}", peer, e);
            return;
        }
    };
    let mut reader = BufReader::new(reader);
    let mut writer = BufWriter::new(stream);

    loop {
        let args = match resp::read_command(&mut reader) {
            Ok(Some(args)) => args,
            Ok(None) => break,
            Err(e) => {
                debug!("protocol error from {}: {}", peer, e);
                let _ = resp::write_reply(&mut writer, &Reply::Error(format!("ERR {e}")));
                let _ = writer.flush();
                break;
            }
        };

        let reply = if args.is_empty() {
            Reply::Error("ERR empty command".to_string())
        } else {
            let command = args[0].to_uppercase();
            match handler.handle(&command, &args[1..]) {
                Ok(reply) => reply,
                Err(e) => Reply::Error(format!("ERR {e}")),
            }
        };

        if resp::write_reply(&mut writer, &reply).is_err() || writer.flush().is_err() {
            break;
        }
    }

    debug!("client disconnected: {}", peer);
}
