// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! PathGraph server entry point

use std::path::PathBuf;

use clap::Parser;
use log::{error, info};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use pathgraph::redis::{Server, ServerConfig};
use pathgraph::{GraphStore, TtlManager};

#[derive(Parser)]
#[command(name = "pathgraph-server", version, about = "PathGraph Redis-protocol server")]
struct Cli {
    /// Listen address; defaults to $REDIS_ADDR, then :6379
    #[arg(long)]
    addr: Option<String>,

    /// Data directory for storage
    #[arg(long, default_value = "./data")]
    data: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let address = cli
        .addr
        .or_else(|| std::env::var("REDIS_ADDR").ok())
        .unwrap_or_else(|| ":6379".to_string());

    let store = GraphStore::open(&cli.data)?;
    info!("data directory: {}", cli.data.display());

    let mut ttl = TtlManager::new(store.clone());
    ttl.start();

    // Graceful shutdown: stop the sweeper, close the store, exit.
    let shutdown_store = store.clone();
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            info!("received signal {}, shutting down", signal);
            ttl.stop();
            if let Err(e) = shutdown_store.close() {
                error!("failed to close store: {}", e);
            }
            std::process::exit(0);
        }
    });

    let config = ServerConfig {
        address,
        debug: cli.debug,
    };
    let server = Server::new(config, store);
    server.serve()?;
    Ok(())
}
