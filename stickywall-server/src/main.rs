//! `stickywall-server`: development backend for Sticky Wall.
//!
//! An axum WebSocket server holding accounts and task collections in
//! memory.
//!
//! # Usage
//!
//! ```bash
//! # Run on the default address 127.0.0.1:9400
//! cargo run --bin stickywall-server
//!
//! # Run on a custom address
//! cargo run --bin stickywall-server -- --bind 0.0.0.0:8080
//! ```

use std::sync::Arc;

use clap::Parser;
use stickywall_server::config::{ServerCliArgs, ServerConfig};
use stickywall_server::server::{self, ServerState};

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting stickywall server");

    let state = Arc::new(ServerState::with_max_frame_size(config.max_frame_size));

    match server::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    }
}
