//! # relayd
//!
//! Relay server binary — parses the CLI, initializes logging and
//! metrics, and runs the HTTP/WebSocket server until ctrl-c.

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use relay_server::config::ServerConfig;
use relay_server::server::RelayServer;
use tracing_subscriber::EnvFilter;

/// JSON relay server: fans websocket producers into one FIFO buffer and
/// drains it to websocket consumers.
#[derive(Parser, Debug)]
#[command(name = "relayd", about = "WebSocket JSON relay server")]
struct Cli {
    /// Host to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, default_value = "8000")]
    port: u16,

    /// Bound the relay buffer at this many queued messages, applying
    /// backpressure to producers. Unbounded when omitted.
    #[arg(long)]
    capacity: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let metrics = relay_server::metrics::install_recorder();

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        capacity: args.capacity,
        ..ServerConfig::default()
    };

    let server = RelayServer::new(config, metrics);
    let (addr, handle) = server.listen().await.context("Failed to bind server")?;

    match server.buffer().capacity() {
        Some(capacity) => tracing::info!("relayd listening on http://{addr} (buffer capacity {capacity})"),
        None => tracing::info!("relayd listening on http://{addr} (unbounded buffer)"),
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    server.shutdown().shutdown();
    let _ = handle.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
