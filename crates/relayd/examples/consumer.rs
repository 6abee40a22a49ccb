//! Demo consumer client: prints the live stream of payloads relayed by
//! the server.
//!
//! Run with a relay listening on the default port:
//!
//! ```sh
//! cargo run -p relayd --example consumer
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use serde_json::Value;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser, Debug)]
#[command(name = "consumer", about = "Demo relay consumer client")]
struct Cli {
    /// Consumer endpoint to connect to.
    #[arg(long, default_value = "ws://127.0.0.1:8000/ws/consumer")]
    url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let (mut ws, _) = connect_async(&args.url)
        .await
        .with_context(|| format!("failed to connect to {}", args.url))?;

    while let Some(frame) = ws.next().await {
        match frame.context("websocket unexpectedly closed!")? {
            Message::Text(text) => {
                let payload: Value = serde_json::from_str(&text)?;
                println!("-> payload_received :: {payload}");
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    Ok(())
}
