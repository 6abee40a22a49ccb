//! Demo producer client: sends a timestamped payload to the relay every
//! second and reads back the echo.
//!
//! Run with a relay listening on the default port:
//!
//! ```sh
//! cargo run -p relayd --example producer
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use futures::{SinkExt, StreamExt};
use rand::Rng;
use serde_json::{Value, json};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser, Debug)]
#[command(name = "producer", about = "Demo relay producer client")]
struct Cli {
    /// Producer endpoint to connect to.
    #[arg(long, default_value = "ws://127.0.0.1:8000/ws/producer")]
    url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let (mut ws, _) = connect_async(&args.url)
        .await
        .with_context(|| format!("failed to connect to {}", args.url))?;

    loop {
        let payload = json!({
            "timestamp": chrono::Local::now().to_string(),
            "value": rand::rng().random_range(0..=100),
        });
        let text = payload.to_string();
        ws.send(Message::text(text.clone())).await?;
        println!("-> payload_sent :: {text}");

        // The relay echoes each accepted payload before processing the
        // next one; read it so the stream stays in lockstep.
        let echo = ws
            .next()
            .await
            .context("websocket unexpectedly closed!")??;
        let _: Value = serde_json::from_str(echo.to_text()?)?;

        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
