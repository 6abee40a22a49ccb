//! Producer endpoint: ingests JSON payloads into the relay buffer and
//! echoes each accepted payload back to the sender.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use metrics::{counter, gauge};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::metrics::{RELAY_BUFFER_DEPTH, RELAY_ENQUEUED_TOTAL, WS_SESSION_ERRORS_TOTAL};
use crate::server::AppState;
use crate::ws::{Role, SessionError};

/// GET /ws/producer — upgrade and run the ingest loop.
pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.max_message_size(state.max_message_size)
        .on_upgrade(move |socket| run(socket, state))
}

async fn run(mut socket: WebSocket, state: AppState) {
    let session_id = format!("prod_{}", Uuid::now_v7().simple());
    let _guard = state.gauges.enter(Role::Producer);
    info!(session_id, "producer connected");

    match session_loop(&mut socket, &state).await {
        Ok(()) => debug!(session_id, "producer session stopped for shutdown"),
        Err(err) if err.is_clean() => info!(session_id, "producer dropped connection"),
        Err(err) => {
            warn!(session_id, error = %err, "producer session ended");
            counter!(WS_SESSION_ERRORS_TOTAL, "role" => "producer", "kind" => err.kind())
                .increment(1);
        }
    }
}

/// ACCEPTED → LOOPING → (DISCONNECTED | ERRORED).
///
/// Each accepted payload mutates the buffer exactly once and produces
/// exactly one echo to the originating producer. The echo send completes
/// before the next receive starts.
async fn session_loop(socket: &mut WebSocket, state: &AppState) -> Result<(), SessionError> {
    let shutdown = state.shutdown.token();
    loop {
        let frame = tokio::select! {
            () = shutdown.cancelled() => return Ok(()),
            frame = socket.recv() => frame,
        };
        let frame = match frame {
            None => return Err(SessionError::Disconnected),
            Some(frame) => frame?,
        };
        match frame {
            Message::Text(text) => {
                let payload: Value = serde_json::from_str(text.as_str())
                    .map_err(|err| SessionError::MalformedPayload(err.to_string()))?;
                state.buffer.enqueue(payload).await;
                counter!(RELAY_ENQUEUED_TOTAL).increment(1);
                gauge!(RELAY_BUFFER_DEPTH).set(state.buffer.depth() as f64);
                // Echo the raw accepted text — byte-for-byte what the
                // producer sent, so deep equality is trivially preserved.
                socket.send(Message::Text(text)).await?;
            }
            Message::Binary(_) => {
                return Err(SessionError::MalformedPayload(
                    "binary frame is not JSON text".into(),
                ));
            }
            Message::Close(_) => return Err(SessionError::Disconnected),
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
}
