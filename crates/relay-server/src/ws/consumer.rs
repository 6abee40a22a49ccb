//! Consumer endpoint: delivers messages from the relay buffer to the
//! connected client, one dequeue per send.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::metrics::{RELAY_BUFFER_DEPTH, RELAY_DELIVERED_TOTAL, WS_SESSION_ERRORS_TOTAL};
use crate::server::AppState;
use crate::ws::{Role, SessionError};

/// GET /ws/consumer — upgrade and run the delivery loop.
pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.max_message_size(state.max_message_size)
        .on_upgrade(move |socket| run(socket, state))
}

async fn run(socket: WebSocket, state: AppState) {
    let session_id = format!("cons_{}", Uuid::now_v7().simple());
    let _guard = state.gauges.enter(Role::Consumer);
    info!(session_id, "consumer connected");

    match session_loop(socket, &state).await {
        Ok(()) => debug!(session_id, "consumer session stopped for shutdown"),
        Err(err) if err.is_clean() => info!(session_id, "consumer dropped connection"),
        Err(err) => {
            warn!(session_id, error = %err, "consumer session ended");
            counter!(WS_SESSION_ERRORS_TOTAL, "role" => "consumer", "kind" => err.kind())
                .increment(1);
        }
    }
}

/// ACCEPTED → LOOPING → (DISCONNECTED | ERRORED).
///
/// The socket is split so the loop notices a client close even while
/// suspended on an empty buffer; a consumer waiting for messages may
/// otherwise park forever on a dead connection. There is no timeout on
/// the buffer wait itself — waiting indefinitely is intentional.
async fn session_loop(socket: WebSocket, state: &AppState) -> Result<(), SessionError> {
    let shutdown = state.shutdown.token();
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            () = shutdown.cancelled() => return Ok(()),
            frame = stream.next() => match frame {
                None | Some(Ok(Message::Close(_))) => return Err(SessionError::Disconnected),
                Some(Err(err)) => return Err(SessionError::Transport(err)),
                // Consumers are not expected to send anything after the
                // handshake; ignore pings and stray chatter.
                Some(Ok(_)) => {}
            },
            message = state.buffer.dequeue() => {
                let text = serde_json::to_string(&message)
                    .map_err(|err| SessionError::MalformedPayload(err.to_string()))?;
                // If this send fails the dequeued message is dropped, not
                // requeued: at-most-once delivery, a known consequence of
                // the pull-then-push loop.
                sink.send(Message::Text(text.into())).await?;
                state.buffer.mark_delivered();
                counter!(RELAY_DELIVERED_TOTAL).increment(1);
                gauge!(RELAY_BUFFER_DEPTH).set(state.buffer.depth() as f64);
            }
        }
    }
}
