//! WebSocket handler: relays frames between one socket and the hub.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID, registers an outbound channel with the
//! hub, and enters a `select!` loop:
//! - Incoming text messages → forwarded to the hub as-is
//! - Outbound events queued by the hub → encoded and written to the socket
//!
//! All decoding, validation, and room logic happens on the hub task, so this
//! loop holds no room state.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → hub registers the channel and queues `connected`
//! 2. Text frames → hub (binary/ping/pong ignored)
//! 3. Close, socket error, or hub shutdown → hub `Disconnect` → cleanup

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::frame::ErrorCode;
use crate::hub::Outbound;
use crate::protocol::ServerEvent;
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let max_bytes = state.config.max_message_bytes;
    ws.max_message_size(max_bytes)
        .max_frame_size(max_bytes)
        .on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for events queued by the hub.
    let (client_tx, mut client_rx) = mpsc::channel::<Outbound>(state.config.client_queue_capacity);

    if let Err(e) = state.hub.connect(client_id, client_tx).await {
        warn!(%client_id, code = e.error_code(), error = %e, "ws: hub unavailable; closing");
        return;
    }

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        if state.hub.inbound(client_id, text.as_str().to_owned()).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(event) = client_rx.recv() => {
                if send_event(&mut socket, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Err(e) = state.hub.disconnect(client_id).await {
        debug!(%client_id, error = %e, "ws: hub gone before disconnect");
    }
}

/// Encode and write one event. Encoding failures skip the event.
async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), axum::Error> {
    let text = match event.encode() {
        Ok(text) => text,
        Err(e) => {
            warn!(event = event.name(), error = %e, "ws: failed to encode event");
            return Ok(());
        }
    };
    socket.send(Message::Text(text.into())).await
}
