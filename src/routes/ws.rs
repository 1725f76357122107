//! The real-time channel.
//!
//! One WebSocket per client. Inbound frames are handled sequentially per
//! connection, which preserves the per-connection event order the relay
//! guarantees; outbound frames arrive through an unbounded channel that the
//! hub pushes onto without ever awaiting.

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::events;
use crate::state::AppState;

/// Route group for the WebSocket endpoint.
pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(upgrade))
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve_connection(socket, state))
}

/// Drive one connection from upgrade to close.
async fn serve_connection(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let connection = state.hub.connect(tx);
    tracing::debug!(%connection, "websocket connected");

    // Outbound pump: hub → socket. Ends when the hub drops the sender on
    // disconnect or the peer stops reading.
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Inbound loop: frames from this connection are applied one at a time.
    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(raw) => events::dispatch(&state, connection, raw.as_str()),
            Message::Close(_) => break,
            // Pings are answered by axum; binary frames are not part of the
            // protocol and are dropped.
            _ => {}
        }
    }

    tracing::debug!(%connection, "websocket closed");
    events::handle_disconnect(&state, connection);
    writer.abort();
}
