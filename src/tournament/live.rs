//! Per-category change notifications.
//!
//! Public pages open a WebSocket here and reload whenever a message for
//! their category arrives. This is deliberately coarse: the client re-reads
//! the full view rather than patching it, so a dropped or reordered message
//! costs nothing beyond a slightly later refresh.

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocketUpgrade},
    },
    response::Response,
};
use tokio::sync::broadcast::error::RecvError;

use crate::{state::AppState, tournament::Category};

/// Scheme for the client-side WebSocket URL; deployments sit behind TLS.
pub const WEBSOCKET_SCHEME: &str = if cfg!(debug_assertions) {
    "ws://"
} else {
    "wss://"
};

pub async fn category_updates(
    Path(category): Path<Category>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |mut socket| async move {
        let mut rx = state.msgs.subscribe();

        loop {
            let msg = match rx.recv().await {
                Ok(msg) => msg,
                // A slow viewer only misses intermediate updates; the next
                // message still triggers a full re-read.
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            };

            if msg.category != category {
                continue;
            }

            let payload = serde_json::to_string(&msg.inner).unwrap();
            if socket.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    })
}
