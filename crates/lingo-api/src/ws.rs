//! Realtime push gateway.
//!
//! The handshake is fail-open: the WebSocket transport always upgrades,
//! and only a valid bearer credential binds the connection to a user
//! identity in the registry. An unauthenticated connection stays open but
//! is never a push target, so a bad token degrades to "no realtime"
//! instead of a refused socket.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info};
use uuid::Uuid;

use lingo_core::defaults::WS_PING_INTERVAL_SECS;
use lingo_core::PushReceiver;

use crate::state::AppState;

/// `GET /ws` upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let identity = state.identify(&headers);
    ws.on_upgrade(move |socket| handle_connection(socket, state, identity))
}

async fn handle_connection(socket: WebSocket, state: AppState, identity: Option<Uuid>) {
    let (bound, mut push_rx) = match identity {
        Some(user_id) => {
            let (connection_id, rx) = state.registry.bind(user_id);
            info!(user_id = %user_id, connection_id = %connection_id, "Realtime connection bound");
            (Some((user_id, connection_id)), Some(rx))
        }
        None => {
            debug!("Unauthenticated realtime connection opened");
            (None, None)
        }
    };

    let (mut sender, mut receiver) = socket.split();

    // Forward pushed frames and keep the connection alive.
    let send_task = tokio::spawn(async move {
        let mut ping_interval =
            tokio::time::interval(std::time::Duration::from_secs(WS_PING_INTERVAL_SECS));
        loop {
            tokio::select! {
                frame = next_frame(&mut push_rx) => {
                    match frame {
                        Some(frame) => {
                            if sender.send(Message::Text(frame)).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ping_interval.tick() => {
                    if sender.send(Message::Ping(vec![])).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Drain the client side until it closes; inbound content is ignored.
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }

    if let Some((user_id, connection_id)) = bound {
        state.registry.unbind(user_id, connection_id);
        info!(user_id = %user_id, connection_id = %connection_id, "Realtime connection closed");
    } else {
        debug!("Unauthenticated realtime connection closed");
    }
}

/// Next pushed frame, or pend forever for unauthenticated connections so
/// the select loop reduces to ping keep-alive.
async fn next_frame(rx: &mut Option<PushReceiver>) -> Option<String> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
