//! WebSocket transport for the realtime gateway
//!
//! Clients connect to `GET /ws/{namespace}`. The session token is taken from
//! the `token` query parameter (the handshake authentication payload) or,
//! failing that, from the session header. Refused clients receive a
//! `connect_error` frame followed by a close frame.

use std::borrow::Cow;
use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use pd_protocol::Frame;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{ConnectError, Connection, Handshake, RealtimeServer};

/// Close code sent to clients when the server shuts down
const CLOSE_GOING_AWAY: u16 = 1001;

#[derive(Debug, Default, Deserialize)]
pub struct HandshakeQuery {
    pub token: Option<String>,
}

/// Router serving the realtime endpoint
pub fn routes(realtime: Arc<RealtimeServer>) -> Router {
    Router::new()
        .route("/ws/:namespace", get(upgrade))
        .with_state(realtime)
}

async fn upgrade(
    ws: WebSocketUpgrade,
    Path(namespace): Path<String>,
    Query(query): Query<HandshakeQuery>,
    headers: HeaderMap,
    State(realtime): State<Arc<RealtimeServer>>,
) -> Response {
    let handshake = Handshake {
        auth_token: query.token,
        headers,
    };

    match realtime.connect(&namespace, &handshake).await {
        Ok((conn, outbound)) => {
            let shutdown = realtime.shutdown_token();
            ws.on_upgrade(move |socket| drive(socket, conn, outbound, shutdown))
        }
        Err(e) => {
            tracing::debug!("Refused realtime connection to /{}: {}", namespace, e);
            ws.on_upgrade(move |socket| refuse(socket, e))
        }
    }
}

async fn refuse(mut socket: WebSocket, error: ConnectError) {
    if let Ok(text) = error.to_frame().encode() {
        let _ = socket.send(Message::Text(text)).await;
    }
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: error.close_code(),
            reason: Cow::Borrowed(error.reason()),
        })))
        .await;
}

/// Pump frames between the socket and the connection until either side
/// closes or the server shuts down
async fn drive(
    socket: WebSocket,
    mut conn: Connection,
    mut outbound: mpsc::Receiver<Frame>,
    shutdown: CancellationToken,
) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            Some(frame) = outbound.recv() => {
                let text = match frame.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!("Failed to encode '{}' frame: {}", frame.event, e);
                        continue;
                    }
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }

            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => conn.dispatch_text(&text).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("Socket error on {}: {}", conn.id(), e);
                    break;
                }
            },

            _ = shutdown.cancelled() => {
                let _ = sink
                    .send(Message::Close(Some(CloseFrame {
                        code: CLOSE_GOING_AWAY,
                        reason: Cow::Borrowed("server shutting down"),
                    })))
                    .await;
                break;
            }
        }
    }

    conn.close().await;
}
