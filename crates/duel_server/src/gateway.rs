//! WebSocket transport for the session.
//!
//! Each connection gets a reader loop that decodes frames into session
//! commands and a writer task that drains the player's outbound queue
//! onto the socket.

use crate::actor::SessionHandle;
use crate::player::{ChannelSink, ConnectionId};
use crate::protocol::{self, ServerEvent};
use crate::session::SessionError;
use crate::state::AppState;
use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::Response,
};
use futures::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, error, info, instrument, warn};

/// Axum handler that upgrades `GET /ws` to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drives one connection from upgrade to close.
#[instrument(name = "ws_connection", skip_all, fields(connection_id))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let id = state.next_connection_id();
    tracing::Span::current().record("connection_id", tracing::field::display(id));
    info!("New WebSocket connection");

    let (mut socket_tx, socket_rx) = socket.split();
    let (event_tx, event_rx) = mpsc::channel(*state.config.outbound_buffer());

    match state
        .session
        .join(id, Box::new(ChannelSink::new(event_tx)))
        .await
    {
        Ok(Ok(seat)) => info!(?seat, mark = %seat.mark(), "Connection seated"),
        Ok(Err(SessionError::Full)) => {
            warn!("Session full, refusing connection");
            let frame = CloseFrame {
                code: close_code::AGAIN,
                reason: "session full".into(),
            };
            if let Err(e) = socket_tx.send(Message::Close(Some(frame))).await {
                debug!(error = %e, "Failed to send close frame");
            }
            return;
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Join rejected");
            return;
        }
        Err(e) => {
            error!(error = %e, "Cannot seat connection");
            return;
        }
    }

    let writer = tokio::spawn(write_events(socket_tx, event_rx).in_current_span());

    read_commands(id, socket_rx, &state.session).await;

    if let Err(e) = state.session.disconnect(id).await {
        error!(error = %e, "Failed to report disconnect");
    }
    // The session drops this player's sink on disconnect, which ends the writer.
    if let Err(e) = writer.await {
        error!(error = %e, "Writer task failed");
    }
    info!("WebSocket connection closed");
}

/// Reads frames until the client closes or the socket errors.
async fn read_commands(
    id: ConnectionId,
    mut socket_rx: SplitStream<WebSocket>,
    session: &SessionHandle,
) {
    while let Some(frame) = socket_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => match protocol::decode(text.as_str()) {
                Ok(command) => {
                    debug!(?command, "Received command");
                    if session.dispatch(id, command).await.is_err() {
                        error!("Session task gone, dropping connection");
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Ignoring undecodable message"),
            },
            Ok(Message::Binary(_)) => debug!("Ignoring binary frame"),
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!("Client sent close frame");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Error receiving from client WebSocket");
                break;
            }
        }
    }
}

/// Serializes queued events onto the socket until the queue closes.
async fn write_events(
    mut socket_tx: SplitSink<WebSocket, Message>,
    mut events: mpsc::Receiver<ServerEvent>,
) {
    while let Some(event) = events.recv().await {
        let text = match protocol::encode(&event) {
            Ok(text) => text,
            Err(e) => {
                error!(kind = event.kind(), error = %e, "Failed to encode event");
                continue;
            }
        };
        if let Err(e) = socket_tx.send(Message::Text(text.into())).await {
            warn!(kind = event.kind(), error = %e, "Failed to write event, stopping writer");
            return;
        }
    }
    if let Err(e) = socket_tx.close().await {
        debug!(error = %e, "Socket already closed");
    }
}
