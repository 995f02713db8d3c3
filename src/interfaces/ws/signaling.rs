//! WebSocket handler for signaling clients
//!
//! Clients connect to `ws://<host>:<port>/socket?callerId=<identity>`.
//! The identity is checked before the upgrade; a socket is only opened for
//! an authenticated caller.

use std::collections::HashMap;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::select;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::{ConnectionRegistry, SharedSessionRouter};
use crate::domain::Identity;
use crate::shared::errors::{AuthError, ProtocolError};
use crate::shared::shutdown::ShutdownSignal;

/// State for the signaling WebSocket handler
#[derive(Clone)]
pub struct SignalingState {
    pub router: SharedSessionRouter,
    pub shutdown: ShutdownSignal,
}

/// WebSocket upgrade handler for signaling
pub async fn ws_signaling_handler(
    ws: WebSocketUpgrade,
    State(state): State<SignalingState>,
    Query(handshake): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AuthError> {
    let identity = match ConnectionRegistry::authenticate(&handshake) {
        Ok(identity) => identity,
        Err(e) => {
            warn!("Rejecting signaling connection: {}", e);
            return Err(e);
        }
    };

    info!(%identity, "New signaling WebSocket connection");
    Ok(ws.on_upgrade(move |socket| handle_signaling_socket(socket, state, identity)))
}

/// Drive one authenticated socket until it closes
async fn handle_signaling_socket(socket: WebSocket, state: SignalingState, identity: Identity) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let connection_id = state.router.connect(identity.clone(), tx).await;

    // Outgoing frames; ends once the registry drops this connection's sender.
    let writer_identity = identity.clone();
    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = sender.send(Message::Text(frame.into())).await {
                debug!(identity = %writer_identity, error = %e, "Send failed, stopping writer");
                break;
            }
        }
        let _ = sender.close().await;
    });

    loop {
        select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = state.router.handle_frame(&identity, text.as_str()).await {
                            state.router.report_protocol_error(&identity, &e);
                        }
                    }
                    Some(Ok(Message::Binary(data))) => {
                        debug!(%identity, bytes = data.len(), "Binary frame received");
                        let error = ProtocolError::UnsupportedFrame("binary");
                        state.router.report_protocol_error(&identity, &error);
                    }
                    // axum answers pings itself
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(frame))) => {
                        info!(%identity, "Close frame received: {:?}", frame);
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(%identity, "WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        debug!(%identity, "WebSocket stream ended");
                        break;
                    }
                }
            }

            _ = state.shutdown.wait() => {
                info!(%identity, "Connection closing due to server shutdown");
                break;
            }
        }
    }

    state.router.disconnect(&identity, connection_id).await;

    // The writer drains what is already queued, then closes the socket.
    if let Err(e) = send_task.await {
        warn!(%identity, "Writer task failed: {}", e);
    }

    info!(%identity, %connection_id, "Signaling WebSocket client disconnected");
}
