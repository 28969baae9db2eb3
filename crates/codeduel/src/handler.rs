//! Per-connection handler: request dispatch and outbound delivery.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn a writer task that drains the connection's outbox
//!   2. Loop: receive a request → dispatch it to the session registry
//!   3. On any exit, the drop guard tells the registry the player left
//!
//! Replies and pushes both go through the outbox, so the registry lock is
//! never held across a network write.

use std::sync::Arc;

use codeduel_protocol::{ClientRequest, Codec, ServerMessage};
use codeduel_session::{Outbound, Outbox, SecretGenerator};
use codeduel_transport::{Connection, ConnectionId, Incoming, WebSocketConnection};
use tokio::sync::mpsc;

use crate::CodeduelError;
use crate::server::ServerState;

/// Drop guard that removes the connection from the registry when the
/// handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct DisconnectGuard<G: SecretGenerator> {
    conn_id: ConnectionId,
    state: Arc<ServerState<G>>,
}

impl<G: SecretGenerator> Drop for DisconnectGuard<G> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.registry.lock().await.disconnect(conn_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<G: SecretGenerator>(
    conn: WebSocketConnection,
    state: Arc<ServerState<G>>,
) -> Result<(), CodeduelError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (outbox, outbox_rx) = mpsc::unbounded_channel();
    let mut writer = tokio::spawn(write_outbound(
        Arc::clone(&conn),
        Arc::clone(&state),
        outbox_rx,
    ));
    let _guard = DisconnectGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    loop {
        let received = tokio::select! {
            received = tokio::time::timeout(state.idle_timeout, conn.recv()) => received,
            _ = &mut writer => {
                tracing::debug!(%conn_id, "closed by server");
                return Ok(());
            }
        };

        let data = match received {
            Ok(Ok(Incoming::Frame(data))) => data,
            Ok(Ok(Incoming::Closed)) => {
                tracing::info!(%conn_id, "connection closed by peer");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%conn_id, "connection idle, closing");
                break;
            }
        };

        // Anything that is not a known request ends the connection.
        let request: ClientRequest = match state.codec.decode(&data) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "undecodable request, closing");
                let _ = conn.close().await;
                break;
            }
        };

        dispatch(&state, conn_id, &outbox, request).await;
    }

    writer.abort();
    // _guard drops here → registry disconnect fires.
    Ok(())
}

/// Runs one request against the registry and queues the reply.
async fn dispatch<G: SecretGenerator>(
    state: &ServerState<G>,
    conn_id: ConnectionId,
    outbox: &Outbox,
    request: ClientRequest,
) {
    tracing::debug!(%conn_id, ?request, "request");
    let mut registry = state.registry.lock().await;

    match request {
        ClientRequest::CreateGame => {
            // Queued under the lock, so the code reaches the host before
            // anything a joiner triggers.
            let reply = match registry.create_session(conn_id, outbox.clone()) {
                Ok(code) => ServerMessage::GameCode { code },
                Err(e) => {
                    tracing::warn!(%conn_id, error = %e, "create failed");
                    ServerMessage::Error {
                        message: e.client_message(),
                    }
                }
            };
            let _ = outbox.send(Outbound::Message(reply));
        }

        ClientRequest::JoinGame { code } => {
            if let Err(e) = registry.join_session(&code, conn_id, outbox.clone()) {
                tracing::info!(%conn_id, %code, error = %e, "join rejected");
                let _ = outbox.send(Outbound::Message(ServerMessage::Error {
                    message: e.client_message(),
                }));
            }
        }

        ClientRequest::SubmitResult { result } => {
            match registry.submit_result(conn_id, result) {
                Ok(status) => {
                    tracing::debug!(%conn_id, ?status, "result accepted");
                }
                Err(e) => {
                    tracing::warn!(%conn_id, error = %e, "result rejected");
                    let _ = outbox.send(Outbound::Message(ServerMessage::Error {
                        message: e.client_message(),
                    }));
                }
            }
        }
    }
}

/// Drains the outbox onto the wire until it closes or asks to close.
async fn write_outbound<G: SecretGenerator>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<G>>,
    mut outbox_rx: mpsc::UnboundedReceiver<Outbound>,
) {
    let conn_id = conn.id();

    while let Some(outbound) = outbox_rx.recv().await {
        match outbound {
            Outbound::Message(message) => {
                let bytes = match state.codec.encode(&message) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!(%conn_id, error = %e, "encode failed");
                        continue;
                    }
                };
                if let Err(e) = conn.send(&bytes).await {
                    tracing::debug!(%conn_id, error = %e, "send failed");
                    break;
                }
            }
            Outbound::Close => {
                if let Err(e) = conn.close().await {
                    tracing::debug!(%conn_id, error = %e, "close failed");
                }
                break;
            }
        }
    }
}
