//! Per-connection WebSocket handler.
//!
//! Each accepted socket gets its own task running [`handle_connection`]:
//!   1. Complete the WebSocket upgrade
//!   2. Register an outbound channel with the gateway and spawn a writer
//!   3. Loop: read frames → decode a command → hand it to the gateway
//!   4. On close, unregister (also on panic, via the guard)

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use imposter_directory::SessionStore;
use imposter_protocol::{Codec, ConnectionId};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::server::ServerState;
use crate::{ClientCommand, ImposterError, ServerEvent};

/// Unregisters the connection from the gateway when the handler exits.
///
/// `Drop` is synchronous, so the async unregister runs as a
/// fire-and-forget task.
struct ConnectionGuard<S: SessionStore, C: Codec> {
    conn: ConnectionId,
    state: Arc<ServerState<S, C>>,
}

impl<S: SessionStore, C: Codec> Drop for ConnectionGuard<S, C> {
    fn drop(&mut self) {
        let conn = self.conn;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.gateway.disconnect(conn).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, C>(
    stream: TcpStream,
    conn: ConnectionId,
    state: Arc<ServerState<S, C>>,
) -> Result<(), ImposterError>
where
    S: SessionStore,
    C: Codec,
{
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut frames) = ws.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    state.gateway.connect(conn, tx).await;
    let _guard = ConnectionGuard {
        conn,
        state: Arc::clone(&state),
    };

    let writer_state = Arc::clone(&state);
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match writer_state.codec.encode_text(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(%conn, error = %e, "failed to encode event");
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::text(text)).await {
                tracing::debug!(%conn, error = %e, "send failed, stopping writer");
                break;
            }
        }
        let _ = sink.close().await;
    });

    tracing::info!(%conn, "client connected");

    while let Some(frame) = frames.next().await {
        let data = match frame {
            Ok(Message::Text(text)) => text.as_str().as_bytes().to_vec(),
            Ok(Message::Binary(data)) => data.to_vec(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue, // ping/pong/raw frame
            Err(e) => {
                tracing::debug!(%conn, error = %e, "recv error");
                break;
            }
        };

        let cmd: ClientCommand = match state.codec.decode(&data) {
            Ok(cmd) => cmd,
            Err(e) => {
                tracing::debug!(%conn, error = %e, "failed to decode command");
                state
                    .gateway
                    .reply_error(conn, format!("invalid command: {e}"))
                    .await;
                continue;
            }
        };

        tracing::debug!(%conn, command = cmd.name(), "command received");
        state.gateway.handle(conn, cmd).await;
    }

    tracing::info!(%conn, "client disconnected");

    // Unregistering drops the gateway's sender, which ends the writer.
    state.gateway.disconnect(conn).await;
    let _ = writer.await;
    Ok(())
}
