//! WebSocket transport for the client.
//!
//! Provides [`ConnectedClient`] which handles socket I/O for the JSON
//! envelopes. This is a thin layer that just sends/receives messages -
//! session logic remains in the Sans-IO [`Client`](crate::Client).

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use roomchat_proto::{ClientMessage, ServerMessage, codec};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::event::TransportEvent;

/// Outbound and inbound queue depth.
const CHANNEL_CAPACITY: usize = 64;

/// How long [`ConnectedClient::close`] waits for queued messages to flush.
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Message could not be queued or encoded.
    #[error("send failed: {0}")]
    Send(String),
}

/// Handle to a live WebSocket connection.
///
/// Messages are sent/received via the channels, and an internal task
/// handles the socket I/O. The inbound channel ends with exactly one
/// [`TransportEvent::Disconnected`].
///
/// Dropping the handle aborts the task and may lose queued messages; use
/// [`close`](Self::close) to flush them first.
pub struct ConnectedClient {
    /// Outbound queue, `None` once closing.
    to_server: Option<mpsc::Sender<ClientMessage>>,
    /// Receive events from the server.
    pub from_server: mpsc::Receiver<TransportEvent>,
    /// Abort handle to stop the connection task.
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedClient {
    /// Queue a message for the server.
    pub async fn send(&self, message: ClientMessage) -> Result<(), TransportError> {
        let to_server =
            self.to_server.as_ref().ok_or_else(|| TransportError::Send("closing".into()))?;
        to_server.send(message).await.map_err(|e| TransportError::Send(e.to_string()))
    }

    /// Close gracefully: everything already queued is written, then a
    /// close frame. Inbound events are discarded meanwhile. If the socket
    /// has not finished within `grace`, the task is aborted.
    pub async fn close(mut self, grace: Duration) {
        self.to_server = None;

        let from_server = &mut self.from_server;
        let drained = tokio::time::timeout(grace, async {
            while from_server.recv().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            tracing::debug!(?grace, "websocket did not close in time, aborting");
        }
    }

    /// Stop the connection immediately.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for ConnectedClient {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}

/// Connect to a chat server over WebSocket (`ws://host:port/path`).
///
/// Returns once the WebSocket handshake completes, or fails with
/// [`TransportError::Connection`] if it has not completed within `timeout`.
pub async fn connect(url: &str, timeout: Duration) -> Result<ConnectedClient, TransportError> {
    let (stream, _response) = tokio::time::timeout(timeout, connect_async(url))
        .await
        .map_err(|_| TransportError::Connection(format!("no handshake within {timeout:?}")))?
        .map_err(|e| TransportError::Connection(e.to_string()))?;

    let (to_server_tx, to_server_rx) = mpsc::channel::<ClientMessage>(CHANNEL_CAPACITY);
    let (from_server_tx, from_server_rx) = mpsc::channel::<TransportEvent>(CHANNEL_CAPACITY);

    let handle = tokio::spawn(run_connection(stream, to_server_rx, from_server_tx));

    Ok(ConnectedClient {
        to_server: Some(to_server_tx),
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    })
}

/// Run the connection, bridging between channels and the socket.
async fn run_connection<S>(
    stream: S,
    mut to_server: mpsc::Receiver<ClientMessage>,
    from_server: mpsc::Sender<TransportEvent>,
) where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
        + futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
        + Unpin,
{
    let (mut write, mut read) = stream.split();

    let reason = loop {
        tokio::select! {
            outbound = to_server.recv() => {
                let Some(message) = outbound else {
                    let _ = write.send(Message::Close(None)).await;
                    break "closed by client".to_string();
                };
                let text = match codec::encode(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(
                            event = message.event_name(),
                            error = %e,
                            "dropping unencodable message"
                        );
                        continue;
                    },
                };
                if let Err(e) = write.send(Message::text(text)).await {
                    break format!("write failed: {e}");
                }
            },
            inbound = read.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match codec::decode::<ServerMessage>(text.as_str()) {
                            Ok(event) => {
                                let delivered =
                                    from_server.send(TransportEvent::Message(event)).await;
                                if delivered.is_err() {
                                    break "receiver dropped".to_string();
                                }
                            },
                            Err(e) => {
                                tracing::warn!(error = %e, "dropping malformed server event");
                            },
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        break frame.map_or_else(
                            || "server closed".to_string(),
                            |f| format!("server closed: {}", f.reason.as_str()),
                        );
                    },
                    // Ping/pong are answered by tungstenite; binary is not part of the protocol
                    Some(Ok(_)) => {},
                    Some(Err(e)) => break format!("read failed: {e}"),
                    None => break "stream ended".to_string(),
                }
            },
        }
    };

    tracing::debug!(%reason, "websocket closed");
    let _ = from_server.send(TransportEvent::Disconnected { reason }).await;
}
