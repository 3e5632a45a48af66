//! Line-delimited transport over turmoil TCP.
//!
//! The simulated counterpart of the WebSocket transport: each envelope is
//! one JSON line. A reader task reassembles lines and forwards decoded
//! events, ending the stream with exactly one
//! [`TransportEvent::Disconnected`].

use std::io;

use roomchat_client::TransportEvent;
use roomchat_proto::{
    ClientMessage, ServerMessage,
    codec::{self, LineBuffer},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf},
    sync::mpsc,
    task::JoinHandle,
};
use turmoil::net::TcpStream;

/// Inbound queue depth.
const CHANNEL_CAPACITY: usize = 64;

/// Read chunk size.
const READ_CHUNK: usize = 4096;

/// One simulated connection to the chat server.
pub struct SimTransport {
    writer: WriteHalf<TcpStream>,
    events: mpsc::Receiver<TransportEvent>,
    reader: JoinHandle<()>,
}

impl SimTransport {
    /// Connect to `addr` (`host:port` inside the simulation).
    pub async fn connect(addr: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = tokio::io::split(stream);

        let (events_tx, events) = mpsc::channel(CHANNEL_CAPACITY);
        let reader = tokio::spawn(read_loop(reader, events_tx));

        Ok(Self { writer, events, reader })
    }

    /// Write one envelope.
    pub async fn send(&mut self, message: &ClientMessage) -> io::Result<()> {
        let line =
            codec::encode_line(message).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(&line).await?;
        self.writer.flush().await
    }

    /// Next event if one is already buffered.
    pub fn try_recv(&mut self) -> Option<TransportEvent> {
        self.events.try_recv().ok()
    }

    /// Wait for the next event. `None` once the reader has finished and
    /// every event was taken.
    pub async fn recv(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }
}

impl Drop for SimTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop(mut reader: ReadHalf<TcpStream>, events: mpsc::Sender<TransportEvent>) {
    let mut buffer = LineBuffer::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    let reason = loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => break "stream ended".to_string(),
            Ok(n) => n,
            Err(e) => break format!("read failed: {e}"),
        };

        if let Err(e) = buffer.extend(&chunk[..n]) {
            break format!("framing error: {e}");
        }

        while let Some(decoded) = buffer.next_message::<ServerMessage>() {
            match decoded {
                Ok(message) => {
                    if events.send(TransportEvent::Message(message)).await.is_err() {
                        return;
                    }
                },
                Err(e) => tracing::warn!(error = %e, "dropping malformed server event"),
            }
        }
    };

    tracing::debug!(%reason, "sim transport closed");
    let _ = events.send(TransportEvent::Disconnected { reason }).await;
}
