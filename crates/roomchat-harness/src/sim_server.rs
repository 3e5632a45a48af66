//! Simulation server wrapper for testing with turmoil.
//!
//! `SimServer` wraps [`ChatServer`] for integration with turmoil's
//! deterministic simulation. It uses [`SimEnv`] for timestamps, turmoil TCP
//! for networking, and one reader task per connection feeding a single
//! event queue, so the sans-IO core only ever sees one event at a time.

use std::{
    collections::{HashMap, VecDeque},
    io,
    sync::{Arc, Mutex},
};

use roomchat_proto::{
    ClientMessage, ServerMessage,
    codec::{self, LineBuffer},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf},
    sync::mpsc,
    task::JoinHandle,
};
use turmoil::net::{TcpListener, TcpStream};

use crate::{ChatServer, ServerAction, ServerConfig, ServerEvent, ServerSnapshot, SimEnv};

/// Inbound event queue depth.
const CHANNEL_CAPACITY: usize = 256;

/// Read chunk size.
const READ_CHUNK: usize = 4096;

/// Out-of-band commands for a running server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    DropConnections,
}

/// Connection state for a simulated connection.
struct SimConnection {
    /// Write half for sending envelopes
    writer: WriteHalf<TcpStream>,
    /// Task reading the other half
    reader: JoinHandle<()>,
}

/// Handle for observing and disturbing a running [`SimServer`].
///
/// Clones share the same server. Safe to use from other simulated hosts,
/// which all run on the simulation thread.
#[derive(Clone)]
pub struct ServerHandle {
    control: mpsc::UnboundedSender<Control>,
    snapshot: Arc<Mutex<ServerSnapshot>>,
}

impl ServerHandle {
    /// Close every open connection as if the network dropped them.
    pub fn drop_connections(&self) {
        if self.control.send(Control::DropConnections).is_err() {
            tracing::debug!("server gone, nothing to drop");
        }
    }

    /// Membership table as of the last processed event.
    pub fn snapshot(&self) -> ServerSnapshot {
        match self.snapshot.lock() {
            Ok(snapshot) => snapshot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Rendezvous for a [`ServerHandle`] created inside a turmoil host.
///
/// The host fills the slot once its server is bound; clients read it
/// lazily, since they may start before the host does.
#[derive(Clone, Default)]
pub struct ServerSlot(Arc<Mutex<Option<ServerHandle>>>);

impl ServerSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the handle, replacing any previous one.
    pub fn fill(&self, handle: ServerHandle) {
        match self.0.lock() {
            Ok(mut slot) => *slot = Some(handle),
            Err(poisoned) => *poisoned.into_inner() = Some(handle),
        }
    }

    /// The published handle, if the server is up.
    pub fn get(&self) -> Option<ServerHandle> {
        match self.0.lock() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Simulation server for testing with turmoil.
///
/// Bind it inside a turmoil host and call [`SimServer::run`]; the host
/// then serves until the simulation ends.
pub struct SimServer {
    server: ChatServer<SimEnv>,
    listener: TcpListener,
    connections: HashMap<u64, SimConnection>,
    next_session: u64,
    events_tx: mpsc::Sender<ServerEvent>,
    events: mpsc::Receiver<ServerEvent>,
    control_tx: mpsc::UnboundedSender<Control>,
    control: mpsc::UnboundedReceiver<Control>,
    snapshot: Arc<Mutex<ServerSnapshot>>,
}

impl SimServer {
    /// Create and bind a new simulation server.
    pub async fn bind(address: &str) -> io::Result<Self> {
        Self::bind_with_config(address, ServerConfig::default()).await
    }

    /// Create and bind a new simulation server with custom config.
    pub async fn bind_with_config(address: &str, config: ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        let (events_tx, events) = mpsc::channel(CHANNEL_CAPACITY);
        let (control_tx, control) = mpsc::unbounded_channel();

        Ok(Self {
            server: ChatServer::new(SimEnv::new(), config),
            listener,
            connections: HashMap::new(),
            next_session: 1,
            events_tx,
            events,
            control_tx,
            control,
            snapshot: Arc::new(Mutex::new(ServerSnapshot::default())),
        })
    }

    /// Handle for tests running on other hosts.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle { control: self.control_tx.clone(), snapshot: Arc::clone(&self.snapshot) }
    }

    /// Serve connections forever.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails.
    pub async fn run(mut self) -> io::Result<()> {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted?;
                    tracing::debug!(%peer, "accepted connection");
                    self.accept(stream).await;
                },
                Some(event) = self.events.recv() => self.process(event).await,
                Some(command) = self.control.recv() => match command {
                    Control::DropConnections => self.drop_connections().await,
                },
            }
        }
    }

    /// Number of open connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Underlying server for test assertions.
    pub fn server(&self) -> &ChatServer<SimEnv> {
        &self.server
    }

    async fn accept(&mut self, stream: TcpStream) {
        let session = self.next_session;
        self.next_session += 1;

        let (reader, writer) = tokio::io::split(stream);
        let reader = tokio::spawn(read_session(session, reader, self.events_tx.clone()));
        self.connections.insert(session, SimConnection { writer, reader });

        self.process(ServerEvent::Connected { session }).await;
    }

    /// Run an event through the server and write out its actions.
    ///
    /// Connections whose writes fail are closed, and their disconnects are
    /// processed in the same pass.
    async fn process(&mut self, event: ServerEvent) {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            if let ServerEvent::Disconnected { session } = event {
                self.forget(session).await;
            }

            for action in self.server.handle(event) {
                let ServerAction::Send { session, message } = action;
                if let Err(e) = self.write(session, &message).await {
                    tracing::debug!(session, error = %e, "write failed, closing connection");
                    self.forget(session).await;
                    queue.push_back(ServerEvent::Disconnected { session });
                }
            }
        }

        self.publish_snapshot();
    }

    async fn drop_connections(&mut self) {
        let mut sessions: Vec<u64> = self.connections.keys().copied().collect();
        sessions.sort_unstable();
        tracing::info!(count = sessions.len(), "dropping all connections");

        for session in sessions {
            self.process(ServerEvent::Disconnected { session }).await;
        }
    }

    /// Write one envelope. Writes to closed connections are skipped.
    async fn write(&mut self, session: u64, message: &ServerMessage) -> io::Result<()> {
        let Some(connection) = self.connections.get_mut(&session) else {
            return Ok(());
        };
        let line =
            codec::encode_line(message).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        connection.writer.write_all(&line).await?;
        connection.writer.flush().await
    }

    /// Close the socket for a session, if it is still open.
    async fn forget(&mut self, session: u64) {
        if let Some(mut connection) = self.connections.remove(&session) {
            connection.reader.abort();
            let _ = connection.writer.shutdown().await;
        }
    }

    fn publish_snapshot(&self) {
        let snapshot = self.server.snapshot();
        match self.snapshot.lock() {
            Ok(mut shared) => *shared = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }
}

/// Read envelopes from one connection until it closes.
async fn read_session(
    session: u64,
    mut reader: ReadHalf<TcpStream>,
    events: mpsc::Sender<ServerEvent>,
) {
    let mut buffer = LineBuffer::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };

        if let Err(e) = buffer.extend(&chunk[..n]) {
            tracing::warn!(session, error = %e, "closing connection");
            break;
        }

        while let Some(decoded) = buffer.next_message::<ClientMessage>() {
            match decoded {
                Ok(message) => {
                    if events.send(ServerEvent::Received { session, message }).await.is_err() {
                        return;
                    }
                },
                Err(e) => tracing::warn!(session, error = %e, "dropping malformed client message"),
            }
        }
    }

    let _ = events.send(ServerEvent::Disconnected { session }).await;
}
