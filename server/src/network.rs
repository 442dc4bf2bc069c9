//! WebSocket transport layer and connection bookkeeping
//!
//! Accepts connections, parses inbound JSON frames into [`ClientEvent`]s
//! and delivers them to the session controller in per-connection order.
//! Outbound traffic goes through a per-connection unbounded queue drained
//! by a dedicated writer task, so `emit_to` and `broadcast` never block on
//! a slow client: a stalled connection backs up its own queue only.

use crate::questions::QuestionSet;
use crate::registry::{ConnectionId, PlayerRegistry};
use crate::session::SessionController;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientEvent, ServerEvent};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::Message;

/// Thread-safe roster of live connections and their outbound queues.
///
/// This is the transport layer's own bookkeeping; the player registry
/// tracks which player holds which connection, while this map answers
/// "who is addressable right now" for unicasts and broadcasts.
pub struct ConnectionRegistry {
    senders: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<Message>>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a new connection's outbound queue and allocates its id.
    pub async fn add(&self, sender: mpsc::UnboundedSender<Message>) -> ConnectionId {
        let conn = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.senders.write().await.insert(conn, sender);
        conn
    }

    /// Drops a connection's outbound queue; its writer task drains and
    /// exits once the queue empties.
    pub async fn remove(&self, conn: ConnectionId) {
        self.senders.write().await.remove(&conn);
    }

    /// Queues an event for one connection. Best-effort: unknown or
    /// already-closed connections are skipped.
    pub async fn emit_to(&self, conn: ConnectionId, event: &ServerEvent) {
        let Some(payload) = encode(event) else { return };
        let senders = self.senders.read().await;
        if let Some(sender) = senders.get(&conn) {
            if sender.send(Message::Text(payload)).is_err() {
                debug!("Connection {} is gone; dropping unicast", conn);
            }
        }
    }

    /// Queues an event for every live connection. The payload is encoded
    /// once and cloned per connection.
    pub async fn broadcast(&self, event: &ServerEvent) {
        let Some(payload) = encode(event) else { return };
        let senders = self.senders.read().await;
        for (conn, sender) in senders.iter() {
            if sender.send(Message::Text(payload.clone())).is_err() {
                debug!("Connection {} is gone; dropping broadcast", conn);
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.senders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.senders.read().await.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(payload) => Some(payload),
        Err(err) => {
            error!("Failed to encode outbound event: {}", err);
            None
        }
    }
}

/// The trivia session server: accept loop plus per-connection tasks.
pub struct Server {
    listener: TcpListener,
    controller: Arc<SessionController>,
    connections: Arc<ConnectionRegistry>,
}

impl Server {
    /// Binds the listener and wires up the session core. Use port 0 to let
    /// the OS pick a free port, then read it back via [`Server::local_addr`].
    pub async fn bind(addr: &str, questions: Arc<QuestionSet>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let connections = Arc::new(ConnectionRegistry::new());
        let registry = Arc::new(PlayerRegistry::new(Arc::clone(&questions)));
        let controller = Arc::new(SessionController::new(
            registry,
            questions,
            Arc::clone(&connections),
        ));

        Ok(Self {
            listener,
            controller,
            connections,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop forever, spawning one task per connection.
    pub async fn run(self) -> std::io::Result<()> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            let controller = Arc::clone(&self.controller);
            let connections = Arc::clone(&self.connections);

            tokio::spawn(async move {
                if let Err(err) = handle_connection(stream, addr, controller, connections).await {
                    debug!("Connection from {} ended: {}", addr, err);
                }
            });
        }
    }
}

/// Services one WebSocket connection: handshake, writer task, then the
/// reader loop until the peer goes away.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    controller: Arc<SessionController>,
    connections: Arc<ConnectionRegistry>,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let websocket = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut stream) = websocket.split();

    let (sender, mut outbound) = mpsc::unbounded_channel::<Message>();
    let conn = connections.add(sender).await;
    debug!("Connection {} opened from {}", conn, addr);

    // Writer task: drains the outbound queue into the sink. Exits when the
    // queue's sender is dropped out of the connection registry or the peer
    // stops accepting frames.
    tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let mut state = controller.handle_connect(conn);

    while let Some(frame) = stream.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(err) => {
                debug!("Read error on connection {}: {}", conn, err);
                break;
            }
        };

        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => controller.handle_event(conn, &mut state, event).await,
                Err(err) => {
                    warn!("Dropping malformed frame from connection {}: {}", conn, err);
                }
            },
            Message::Close(_) => break,
            // Ping/pong are answered by tungstenite; binary frames are not
            // part of the protocol.
            _ => {}
        }
    }

    // Unregister from the broadcast roster before announcing the
    // departure, so the dead connection is not broadcast to.
    connections.remove(conn).await;
    controller.handle_disconnect(conn, &mut state).await;
    debug!("Connection {} from {} closed", conn, addr);

    Ok(())
}
