//! TCP server for the game wire
//!
//! Accepts client connections and manages their lifecycle. Each client gets
//! a reader loop feeding the shared inbound queue and a writer task drained
//! from a per-client channel. Uses tokio for async networking.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, ReadHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::server::protocol::{create_error, parse_message, ClientMessage, ServerMessage};
use crate::types::ConnId;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_pending_actions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_pending_actions: 64,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        use std::env;

        let host = env::var("SKIRMISH_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("SKIRMISH_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);
        let max_pending_actions = env::var("SKIRMISH_MAX_PENDING")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(64);

        Self {
            host,
            port,
            max_pending_actions,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

/// Event delivered to the dispatch loop
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub conn: ConnId,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone)]
pub enum InboundPayload {
    Message(ClientMessage),
    Disconnected,
}

/// Outbound message routed to a single connection
#[derive(Debug, Clone)]
pub struct Outbound {
    pub conn: ConnId,
    pub message: ServerMessage,
}

/// Handle to a connected client
struct ClientHandle {
    id: ConnId,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

/// Start the TCP server
///
/// Inbound messages funnel into `event_tx`; everything received on `out_rx`
/// is serialized onto the addressed client's socket. `ready_tx` reports the
/// bound address once listening (used by tests binding port 0).
pub async fn run_server(
    config: ServerConfig,
    event_tx: mpsc::Sender<InboundEvent>,
    mut out_rx: mpsc::UnboundedReceiver<Outbound>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr).await?;
    let bound = listener.local_addr()?;
    println!("[Server] listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let clients: Arc<RwLock<Vec<ClientHandle>>> = Arc::new(RwLock::new(Vec::new()));

    // Outbound dispatcher.
    {
        let clients = Arc::clone(&clients);
        tokio::spawn(async move {
            while let Some(out) = out_rx.recv().await {
                let clients = clients.read().await;
                if let Some(c) = clients.iter().find(|c| c.id == out.conn) {
                    let _ = c.tx.send(out.message);
                }
            }
        });
    }

    let mut conn_counter: ConnId = 0;

    // Accept incoming connections.
    loop {
        let (socket, peer) = listener.accept().await?;
        conn_counter += 1;
        let conn = conn_counter;
        println!("[Server] client {} connected from {}", conn, peer);

        let clients = Arc::clone(&clients);
        let event_tx = event_tx.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, conn, clients, event_tx.clone()).await {
                eprintln!("[Server] client {} error: {}", conn, e);
            }
            // The dispatch loop releases the session binding.
            let _ = event_tx
                .send(InboundEvent {
                    conn,
                    payload: InboundPayload::Disconnected,
                })
                .await;
            println!("[Server] client {} disconnected", conn);
        });
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    conn: ConnId,
    clients: Arc<RwLock<Vec<ClientHandle>>>,
    event_tx: mpsc::Sender<InboundEvent>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    // Channel to send messages to this client.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    {
        let mut clients = clients.write().await;
        clients.push(ClientHandle { id: conn, tx: tx.clone() });
    }

    // Writer task: one JSON line per message.
    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(msg) = rx.recv().await {
            buf.clear();
            if serde_json::to_writer(&mut buf, &msg).is_err() {
                continue;
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    let result = read_loop(&mut reader, conn, &tx, &event_tx).await;

    // Clean up on every exit path, including read errors, so no stale
    // handle keeps the writer alive.
    {
        let mut clients = clients.write().await;
        clients.retain(|c| c.id != conn);
    }
    drop(tx);
    let _ = write_task.await;

    result
}

/// Read newline-delimited messages until EOF or an I/O error
async fn read_loop(
    reader: &mut BufReader<ReadHalf<TcpStream>>,
    conn: ConnId,
    tx: &mpsc::UnboundedSender<ServerMessage>,
    event_tx: &mpsc::Sender<InboundEvent>,
) -> anyhow::Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            // Client closed the connection.
            return Ok(());
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_message(trimmed) {
            Ok(message) => {
                // Bounded queue: reject rather than buffer without limit.
                let event = InboundEvent {
                    conn,
                    payload: InboundPayload::Message(message),
                };
                if event_tx.try_send(event).is_err() {
                    let _ = tx.send(create_error("Action queue is full"));
                }
            }
            Err(e) => {
                let _ = tx.send(create_error(&format!("Malformed message: {}", e)));
            }
        }
    }
}
