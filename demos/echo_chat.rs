//! A minimal broadcast-relay demo proving the façade boundary: every line a
//! peer sends is announced to every other connected peer. There is no login,
//! no rooms, no commands (`/quit`, `~`, `=a`, ...), just enough to show that
//! chat semantics live entirely outside the core.
//!
//! Run with `cargo run --bin parlor-demo [config.toml]`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use uuid::Uuid;

use parlor::facade::{ConnectionFactory, ConnectionHandle, ConnectionHandler, ConnectionInfo};
use parlor::{Config, TelnetServer};

type Peers = Arc<Mutex<HashMap<Uuid, mpsc::UnboundedSender<String>>>>;

struct BroadcastFactory {
    peers: Peers,
}

impl ConnectionFactory for BroadcastFactory {
    type Handler = BroadcastHandler;

    fn new_connection(&self, peer_addr: SocketAddr) -> Self::Handler {
        BroadcastHandler {
            id: Uuid::new_v4(),
            peer_addr,
            peers: self.peers.clone(),
            inbox: None,
        }
    }
}

/// One peer's view of the shared room. `inbox` carries lines broadcast by
/// other connections over to this connection's own task, which relays them
/// through its `ConnectionHandle` on the next tick, the per-task analogue
/// of a `processClients` hook draining each connection's queue.
struct BroadcastHandler {
    id: Uuid,
    peer_addr: SocketAddr,
    peers: Peers,
    inbox: Option<mpsc::UnboundedReceiver<String>>,
}

impl BroadcastHandler {
    fn broadcast(&self, text: &str) {
        let peers = self.peers.lock().unwrap();
        for (id, tx) in peers.iter() {
            if *id != self.id {
                let _ = tx.send(text.to_string());
            }
        }
    }
}

impl ConnectionHandler for BroadcastHandler {
    fn on_connect(&mut self, conn: &mut dyn ConnectionHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.peers.lock().unwrap().insert(self.id, tx);
        self.inbox = Some(rx);

        conn.send(&format!("* {} has joined the parlor.\r\n", self.peer_addr));
        self.broadcast(&format!("* {} has joined the parlor.\r\n", self.peer_addr));
        tracing::info!(peer = %self.peer_addr, "joined");
    }

    fn on_disconnect(&mut self, info: &ConnectionInfo) {
        self.peers.lock().unwrap().remove(&self.id);
        self.broadcast(&format!("* {} has left the parlor.\r\n", info.peer_addr));
        tracing::info!(peer = %info.peer_addr, "left");
    }

    fn on_line(&mut self, conn: &mut dyn ConnectionHandle, line: String) {
        let text = line.trim_end_matches(|c| c == '\r' || c == '\n');
        if text.is_empty() {
            return;
        }
        self.broadcast(&format!("{}: {}\r\n", self.peer_addr, text));
        conn.send(&format!("(you): {}\r\n", text));
    }

    fn on_char(&mut self, _conn: &mut dyn ConnectionHandle, _ch: u8) {}

    fn process_tick(&mut self, conn: &mut dyn ConnectionHandle) {
        if let Some(inbox) = self.inbox.as_mut() {
            while let Ok(text) = inbox.try_recv() {
                conn.send(&text);
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path).unwrap_or_else(|e| {
            eprintln!("failed to load {path}: {e}, using defaults");
            Config::default()
        }),
        None => Config::default(),
    };
    config.validate().expect("invalid configuration");

    parlor::logging::init_console_only(&config.logging.level);

    let server = TelnetServer::bind(&config.server)
        .await
        .expect("failed to bind listener");
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "parlor-demo listening"
    );

    let factory = BroadcastFactory {
        peers: Arc::new(Mutex::new(HashMap::new())),
    };

    if let Err(e) = parlor::serve(server, Arc::new(config.server.clone()), factory).await {
        tracing::error!("server loop exited: {e}");
    }
}
