//! The per-connection async task.
//!
//! Rather than one loop polling every socket in a `select()`-style readiness
//! multiplexer, each accepted connection gets its own task that owns a
//! [`Connection`] and an application [`ConnectionHandler`] for its entire
//! lifetime. A local tick drives auto-sense polling, output flushing, and
//! the `process_tick` hook; socket reads drive the parser, negotiation
//! engine, and input assembler. Per-connection ownership (one task, no
//! shared mutable state) gives the same single-writer guarantee a single
//! thread would.
//!
//! Lines and characters assembled while a connection is still negotiating
//! are held in `pending_events` rather than dispatched immediately: a peer
//! that types during the auto-sense window must still see `on_connect`
//! before its first `on_line`/`on_char`, matching the original's model of
//! negotiating clients accumulating input that `processClients` only
//! drains once they're promoted.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::encoding;
use crate::facade::{ConnectionHandle, ConnectionHandler, ConnectionInfo};
use crate::input::InboundEvent;
use crate::session::Connection;

/// Bytes read from the socket per `read()` call.
const READ_CHUNK: usize = 2048;

/// The live view of a connection handed to application callbacks while its
/// task still owns the socket.
struct TaskHandle<'a> {
    conn: &'a mut Connection,
    disconnect_requested: bool,
}

impl ConnectionHandle for TaskHandle<'_> {
    fn send(&mut self, text: &str) {
        let encoded = encoding::encode_for_client(text);
        if encoded.had_errors {
            warn!(
                "unmappable character(s) dropped sending to {}",
                self.conn.peer_addr
            );
        }
        self.conn.send(&encoded.bytes);
    }

    fn disconnect(&mut self) {
        self.disconnect_requested = true;
    }

    fn set_character_mode(&mut self, enabled: bool) {
        self.conn.set_character_mode(enabled);
    }

    fn set_ansi_mode(&mut self, enabled: bool) {
        self.conn.set_ansi_capable(enabled);
    }

    fn addrport(&self) -> String {
        self.conn.peer_addr.to_string()
    }

    fn is_connected(&self) -> bool {
        !self.disconnect_requested && !self.conn.is_kicked()
    }
}

/// Drive one accepted connection to completion: negotiate, relay input and
/// output through `handler`, and fire `on_connect`/`on_disconnect` exactly
/// once each.
pub async fn run<H: ConnectionHandler>(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<ServerConfig>,
    mut handler: H,
) {
    let mut conn = Connection::new(
        peer_addr,
        Instant::now(),
        Duration::from_secs(config.autosense_timeout_secs),
    );

    let mut tick = tokio::time::interval(Duration::from_millis(config.poll_interval_ms));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut read_buf = [0u8; READ_CHUNK];
    let mut pending_events: Vec<InboundEvent> = Vec::new();
    let mut disconnect_requested = false;
    let mut socket_alive = true;

    loop {
        tokio::select! {
            read_result = stream.read(&mut read_buf), if socket_alive => {
                match read_result {
                    Ok(0) => {
                        debug!("connection closed by peer {}", peer_addr);
                        socket_alive = false;
                    }
                    Ok(n) => {
                        for &byte in &read_buf[..n] {
                            pending_events.extend(conn.feed_byte(byte, Instant::now()));
                        }
                        if conn.has_connected() {
                            for event in pending_events.drain(..) {
                                disconnect_requested = dispatch_event(&mut conn, &mut handler, event, disconnect_requested);
                            }
                        }
                    }
                    Err(e) => {
                        warn!("read error from {}: {}", peer_addr, e);
                        socket_alive = false;
                    }
                }
            }
            _ = tick.tick() => {
                conn.poll_autosense(Instant::now());
                if conn.should_fire_connect() {
                    let mut handle = TaskHandle { conn: &mut conn, disconnect_requested };
                    handler.on_connect(&mut handle);
                    disconnect_requested = handle.disconnect_requested;
                    conn.mark_connect_fired();

                    for event in pending_events.drain(..) {
                        disconnect_requested = dispatch_event(&mut conn, &mut handler, event, disconnect_requested);
                    }
                }
                {
                    let mut handle = TaskHandle { conn: &mut conn, disconnect_requested };
                    handler.process_tick(&mut handle);
                    disconnect_requested = handle.disconnect_requested;
                }

                match conn.drain_output() {
                    Ok(Some(bytes)) => {
                        if let Err(e) = stream.write_all(&bytes).await {
                            warn!("write error to {}: {}", peer_addr, e);
                            socket_alive = false;
                        }
                    }
                    Ok(None) => {}
                    Err(()) => {
                        debug!("kicking {} for backpressure overflow", peer_addr);
                        socket_alive = false;
                    }
                }
            }
        }

        if disconnect_requested || conn.is_kicked() || !socket_alive {
            break;
        }
    }

    if conn.is_negotiation_complete() {
        let info = ConnectionInfo {
            peer_addr,
            terminal_type: conn.terminal_type().map(str::to_string),
            ansi_capable: conn.is_ansi_capable(),
        };
        handler.on_disconnect(&info);
    }
}

/// Decode and dispatch one assembled inbound event, returning whether the
/// handler asked to disconnect while handling it.
fn dispatch_event<H: ConnectionHandler>(
    conn: &mut Connection,
    handler: &mut H,
    event: InboundEvent,
    disconnect_requested: bool,
) -> bool {
    let mut handle = TaskHandle {
        conn,
        disconnect_requested,
    };
    match event {
        InboundEvent::Line(bytes) => {
            let decoded = encoding::decode_from_client(&bytes);
            handler.on_line(&mut handle, decoded.text);
        }
        InboundEvent::Char(byte) => {
            handler.on_char(&mut handle, byte);
        }
    }
    handle.disconnect_requested
}
