//! The application-facing capability traits.
//!
//! The core never subclasses or overrides connection behavior the way the
//! original BBS did with Python method overriding; instead an application
//! implements [`ConnectionHandler`] and hands a [`ConnectionFactory`] to the
//! acceptor. Everything wire-level (parser, negotiation, buffers) stays a
//! private field of the connection; these traits only see the parts of it
//! exposed through [`ConnectionHandle`] and [`ConnectionInfo`].

use std::net::SocketAddr;

/// A live, mutable view of one connection, handed to callbacks while the
/// connection is still owned by its task.
pub trait ConnectionHandle {
    /// Queue text for delivery to this peer (subject to backpressure).
    fn send(&mut self, text: &str);

    /// Mark the connection for disposal at the end of the current step.
    fn disconnect(&mut self);

    /// Switch between line mode and character mode.
    fn set_character_mode(&mut self, enabled: bool);

    /// Override the auto-sensed ANSI capability flag.
    fn set_ansi_mode(&mut self, enabled: bool);

    /// `"host:port"` for logging and display.
    fn addrport(&self) -> String;

    /// Whether the connection is still live (not kicked, no EOF observed).
    fn is_connected(&self) -> bool;
}

/// A read-only snapshot of a connection, valid at teardown time when no
/// further writes are possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Remote socket address.
    pub peer_addr: SocketAddr,
    /// Negotiated terminal type, if any was reported.
    pub terminal_type: Option<String>,
    /// Whether the auto-sense probe resolved this peer as ANSI-capable.
    pub ansi_capable: bool,
}

impl ConnectionInfo {
    /// `"host:port"` for logging and display.
    pub fn addrport(&self) -> String {
        self.peer_addr.to_string()
    }
}

/// Application behavior for one connection's lifetime.
///
/// All methods run on the connection's own task, so implementations never
/// need internal synchronization for per-connection state; shared state
/// across connections (e.g. a peer roster) is the implementation's own
/// responsibility.
pub trait ConnectionHandler: Send {
    /// Fired exactly once, after auto-sense promotes the connection to the
    /// connected set.
    fn on_connect(&mut self, conn: &mut dyn ConnectionHandle);

    /// Fired exactly once, when a promoted connection is torn down.
    fn on_disconnect(&mut self, conn: &ConnectionInfo);

    /// Fired once per assembled line, in line mode.
    fn on_line(&mut self, conn: &mut dyn ConnectionHandle, line: String);

    /// Fired once per raw byte, in character mode.
    fn on_char(&mut self, conn: &mut dyn ConnectionHandle, ch: u8);

    /// Fired on this connection's supervisory tick, independent of socket
    /// readiness: the per-connection-task equivalent of a `processClients`
    /// hook that drains each connection's queue and calls `send` on it
    /// once per poll cycle.
    fn process_tick(&mut self, _conn: &mut dyn ConnectionHandle) {}
}

/// Produces one [`ConnectionHandler`] per accepted socket.
pub trait ConnectionFactory: Send + Sync {
    /// The handler type this factory produces.
    type Handler: ConnectionHandler + 'static;

    /// Construct a fresh handler for a newly-accepted peer.
    fn new_connection(&self, peer_addr: SocketAddr) -> Self::Handler;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingHandle {
        sent: Vec<String>,
        connected: bool,
        character_mode: bool,
        ansi: bool,
    }

    impl ConnectionHandle for RecordingHandle {
        fn send(&mut self, text: &str) {
            self.sent.push(text.to_string());
        }
        fn disconnect(&mut self) {
            self.connected = false;
        }
        fn set_character_mode(&mut self, enabled: bool) {
            self.character_mode = enabled;
        }
        fn set_ansi_mode(&mut self, enabled: bool) {
            self.ansi = enabled;
        }
        fn addrport(&self) -> String {
            "127.0.0.1:1234".to_string()
        }
        fn is_connected(&self) -> bool {
            self.connected
        }
    }

    struct EchoHandler {
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl ConnectionHandler for EchoHandler {
        fn on_connect(&mut self, conn: &mut dyn ConnectionHandle) {
            conn.send("welcome");
        }
        fn on_disconnect(&mut self, _conn: &ConnectionInfo) {}
        fn on_line(&mut self, conn: &mut dyn ConnectionHandle, line: String) {
            self.lines.lock().unwrap().push(line.clone());
            conn.send(&line);
        }
        fn on_char(&mut self, _conn: &mut dyn ConnectionHandle, _ch: u8) {}
    }

    #[test]
    fn test_on_connect_sends_through_handle() {
        let mut handle = RecordingHandle {
            sent: Vec::new(),
            connected: true,
            character_mode: false,
            ansi: false,
        };
        let lines = Arc::new(Mutex::new(Vec::new()));
        let mut handler = EchoHandler {
            lines: lines.clone(),
        };
        handler.on_connect(&mut handle);
        assert_eq!(handle.sent, vec!["welcome".to_string()]);
    }

    #[test]
    fn test_on_line_records_and_echoes() {
        let mut handle = RecordingHandle {
            sent: Vec::new(),
            connected: true,
            character_mode: false,
            ansi: false,
        };
        let lines = Arc::new(Mutex::new(Vec::new()));
        let mut handler = EchoHandler {
            lines: lines.clone(),
        };
        handler.on_line(&mut handle, "hello".to_string());
        assert_eq!(*lines.lock().unwrap(), vec!["hello".to_string()]);
        assert_eq!(handle.sent, vec!["hello".to_string()]);
    }

    #[test]
    fn test_disconnect_flips_is_connected() {
        let mut handle = RecordingHandle {
            sent: Vec::new(),
            connected: true,
            character_mode: false,
            ansi: false,
        };
        handle.disconnect();
        assert!(!handle.is_connected());
    }

    #[test]
    fn test_connection_info_addrport() {
        let info = ConnectionInfo {
            peer_addr: "127.0.0.1:23".parse().unwrap(),
            terminal_type: Some("ANSI".to_string()),
            ansi_capable: true,
        };
        assert_eq!(info.addrport(), "127.0.0.1:23");
    }
}
