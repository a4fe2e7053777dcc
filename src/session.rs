//! The per-connection state bundle.
//!
//! A `Connection` owns every piece of wire-level state for one peer: the
//! IAC parser, negotiation engine, input assembler, output buffer, and the
//! terminal/timing metadata the application façade can read through
//! [`crate::facade::ConnectionHandle`]. It never touches the socket
//! directly; the connection task in `server::connection_task` reads and
//! writes the actual stream and feeds/drains this struct.

use std::net::SocketAddr;
use std::time::Instant;

use uuid::Uuid;

use crate::autosense::AutoSenseSupervisor;
use crate::input::{EchoMode, InboundEvent, InputAssembler};
use crate::output::OutputBuffer;
use crate::protocol::{NegotiationEngine, ParseEvent, TelnetCommand, TelnetParser};

/// One connected (or still-negotiating) peer's complete state.
pub struct Connection {
    /// Unique per-connection identifier, stable across its lifetime.
    pub id: Uuid,
    /// Remote socket address.
    pub peer_addr: SocketAddr,

    parser: TelnetParser,
    negotiation: NegotiationEngine,
    input: InputAssembler,
    output: OutputBuffer,
    autosense: AutoSenseSupervisor,

    /// Set once promoted out of the negotiating set.
    negotiation_complete: bool,
    /// Set once `on_connect` has fired.
    connect_fired: bool,
    /// Set when the connection should be torn down at the end of its step.
    kicked: bool,
    /// Whether outbound application messages are currently accepted.
    new_messages_allowed: bool,
    /// Resolved (or overridden) ANSI capability.
    ansi_capable: bool,
    /// Password-style echo masking, independent of character/line mode.
    echo_mode: EchoMode,

    connect_time: Instant,
    last_activity: Instant,
}

impl Connection {
    /// Create a new connection immediately after accept, already primed
    /// with the initial auto-sense probe bytes queued for send.
    pub fn new(
        peer_addr: SocketAddr,
        now: Instant,
        autosense_timeout: std::time::Duration,
    ) -> Self {
        let mut negotiation = NegotiationEngine::new();
        let mut output = OutputBuffer::new();

        output.push_send(&negotiation.request_will_echo());
        output.push_send(&negotiation.request_terminal_type());
        output.push_send(&negotiation.request_terminal_speed());
        output.push_send(&negotiation.request_naws());

        Self {
            id: Uuid::new_v4(),
            peer_addr,
            parser: TelnetParser::new(),
            negotiation,
            input: InputAssembler::new(),
            output,
            autosense: AutoSenseSupervisor::new(now, autosense_timeout),
            negotiation_complete: false,
            connect_fired: false,
            kicked: false,
            new_messages_allowed: true,
            ansi_capable: false,
            echo_mode: EchoMode::Normal,
            connect_time: now,
            last_activity: now,
        }
    }

    /// Feed one byte read off the socket through the parser, negotiation
    /// engine, and input assembler. Any reply bytes the negotiation engine
    /// produces are queued for send. Returns the queued inbound events, if
    /// any became available.
    pub fn feed_byte(&mut self, byte: u8, now: Instant) -> Vec<InboundEvent> {
        self.last_activity = now;
        match self.parser.feed(byte) {
            ParseEvent::Data(b) => {
                if self.negotiation.echo_enabled() {
                    let echo = crate::input::mirror_echo(b, self.echo_mode);
                    self.output.push_echo(&echo);
                }
                self.input.feed(b);
            }
            ParseEvent::Command(cmd) => self.apply_command(&cmd),
            ParseEvent::Pending => {}
        }

        let mut events = Vec::new();
        while let Some(event) = self.input.pop_event() {
            events.push(event);
        }
        events
    }

    fn apply_command(&mut self, cmd: &TelnetCommand) {
        let reply = self.negotiation.handle_command(cmd);
        if !reply.is_empty() {
            self.output.push_send(&reply);
        }
    }

    /// Set password-style echo masking.
    pub fn set_password_mode(&mut self, enabled: bool) {
        self.echo_mode = if enabled {
            EchoMode::Password
        } else {
            EchoMode::Normal
        };
    }

    /// Whether this connection is still in line mode (vs. character mode).
    pub fn is_character_mode(&self) -> bool {
        self.input.is_character_mode()
    }

    /// Toggle line/character mode.
    pub fn set_character_mode(&mut self, enabled: bool) {
        self.input.set_character_mode(enabled);
    }

    /// Queue application text for delivery, subject to backpressure.
    pub fn send(&mut self, bytes: &[u8]) {
        if self.new_messages_allowed {
            self.output.push_send(bytes);
        }
    }

    /// Stop (or resume) accepting new outbound application messages.
    pub fn set_new_messages_allowed(&mut self, allowed: bool) {
        self.new_messages_allowed = allowed;
    }

    /// Drain whatever output is currently permitted to be written, or
    /// `None` if nothing should be written this step. Returns `Err` if the
    /// connection overflowed its backpressure threshold and should be
    /// kicked.
    pub fn drain_output(&mut self) -> Result<Option<Vec<u8>>, ()> {
        use crate::output::DrainOutcome;
        match self
            .output
            .drain(self.input.is_character_mode(), self.input.is_typing())
        {
            DrainOutcome::Ready(bytes) => Ok(Some(bytes)),
            DrainOutcome::Nothing => Ok(None),
            DrainOutcome::Overflow => {
                self.kicked = true;
                Err(())
            }
        }
    }

    /// Poll the auto-sense supervisor; promotes and returns `true` exactly
    /// once, the moment promotion happens.
    pub fn poll_autosense(&mut self, now: Instant) -> bool {
        if self.negotiation_complete {
            return false;
        }
        match self.autosense.poll(&mut self.negotiation, now) {
            crate::autosense::AutoSenseOutcome::Pending => false,
            crate::autosense::AutoSenseOutcome::Ready { ansi_capable } => {
                self.negotiation_complete = true;
                self.ansi_capable = ansi_capable;
                true
            }
        }
    }

    /// Whether this connection has been promoted to the connected set.
    pub fn is_negotiation_complete(&self) -> bool {
        self.negotiation_complete
    }

    /// Whether `on_connect` still needs to fire for this connection.
    pub fn should_fire_connect(&self) -> bool {
        self.negotiation_complete && !self.connect_fired
    }

    /// Whether `on_connect` has already fired for this connection.
    pub fn has_connected(&self) -> bool {
        self.connect_fired
    }

    /// Mark `on_connect` as having fired.
    pub fn mark_connect_fired(&mut self) {
        self.connect_fired = true;
    }

    /// Whether the connection has been kicked and should be disposed.
    pub fn is_kicked(&self) -> bool {
        self.kicked
    }

    /// Mark the connection for disposal.
    pub fn kick(&mut self) {
        self.kicked = true;
    }

    /// Negotiated terminal type, if any.
    pub fn terminal_type(&self) -> Option<&str> {
        self.negotiation.terminal_type()
    }

    /// Negotiated terminal speed, if any.
    pub fn terminal_speed(&self) -> Option<&str> {
        self.negotiation.terminal_speed()
    }

    /// Negotiated (or default) window size.
    pub fn window_size(&self) -> (u16, u16) {
        self.negotiation.window_size()
    }

    /// Whether this peer resolved (or was overridden) as ANSI-capable.
    pub fn is_ansi_capable(&self) -> bool {
        self.ansi_capable
    }

    /// Override the ANSI capability flag directly.
    pub fn set_ansi_capable(&mut self, enabled: bool) {
        self.ansi_capable = enabled;
    }

    /// `connect_time` / `last_activity` timestamps.
    pub fn connect_time(&self) -> Instant {
        self.connect_time
    }

    /// Timestamp of the most recently processed byte.
    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }
}
