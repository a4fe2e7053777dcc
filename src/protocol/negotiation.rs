//! The DO/DONT/WILL/WONT negotiation policy and subnegotiation decoding.
//!
//! This is the six-option policy table (BINARY, ECHO, SGA, STATUS is
//! refused outright, NAWS, TTYPE, TSPEED) that decides how this engine
//! answers a peer's Telnet option negotiation, plus the TTYPE/TSPEED/NAWS
//! subnegotiation payload decoder.

use tracing::warn;

use super::constants::{iac, option, sub};
use super::options::{OptionState, OptionTable};
use super::parser::TelnetCommand;

/// Negotiated terminal metadata and echo/SGA state, plus the option table
/// driving the policy below.
#[derive(Debug, Default)]
pub struct NegotiationEngine {
    options: OptionTable,
    echo_enabled: bool,
    sga_enabled: bool,
    terminal_type: Option<String>,
    terminal_speed: Option<String>,
    columns: u16,
    rows: u16,
}

impl NegotiationEngine {
    /// Create a fresh engine with no options negotiated yet.
    pub fn new() -> Self {
        Self {
            columns: 80,
            rows: 24,
            ..Self::default()
        }
    }

    /// Whether we are currently echoing the peer's input.
    pub fn echo_enabled(&self) -> bool {
        self.echo_enabled
    }

    /// Whether Suppress-Go-Ahead is in effect.
    pub fn sga_enabled(&self) -> bool {
        self.sga_enabled
    }

    /// The peer's reported terminal type, if TTYPE negotiation completed.
    pub fn terminal_type(&self) -> Option<&str> {
        self.terminal_type.as_deref()
    }

    /// The peer's reported terminal speed, if TSPEED negotiation completed.
    pub fn terminal_speed(&self) -> Option<&str> {
        self.terminal_speed.as_deref()
    }

    /// The peer's reported window size (columns, rows), defaulting to 80x24
    /// until a NAWS subnegotiation arrives.
    pub fn window_size(&self) -> (u16, u16) {
        (self.columns, self.rows)
    }

    /// Whether we are still waiting on a reply for any of the given
    /// options (used by the auto-sense supervisor to decide whether the
    /// probe window is still open).
    pub fn any_reply_pending(&mut self, options: &[u8]) -> bool {
        options.iter().any(|&o| self.options.reply_pending(o))
    }

    /// Request that we echo the peer's input. Returns `IAC WILL ECHO`.
    ///
    /// Per the original implementation, echo is switched on immediately
    /// (optimistically) rather than waiting for the peer's DO.
    pub fn request_will_echo(&mut self) -> Vec<u8> {
        self.options.set_reply_pending(option::ECHO, true);
        self.echo_enabled = true;
        vec![iac::IAC, iac::WILL, option::ECHO]
    }

    /// Request terminal type from the peer. Returns `IAC DO TTYPE`.
    pub fn request_terminal_type(&mut self) -> Vec<u8> {
        self.options.set_reply_pending(option::TTYPE, true);
        vec![iac::IAC, iac::DO, option::TTYPE]
    }

    /// Request terminal speed from the peer. Returns `IAC DO TSPEED`.
    pub fn request_terminal_speed(&mut self) -> Vec<u8> {
        self.options.set_reply_pending(option::TSPEED, true);
        vec![iac::IAC, iac::DO, option::TSPEED]
    }

    /// Request window size negotiation. Returns `IAC DO NAWS`.
    pub fn request_naws(&mut self) -> Vec<u8> {
        self.options.set_reply_pending(option::NAWS, true);
        vec![iac::IAC, iac::DO, option::NAWS]
    }

    /// Apply one parsed Telnet command, returning the bytes (if any) to
    /// send back in response.
    pub fn handle_command(&mut self, command: &TelnetCommand) -> Vec<u8> {
        match command {
            TelnetCommand::Do(opt) => self.handle_do(*opt),
            TelnetCommand::Dont(opt) => self.handle_dont(*opt),
            TelnetCommand::Will(opt) => self.handle_will(*opt),
            TelnetCommand::Wont(opt) => self.handle_wont(*opt),
            TelnetCommand::Subnegotiation { option, data } => {
                self.decode_subnegotiation(*option, data);
                vec![]
            }
            TelnetCommand::Nop | TelnetCommand::GoAhead | TelnetCommand::Other(_) => vec![],
        }
    }

    fn handle_do(&mut self, opt: u8) -> Vec<u8> {
        if matches!(opt, option::BINARY | option::SGA | option::ECHO) {
            if self.options.reply_pending(opt) {
                self.options.set_reply_pending(opt, false);
                self.options.set_local(opt, OptionState::True);
                if opt == option::SGA {
                    self.sga_enabled = true;
                }
                vec![]
            } else if !self.options.local(opt).is_true() {
                self.options.set_local(opt, OptionState::True);
                if opt == option::ECHO {
                    self.echo_enabled = true;
                }
                if opt == option::SGA {
                    self.sga_enabled = true;
                }
                vec![iac::IAC, iac::WILL, opt]
            } else {
                vec![]
            }
        } else if self.options.local(opt).is_unknown() {
            self.options.set_local(opt, OptionState::False);
            vec![iac::IAC, iac::WONT, opt]
        } else {
            vec![]
        }
    }

    fn handle_dont(&mut self, opt: u8) -> Vec<u8> {
        if matches!(opt, option::BINARY | option::SGA | option::ECHO) {
            if self.options.reply_pending(opt) {
                self.options.set_reply_pending(opt, false);
                self.options.set_local(opt, OptionState::False);
                if opt == option::SGA {
                    self.sga_enabled = false;
                }
                vec![]
            } else if !self.options.local(opt).is_false() {
                self.options.set_local(opt, OptionState::False);
                if opt == option::ECHO {
                    self.echo_enabled = false;
                }
                if opt == option::SGA {
                    self.sga_enabled = false;
                }
                vec![iac::IAC, iac::WONT, opt]
            } else {
                vec![]
            }
        } else {
            vec![]
        }
    }

    fn handle_will(&mut self, opt: u8) -> Vec<u8> {
        match opt {
            option::ECHO => {
                if self.options.remote(opt).is_unknown() {
                    self.options.set_remote(opt, OptionState::False);
                    vec![iac::IAC, iac::DONT, option::ECHO]
                } else {
                    vec![]
                }
            }
            option::NAWS | option::SGA => {
                if self.options.reply_pending(opt) {
                    self.options.set_reply_pending(opt, false);
                    self.options.set_remote(opt, OptionState::True);
                    vec![]
                } else if !self.options.remote(opt).is_true() {
                    self.options.set_remote(opt, OptionState::True);
                    vec![iac::IAC, iac::DO, opt]
                } else {
                    vec![]
                }
            }
            option::TTYPE => {
                if self.options.reply_pending(option::TTYPE) {
                    // The reply-pending flag is cleared later, when the
                    // subnegotiation with the terminal type itself arrives.
                    self.options.set_remote(option::TTYPE, OptionState::True);
                    vec![
                        iac::IAC,
                        iac::SB,
                        option::TTYPE,
                        sub::SEND,
                        iac::IAC,
                        iac::SE,
                    ]
                } else if !self.options.remote(option::TTYPE).is_true() {
                    self.options.set_remote(option::TTYPE, OptionState::True);
                    vec![iac::IAC, iac::DO, option::TTYPE]
                } else {
                    vec![]
                }
            }
            option::TSPEED => {
                if self.options.reply_pending(option::TSPEED) {
                    self.options.set_reply_pending(option::TSPEED, false);
                    self.options.set_remote(option::TSPEED, OptionState::True);
                    vec![
                        iac::IAC,
                        iac::SB,
                        option::TSPEED,
                        sub::SEND,
                        iac::IAC,
                        iac::SE,
                    ]
                } else if !self.options.remote(option::TSPEED).is_true() {
                    self.options.set_remote(option::TSPEED, OptionState::True);
                    vec![iac::IAC, iac::DO, option::TSPEED]
                } else {
                    vec![]
                }
            }
            _ => vec![],
        }
    }

    fn handle_wont(&mut self, opt: u8) -> Vec<u8> {
        let mut reply = Vec::new();
        if opt == option::ECHO && self.options.remote(opt).is_unknown() {
            self.options.set_remote(opt, OptionState::False);
            reply.extend([iac::IAC, iac::DONT, option::ECHO]);
        }
        if opt == option::TSPEED {
            if self.options.reply_pending(opt) {
                self.options.set_reply_pending(opt, false);
                self.options.set_remote(opt, OptionState::False);
            } else if !self.options.remote(opt).is_false() {
                self.options.set_remote(opt, OptionState::False);
                reply.extend([iac::IAC, iac::DONT, opt]);
            }
            self.terminal_speed = Some("Not Supported".to_string());
        } else if matches!(opt, option::SGA | option::TTYPE) {
            if self.options.reply_pending(opt) {
                self.options.set_reply_pending(opt, false);
                self.options.set_remote(opt, OptionState::False);
                if opt == option::SGA {
                    self.sga_enabled = false;
                }
            } else if !self.options.remote(opt).is_false() {
                self.options.set_remote(opt, OptionState::False);
                if opt == option::SGA {
                    self.sga_enabled = false;
                }
                reply.extend([iac::IAC, iac::DONT, opt]);
            }
        }
        reply
    }

    fn decode_subnegotiation(&mut self, opt: u8, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        match opt {
            option::TTYPE if data[0] == sub::IS => {
                let text = crate::encoding::decode_from_client(&data[1..]).text;
                self.terminal_type = Some(text);
                self.options.set_reply_pending(option::TTYPE, false);
            }
            option::TSPEED if data[0] == sub::IS => {
                let text = crate::encoding::decode_from_client(&data[1..]).text;
                let speed = text.split(',').next().unwrap_or("").to_string();
                self.terminal_speed = Some(speed);
            }
            option::NAWS => {
                if data.len() != 4 {
                    warn!("bad length on NAWS subnegotiation: {}", data.len());
                } else {
                    self.columns = (u16::from(data[0]) << 8) | u16::from(data[1]);
                    self.rows = (u16::from(data[2]) << 8) | u16::from(data[3]);
                }
            }
            _ => {}
        }
    }
}
