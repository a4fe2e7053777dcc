//! Byte-at-a-time IAC state machine.
//!
//! Feeds raw wire bytes in one at a time and separates plain NVT data from
//! Telnet command sequences, including de-escaping `IAC IAC` and bounding
//! subnegotiation buffers.

use super::constants::iac;

/// Maximum bytes buffered for one subnegotiation before it is discarded.
///
/// Matches the original implementation's sanity cap on `_telnet_sb_buffer`.
const MAX_SUBNEGOTIATION_LEN: usize = 64;

/// A parsed Telnet command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelnetCommand {
    /// WILL option
    Will(u8),
    /// WONT option
    Wont(u8),
    /// DO option
    Do(u8),
    /// DONT option
    Dont(u8),
    /// Subnegotiation data (option byte plus body, `IAC SE` stripped).
    Subnegotiation { option: u8, data: Vec<u8> },
    /// NOP
    Nop,
    /// Go Ahead
    GoAhead,
    /// A two-byte command this engine doesn't act on (AYT, EC, EL, IP, AO,
    /// DATMK, BREAK): observed and otherwise ignored.
    Other(u8),
}

/// One outcome of feeding a single byte to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    /// A plain NVT data byte.
    Data(u8),
    /// A complete Telnet command.
    Command(TelnetCommand),
    /// The byte was consumed as part of an in-progress sequence; nothing to
    /// report yet.
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    GotIac,
    GotCmd(u8),
    InSubneg,
    SubnegGotIac,
}

/// Incremental Telnet IAC parser.
#[derive(Debug)]
pub struct TelnetParser {
    state: State,
    subneg_option: Option<u8>,
    subneg_data: Vec<u8>,
}

impl Default for TelnetParser {
    fn default() -> Self {
        Self {
            state: State::Normal,
            subneg_option: None,
            subneg_data: Vec::new(),
        }
    }
}

impl TelnetParser {
    /// Create a new parser in the initial state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte, producing an event.
    pub fn feed(&mut self, byte: u8) -> ParseEvent {
        match self.state {
            State::Normal => {
                if byte == iac::IAC {
                    self.state = State::GotIac;
                    ParseEvent::Pending
                } else {
                    ParseEvent::Data(byte)
                }
            }
            State::GotIac => self.feed_got_iac(byte),
            State::GotCmd(cmd) => self.feed_got_cmd(cmd, byte),
            State::InSubneg => self.feed_in_subneg(byte),
            State::SubnegGotIac => self.feed_subneg_got_iac(byte),
        }
    }

    fn feed_got_iac(&mut self, byte: u8) -> ParseEvent {
        match byte {
            iac::IAC => {
                // Escaped IAC: literal 0xFF as data.
                self.state = State::Normal;
                ParseEvent::Data(0xFF)
            }
            iac::DO | iac::DONT | iac::WILL | iac::WONT => {
                self.state = State::GotCmd(byte);
                ParseEvent::Pending
            }
            iac::SB => {
                self.state = State::InSubneg;
                self.subneg_option = None;
                self.subneg_data.clear();
                ParseEvent::Pending
            }
            iac::NOP => {
                self.state = State::Normal;
                ParseEvent::Command(TelnetCommand::Nop)
            }
            iac::GA => {
                self.state = State::Normal;
                ParseEvent::Command(TelnetCommand::GoAhead)
            }
            iac::DATMK | iac::BREAK | iac::IP | iac::AO | iac::AYT | iac::EC | iac::EL => {
                self.state = State::Normal;
                ParseEvent::Command(TelnetCommand::Other(byte))
            }
            _ => {
                self.state = State::Normal;
                tracing::warn!("unrecognized IAC command byte {:02X}", byte);
                ParseEvent::Pending
            }
        }
    }

    fn feed_got_cmd(&mut self, cmd: u8, option: u8) -> ParseEvent {
        self.state = State::Normal;
        match cmd {
            iac::DO => ParseEvent::Command(TelnetCommand::Do(option)),
            iac::DONT => ParseEvent::Command(TelnetCommand::Dont(option)),
            iac::WILL => ParseEvent::Command(TelnetCommand::Will(option)),
            iac::WONT => ParseEvent::Command(TelnetCommand::Wont(option)),
            _ => unreachable!("GotCmd state only holds DO/DONT/WILL/WONT"),
        }
    }

    fn feed_in_subneg(&mut self, byte: u8) -> ParseEvent {
        if byte == iac::IAC {
            self.state = State::SubnegGotIac;
            return ParseEvent::Pending;
        }
        if self.subneg_option.is_none() {
            self.subneg_option = Some(byte);
        } else if self.subneg_data.len() < MAX_SUBNEGOTIATION_LEN {
            self.subneg_data.push(byte);
        } else {
            tracing::warn!("subnegotiation buffer overflow, discarding");
            self.state = State::Normal;
            self.subneg_option = None;
            self.subneg_data.clear();
        }
        ParseEvent::Pending
    }

    fn feed_subneg_got_iac(&mut self, byte: u8) -> ParseEvent {
        if byte == iac::SE {
            self.state = State::Normal;
            let option = self.subneg_option.take().unwrap_or(0);
            let data = std::mem::take(&mut self.subneg_data);
            ParseEvent::Command(TelnetCommand::Subnegotiation { option, data })
        } else if byte == iac::IAC {
            // Escaped IAC inside subnegotiation: literal 0xFF.
            self.state = State::InSubneg;
            if self.subneg_option.is_none() {
                self.subneg_option = Some(0xFF);
            } else if self.subneg_data.len() < MAX_SUBNEGOTIATION_LEN {
                self.subneg_data.push(0xFF);
            }
            ParseEvent::Pending
        } else {
            // Malformed: IAC followed by something other than SE/IAC while
            // inside a subnegotiation. Bail out to Normal to avoid getting
            // stuck.
            tracing::warn!("unexpected byte {:02X} after IAC in subnegotiation", byte);
            self.state = State::Normal;
            ParseEvent::Pending
        }
    }

    /// Feed a whole buffer at once, splitting it into data bytes and
    /// commands. A thin convenience wrapper over repeated `feed()` calls.
    pub fn parse(&mut self, input: &[u8]) -> (Vec<u8>, Vec<TelnetCommand>) {
        let mut data = Vec::new();
        let mut commands = Vec::new();
        for &byte in input {
            match self.feed(byte) {
                ParseEvent::Data(b) => data.push(b),
                ParseEvent::Command(cmd) => commands.push(cmd),
                ParseEvent::Pending => {}
            }
        }
        (data, commands)
    }
}
