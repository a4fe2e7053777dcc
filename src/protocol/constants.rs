//! Telnet protocol byte constants (RFC 854 and friends).

/// Telnet command bytes (IAC = Interpret As Command).
pub mod iac {
    /// IAC - Interpret As Command (255)
    pub const IAC: u8 = 255;

    /// WILL - Sender wants to enable option (251)
    pub const WILL: u8 = 251;

    /// WONT - Sender refuses to enable option (252)
    pub const WONT: u8 = 252;

    /// DO - Sender wants receiver to enable option (253)
    pub const DO: u8 = 253;

    /// DONT - Sender wants receiver to disable option (254)
    pub const DONT: u8 = 254;

    /// SB - Subnegotiation Begin (250)
    pub const SB: u8 = 250;

    /// SE - Subnegotiation End (240)
    pub const SE: u8 = 240;

    /// NOP - No Operation (241)
    pub const NOP: u8 = 241;

    /// DATMK - Data stream portion of a sync (242)
    pub const DATMK: u8 = 242;

    /// BREAK - NVT character BRK (243)
    pub const BREAK: u8 = 243;

    /// IP - Interrupt Process (244)
    pub const IP: u8 = 244;

    /// AO - Abort Output (245)
    pub const AO: u8 = 245;

    /// AYT - Are You There (246)
    pub const AYT: u8 = 246;

    /// EC - Erase Character (247)
    pub const EC: u8 = 247;

    /// EL - Erase Line (248)
    pub const EL: u8 = 248;

    /// GA - Go Ahead (249)
    pub const GA: u8 = 249;
}

/// Subnegotiation qualifiers (RFC 1091, RFC 1079, RFC 1073).
pub mod sub {
    /// IS - the sender is supplying the requested value.
    pub const IS: u8 = 0;
    /// SEND - ask the peer to supply its value.
    pub const SEND: u8 = 1;
}

/// Telnet option codes this engine negotiates.
pub mod option {
    /// BINARY - Transmit Binary (0)
    pub const BINARY: u8 = 0;

    /// ECHO - Echo characters back to sender (1)
    pub const ECHO: u8 = 1;

    /// SGA - Suppress Go-Ahead (3)
    pub const SGA: u8 = 3;

    /// STATUS - Status of Telnet options (5)
    pub const STATUS: u8 = 5;

    /// TTYPE - Terminal Type (24)
    pub const TTYPE: u8 = 24;

    /// NAWS - Negotiate About Window Size (31)
    pub const NAWS: u8 = 31;

    /// TSPEED - Terminal Speed (32)
    pub const TSPEED: u8 = 32;

    /// LINEMO - Line Mode (34)
    pub const LINEMO: u8 = 34;
}

/// Human-readable names for the options this engine knows about, used in
/// diagnostic logging.
pub fn option_name(opt: u8) -> &'static str {
    match opt {
        option::BINARY => "Binary representation",
        option::ECHO => "Server Echo",
        option::SGA => "Suppress Go Ahead (SGA)",
        option::STATUS => "Status",
        option::TTYPE => "Terminal Type",
        option::NAWS => "Negotiate About Window Size (NAWS)",
        option::TSPEED => "Terminal Speed",
        option::LINEMO => "Line Mode",
        _ => "Unknown",
    }
}

/// Control characters used in Telnet communication.
pub mod control {
    /// NUL - Null character
    pub const NUL: u8 = 0x00;

    /// ETX - End of Text (Ctrl+C)
    pub const ETX: u8 = 0x03;

    /// EOT - End of Transmission (Ctrl+D)
    pub const EOT: u8 = 0x04;

    /// BS - Backspace
    pub const BS: u8 = 0x08;

    /// LF - Line Feed
    pub const LF: u8 = 0x0A;

    /// CR - Carriage Return
    pub const CR: u8 = 0x0D;

    /// ESC - Escape
    pub const ESC: u8 = 0x1B;

    /// DEL - Delete (also used as backspace)
    pub const DEL: u8 = 0x7F;
}

/// Terminal types the auto-sense probe recognizes as ANSI-capable.
pub const ANSI_TERMINAL_TYPES: &[&str] =
    &["ANSI", "XTERM", "TINYFUGUE", "zmud", "VT100", "IBM-3179-2"];

/// The one terminal type that short-circuits the NAWS-pending carve-out in
/// the auto-sense supervisor (see `autosense.rs`).
pub const AUTOSENSE_CARVEOUT_TERMINAL_TYPE: &str = "IBM-3179-2";
