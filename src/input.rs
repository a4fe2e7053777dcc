//! Line/character assembly and echo mirroring.
//!
//! Operates purely on bytes already stripped of IAC sequences by the
//! [`crate::protocol::TelnetParser`]. Decoding to text happens later, at
//! the boundary in [`crate::encoding`].

use std::collections::VecDeque;

use crate::protocol::constants::control;

/// One assembled unit of input handed up to the application façade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A complete line, right-trimmed of whitespace with a trailing `\n\r`
    /// appended, per the line-mode framing rule.
    Line(Vec<u8>),
    /// A single raw byte, delivered immediately in character mode.
    Char(u8),
}

/// How received bytes are echoed back to the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoMode {
    /// Echo the byte as received.
    #[default]
    Normal,
    /// Echo `*` in place of any printable byte (password entry).
    Password,
}

/// Accumulates data bytes into lines or characters depending on mode, and
/// produces the local-echo byte sequence for each received byte.
#[derive(Debug, Default)]
pub struct InputAssembler {
    character_mode: bool,
    recv_buffer: Vec<u8>,
    queue: VecDeque<InboundEvent>,
    pending_cr: bool,
}

impl InputAssembler {
    /// Create a new assembler in line mode with empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the assembler is currently in character mode.
    pub fn is_character_mode(&self) -> bool {
        self.character_mode
    }

    /// Switch between line mode and character mode.
    pub fn set_character_mode(&mut self, enabled: bool) {
        self.character_mode = enabled;
    }

    /// The partial, not-yet-terminated input the peer has typed so far.
    ///
    /// A non-empty buffer means the peer is mid-line; the output buffer's
    /// backpressure policy defers sends while this is true.
    pub fn recv_buffer(&self) -> &[u8] {
        &self.recv_buffer
    }

    /// Whether the peer currently has unterminated partial input buffered.
    pub fn is_typing(&self) -> bool {
        !self.recv_buffer.is_empty()
    }

    /// Feed one data byte (already stripped of IAC) into the assembler.
    ///
    /// A bare CR is held back one byte: if the following byte is NUL, the
    /// pair is normalized to a single LF (some clients send `CR NUL` where
    /// a plain line break was intended); otherwise the CR is released and
    /// processed as an ordinary byte before the current one.
    pub fn feed(&mut self, byte: u8) {
        if self.pending_cr {
            self.pending_cr = false;
            if byte == control::NUL {
                self.feed_normalized(control::LF);
                return;
            }
            self.feed_normalized(control::CR);
        }
        if byte == control::CR {
            self.pending_cr = true;
            return;
        }
        self.feed_normalized(byte);
    }

    fn feed_normalized(&mut self, byte: u8) {
        match byte {
            control::BS | control::DEL => {
                self.recv_buffer.pop();
            }
            _ => {
                self.recv_buffer.push(byte);
                if !self.character_mode {
                    self.split_lines();
                }
            }
        }
        if self.character_mode && !self.recv_buffer.is_empty() {
            for b in std::mem::take(&mut self.recv_buffer) {
                self.queue.push_back(InboundEvent::Char(b));
            }
        }
    }

    fn split_lines(&mut self) {
        while let Some(pos) = self.recv_buffer.iter().position(|&b| b == control::LF) {
            let mut prefix: Vec<u8> = self.recv_buffer.drain(..=pos).collect();
            prefix.pop(); // drop the LF terminator itself
            while matches!(prefix.last(), Some(b) if b.is_ascii_whitespace()) {
                prefix.pop();
            }
            prefix.extend_from_slice(b"\n\r");
            self.queue.push_back(InboundEvent::Line(prefix));
        }
    }

    /// Pop the next assembled inbound event, if any are queued.
    pub fn pop_event(&mut self) -> Option<InboundEvent> {
        self.queue.pop_front()
    }

    /// Whether any assembled events are waiting to be drained.
    pub fn has_events(&self) -> bool {
        !self.queue.is_empty()
    }
}

/// Compute the local-echo bytes for one received raw byte.
///
/// LF gains a preceding CR; backspace/DEL emit an erase-character escape
/// sequence instead of the raw byte (the actual buffer edit is performed
/// by [`InputAssembler::feed`], independently of this mirroring); all other
/// bytes are echoed as-is, except in [`EchoMode::Password`] where printable
/// bytes are replaced with `*`.
pub fn mirror_echo(byte: u8, mode: EchoMode) -> Vec<u8> {
    match byte {
        control::LF => vec![control::CR, control::LF],
        control::BS | control::DEL => {
            let mut echo = vec![control::BS, control::ESC];
            echo.extend_from_slice(b"[0K");
            echo
        }
        _ if mode == EchoMode::Password && byte >= 0x20 && byte != control::DEL => vec![b'*'],
        _ => vec![byte],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_mode_single_line() {
        let mut a = InputAssembler::new();
        for &b in b"hello\n" {
            a.feed(b);
        }
        assert_eq!(
            a.pop_event(),
            Some(InboundEvent::Line(b"hello\n\r".to_vec()))
        );
        assert!(a.pop_event().is_none());
    }

    #[test]
    fn test_line_mode_multiple_lines_one_partial() {
        let mut a = InputAssembler::new();
        for &b in b"a\nb\nc" {
            a.feed(b);
        }
        assert_eq!(a.pop_event(), Some(InboundEvent::Line(b"a\n\r".to_vec())));
        assert_eq!(a.pop_event(), Some(InboundEvent::Line(b"b\n\r".to_vec())));
        assert!(a.pop_event().is_none());
        assert_eq!(a.recv_buffer(), b"c");
    }

    #[test]
    fn test_line_mode_right_trims_whitespace() {
        let mut a = InputAssembler::new();
        for &b in b"hello   \n" {
            a.feed(b);
        }
        assert_eq!(
            a.pop_event(),
            Some(InboundEvent::Line(b"hello\n\r".to_vec()))
        );
    }

    #[test]
    fn test_line_mode_trailing_cr_is_trimmed() {
        let mut a = InputAssembler::new();
        for &b in b"hello\r\n" {
            a.feed(b);
        }
        assert_eq!(
            a.pop_event(),
            Some(InboundEvent::Line(b"hello\n\r".to_vec()))
        );
    }

    #[test]
    fn test_cr_nul_normalizes_to_lf() {
        let mut a = InputAssembler::new();
        for &b in b"hello" {
            a.feed(b);
        }
        a.feed(control::CR);
        a.feed(control::NUL);
        assert_eq!(
            a.pop_event(),
            Some(InboundEvent::Line(b"hello\n\r".to_vec()))
        );
    }

    #[test]
    fn test_lone_cr_not_followed_by_nul_is_ordinary_byte() {
        let mut a = InputAssembler::new();
        a.feed(b'h');
        a.feed(control::CR);
        a.feed(b'i');
        a.feed(control::LF);
        // The CR became a buffered byte, then got right-trimmed away since
        // it's whitespace immediately preceding the LF split... but here
        // it's in the middle ("h" CR "i" LF), so it survives as a space.
        assert_eq!(
            a.pop_event(),
            Some(InboundEvent::Line(vec![b'h', control::CR, b'i', b'\n', b'\r']))
        );
    }

    #[test]
    fn test_character_mode_one_event_per_byte() {
        let mut a = InputAssembler::new();
        a.set_character_mode(true);
        a.feed(b'x');
        assert_eq!(a.pop_event(), Some(InboundEvent::Char(b'x')));
        assert!(a.pop_event().is_none());
        a.feed(b'y');
        assert_eq!(a.pop_event(), Some(InboundEvent::Char(b'y')));
    }

    #[test]
    fn test_backspace_removes_last_buffered_byte() {
        let mut a = InputAssembler::new();
        a.feed(b'h');
        a.feed(b'i');
        a.feed(control::BS);
        assert_eq!(a.recv_buffer(), b"h");
    }

    #[test]
    fn test_backspace_on_empty_buffer_is_noop() {
        let mut a = InputAssembler::new();
        a.feed(control::BS);
        assert!(a.recv_buffer().is_empty());
    }

    #[test]
    fn test_is_typing_reflects_partial_buffer() {
        let mut a = InputAssembler::new();
        assert!(!a.is_typing());
        a.feed(b'h');
        assert!(a.is_typing());
        a.feed(control::LF);
        assert!(!a.is_typing());
    }

    #[test]
    fn test_mirror_echo_lf_gains_cr() {
        assert_eq!(
            mirror_echo(control::LF, EchoMode::Normal),
            vec![control::CR, control::LF]
        );
    }

    #[test]
    fn test_mirror_echo_backspace_erase_sequence() {
        let echo = mirror_echo(control::BS, EchoMode::Normal);
        assert_eq!(echo[0], control::BS);
        assert_eq!(echo[1], control::ESC);
        assert_eq!(&echo[2..], b"[0K");
    }

    #[test]
    fn test_mirror_echo_regular_byte() {
        assert_eq!(mirror_echo(b'x', EchoMode::Normal), vec![b'x']);
    }

    #[test]
    fn test_mirror_echo_password_masks_printable() {
        assert_eq!(mirror_echo(b'p', EchoMode::Password), vec![b'*']);
    }

    #[test]
    fn test_mirror_echo_password_still_erases_on_backspace() {
        let echo = mirror_echo(control::BS, EchoMode::Password);
        assert_eq!(echo[0], control::BS);
    }
}
