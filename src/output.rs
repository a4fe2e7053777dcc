//! Outbound buffering and backpressure.
//!
//! Two buffers are kept distinct: `echo_buffer` holds local-echo bytes
//! produced by the input assembler, `send_buffer` holds application
//! output. Echo always drains before application data, and in line mode
//! application output is held back while the peer has an unterminated
//! line in progress so a reply doesn't land in the middle of what
//! someone is typing.

/// Above this many buffered bytes, a connection that still hasn't
/// finished its current line is kicked rather than left to grow
/// unbounded.
pub const KICK_THRESHOLD: usize = 8 * 1024 * 1024;

/// Outcome of a `drain` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Bytes ready to be written to the socket, in order.
    Ready(Vec<u8>),
    /// Nothing to send right now (deferred, or both buffers empty).
    Nothing,
    /// The send buffer grew past the kick threshold while deferred; the
    /// connection should be closed.
    Overflow,
}

/// Buffers outbound bytes and decides when they may be flushed.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    echo_buffer: Vec<u8>,
    send_buffer: Vec<u8>,
}

impl OutputBuffer {
    /// Create empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue local-echo bytes (always flushed ahead of application data).
    pub fn push_echo(&mut self, bytes: &[u8]) {
        self.echo_buffer.extend_from_slice(bytes);
    }

    /// Queue application output bytes.
    pub fn push_send(&mut self, bytes: &[u8]) {
        self.send_buffer.extend_from_slice(bytes);
    }

    /// Number of bytes currently queued in the send buffer.
    pub fn send_buffer_len(&self) -> usize {
        self.send_buffer.len()
    }

    /// Attempt to drain buffered output.
    ///
    /// `character_mode` connections always flush immediately. Line-mode
    /// connections defer the send buffer while `peer_is_typing` is true,
    /// unless the deferred backlog has grown past [`KICK_THRESHOLD`], in
    /// which case the caller should close the connection. Echo bytes are
    /// never deferred.
    pub fn drain(&mut self, character_mode: bool, peer_is_typing: bool) -> DrainOutcome {
        let defer_send = !character_mode && peer_is_typing;

        if defer_send {
            if !self.echo_buffer.is_empty() {
                let bytes = std::mem::take(&mut self.echo_buffer);
                return DrainOutcome::Ready(bytes);
            }
            if self.send_buffer.len() > KICK_THRESHOLD {
                return DrainOutcome::Overflow;
            }
            return DrainOutcome::Nothing;
        }

        if self.echo_buffer.is_empty() && self.send_buffer.is_empty() {
            return DrainOutcome::Nothing;
        }

        let mut out = std::mem::take(&mut self.echo_buffer);
        out.extend(std::mem::take(&mut self.send_buffer));
        DrainOutcome::Ready(out)
    }
}
