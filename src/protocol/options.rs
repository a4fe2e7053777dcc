//! Tri-state option negotiation table.
//!
//! Telnet option state isn't boolean: until a peer has actually answered,
//! an option's status is genuinely unknown, and the negotiation engine
//! (`negotiation.rs`) treats "unknown" differently from "explicitly off".

use std::collections::HashMap;

use super::constants::option_name;

/// Tri-state status of one end of an option negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionState {
    /// No DO/DONT/WILL/WONT has been exchanged for this option yet.
    #[default]
    Unknown,
    /// The option is explicitly disabled.
    False,
    /// The option is explicitly enabled.
    True,
}

impl OptionState {
    /// True only when the state is explicitly `True`.
    pub fn is_true(self) -> bool {
        matches!(self, OptionState::True)
    }

    /// True only when the state is explicitly `False`.
    pub fn is_false(self) -> bool {
        matches!(self, OptionState::False)
    }

    /// True when a DO/WILL (or DONT/WONT) hasn't been answered yet.
    pub fn is_unknown(self) -> bool {
        matches!(self, OptionState::Unknown)
    }
}

/// Tracked state of a single negotiated option.
#[derive(Debug, Clone, Default)]
pub struct OptionEntry {
    /// Our (local) side of the option: do we have it enabled?
    pub local: OptionState,
    /// The peer's (remote) side of the option: do they have it enabled?
    pub remote: OptionState,
    /// True while we're waiting on a reply we ourselves solicited.
    pub reply_pending: bool,
    /// Friendly name, filled in the first time the option is touched.
    pub text: &'static str,
}

/// Sparse table of per-option negotiation state, keyed by option code.
///
/// Entries are created lazily on first access, mirroring the original
/// implementation's `_telnet_opt_dict.setdefault(...)` behavior.
#[derive(Debug, Clone, Default)]
pub struct OptionTable {
    entries: HashMap<u8, OptionEntry>,
}

impl OptionTable {
    /// Create an empty option table.
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, option: u8) -> &mut OptionEntry {
        self.entries.entry(option).or_insert_with(|| OptionEntry {
            text: option_name(option),
            ..OptionEntry::default()
        })
    }

    /// Read the local state of an option (creating an Unknown entry if
    /// this option has never been touched).
    pub fn local(&mut self, option: u8) -> OptionState {
        self.entry(option).local
    }

    /// Record the local state of an option.
    pub fn set_local(&mut self, option: u8, state: OptionState) {
        self.entry(option).local = state;
    }

    /// Read the remote state of an option.
    pub fn remote(&mut self, option: u8) -> OptionState {
        self.entry(option).remote
    }

    /// Record the remote state of an option.
    pub fn set_remote(&mut self, option: u8, state: OptionState) {
        self.entry(option).remote = state;
    }

    /// Whether we're waiting for a reply to a request we made for this
    /// option.
    pub fn reply_pending(&mut self, option: u8) -> bool {
        self.entry(option).reply_pending
    }

    /// Record whether we're waiting for a reply for this option.
    pub fn set_reply_pending(&mut self, option: u8, pending: bool) {
        self.entry(option).reply_pending = pending;
    }
}
