//! Capability auto-sense supervisor.
//!
//! A newly-accepted connection spends a brief window in the negotiating
//! set while the engine solicits TTYPE/TSPEED/NAWS from the peer. This
//! module decides, on each poll tick, whether that window has produced
//! enough information to promote the connection, or whether it has
//! simply run out of time.

use std::time::{Duration, Instant};

use crate::protocol::constants::{ANSI_TERMINAL_TYPES, AUTOSENSE_CARVEOUT_TERMINAL_TYPE};
use crate::protocol::{option, NegotiationEngine};

/// Outcome of one auto-sense poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSenseOutcome {
    /// Still waiting on replies, within the deadline.
    Pending,
    /// Ready to promote, with the resolved ANSI capability flag.
    Ready { ansi_capable: bool },
}

/// Tracks the deadline for one connection's negotiation window.
#[derive(Debug)]
pub struct AutoSenseSupervisor {
    deadline: Instant,
}

impl AutoSenseSupervisor {
    /// Start a new auto-sense window of `timeout` from `now`.
    pub fn new(now: Instant, timeout: Duration) -> Self {
        Self {
            deadline: now + timeout,
        }
    }

    /// Poll once, given the connection's negotiation state and the
    /// current time.
    pub fn poll(&self, negotiation: &mut NegotiationEngine, now: Instant) -> AutoSenseOutcome {
        let pending_options = [option::TTYPE, option::TSPEED, option::NAWS];

        if !negotiation.any_reply_pending(&pending_options) {
            let ansi_capable = negotiation
                .terminal_type()
                .map(|t| ANSI_TERMINAL_TYPES.contains(&t))
                .unwrap_or(false);
            return AutoSenseOutcome::Ready { ansi_capable };
        }

        let naws_only_pending = negotiation.any_reply_pending(&[option::NAWS])
            && !negotiation.any_reply_pending(&[option::TTYPE, option::TSPEED]);
        if naws_only_pending
            && negotiation.terminal_type() == Some(AUTOSENSE_CARVEOUT_TERMINAL_TYPE)
        {
            return AutoSenseOutcome::Ready { ansi_capable: true };
        }

        if now > self.deadline {
            return AutoSenseOutcome::Ready {
                ansi_capable: false,
            };
        }

        AutoSenseOutcome::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::TelnetCommand;

    fn engine_with_all_pending() -> NegotiationEngine {
        let mut n = NegotiationEngine::new();
        n.request_terminal_type();
        n.request_terminal_speed();
        n.request_naws();
        n
    }

    #[test]
    fn test_pending_while_replies_outstanding_and_before_deadline() {
        let now = Instant::now();
        let sup = AutoSenseSupervisor::new(now, Duration::from_secs(2));
        let mut n = engine_with_all_pending();
        assert_eq!(sup.poll(&mut n, now), AutoSenseOutcome::Pending);
    }

    #[test]
    fn test_ready_when_no_replies_pending() {
        let now = Instant::now();
        let sup = AutoSenseSupervisor::new(now, Duration::from_secs(2));
        let mut n = NegotiationEngine::new();
        assert_eq!(
            sup.poll(&mut n, now),
            AutoSenseOutcome::Ready {
                ansi_capable: false
            }
        );
    }

    #[test]
    fn test_ready_ansi_when_recognized_terminal_type_answered() {
        let now = Instant::now();
        let sup = AutoSenseSupervisor::new(now, Duration::from_secs(2));
        let mut n = NegotiationEngine::new();
        n.handle_command(&TelnetCommand::Subnegotiation {
            option: option::TTYPE,
            data: {
                let mut d = vec![crate::protocol::sub::IS];
                d.extend_from_slice(b"ANSI");
                d
            },
        });
        assert_eq!(
            sup.poll(&mut n, now),
            AutoSenseOutcome::Ready { ansi_capable: true }
        );
    }

    #[test]
    fn test_timeout_forces_promotion_without_ansi() {
        let now = Instant::now();
        let sup = AutoSenseSupervisor::new(now, Duration::from_secs(2));
        let mut n = engine_with_all_pending();
        let later = now + Duration::from_secs(3);
        assert_eq!(
            sup.poll(&mut n, later),
            AutoSenseOutcome::Ready {
                ansi_capable: false
            }
        );
    }

    #[test]
    fn test_ibm_3179_2_carveout_promotes_on_naws_alone() {
        let now = Instant::now();
        let sup = AutoSenseSupervisor::new(now, Duration::from_secs(2));
        let mut n = NegotiationEngine::new();
        n.request_naws();
        n.handle_command(&TelnetCommand::Subnegotiation {
            option: option::TTYPE,
            data: {
                let mut d = vec![crate::protocol::sub::IS];
                d.extend_from_slice(AUTOSENSE_CARVEOUT_TERMINAL_TYPE.as_bytes());
                d
            },
        });
        // NAWS reply is still pending, TTYPE/TSPEED are not.
        assert_eq!(
            sup.poll(&mut n, now),
            AutoSenseOutcome::Ready { ansi_capable: true }
        );
    }
}
