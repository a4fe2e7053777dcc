//! Timer subsystem: looping calls, one-shot delays, and per-tick installed
//! functions.
//!
//! Modeled on the original implementation's small Twisted-flavored
//! vocabulary (`loopingCall`, `callLater`, `install`). Deadlines are kept
//! in a min-heap ordered by fire time; `advance` pops everything due and
//! reschedules looping entries. A looping call that falls behind (the
//! supervisory tick ran slower than its interval) coalesces the missed
//! ticks into a single fire rather than bursting through a catch-up loop.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

/// A function invoked when a timer fires. Boxed so callers can close over
/// connection state.
pub type TimerFn = Box<dyn FnMut() + Send>;

enum Kind {
    Looping { interval: Duration },
    OneShot,
}

struct Entry {
    name: String,
    kind: Kind,
    func: TimerFn,
}

struct Scheduled {
    at: Instant,
    entry: Entry,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at
    }
}
impl Eq for Scheduled {}
impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.at.cmp(&other.at)
    }
}

/// Handle returned by [`TimerSubsystem::looping_call`] to start the loop.
pub struct LoopingCallBuilder<'a> {
    subsystem: &'a mut TimerSubsystem,
    name: String,
    func: TimerFn,
}

impl<'a> LoopingCallBuilder<'a> {
    /// Start the loop, firing every `interval` starting `interval` from now.
    pub fn start(self, interval: Duration) {
        self.subsystem.heap.push(Reverse(Scheduled {
            at: self.subsystem.now + interval,
            entry: Entry {
                name: self.name,
                kind: Kind::Looping { interval },
                func: self.func,
            },
        }));
    }
}

/// A min-heap of pending timer fires plus a list of per-tick installed
/// functions, all driven by an externally-supplied clock.
pub struct TimerSubsystem {
    heap: BinaryHeap<Reverse<Scheduled>>,
    installed: Vec<(String, TimerFn)>,
    now: Instant,
}

impl TimerSubsystem {
    /// Create a new subsystem anchored at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            heap: BinaryHeap::new(),
            installed: Vec::new(),
            now,
        }
    }

    /// Begin defining a repeating timer. Call `.start(interval)` on the
    /// returned builder to actually schedule it.
    pub fn looping_call(&mut self, name: impl Into<String>, func: TimerFn) -> LoopingCallBuilder {
        LoopingCallBuilder {
            subsystem: self,
            name: name.into(),
            func,
        }
    }

    /// Schedule a one-shot callback to fire `runtime` from now.
    pub fn call_later(&mut self, name: impl Into<String>, func: TimerFn, runtime: Duration) {
        self.heap.push(Reverse(Scheduled {
            at: self.now + runtime,
            entry: Entry {
                name: name.into(),
                kind: Kind::OneShot,
                func,
            },
        }));
    }

    /// Register a function invoked unconditionally on every tick, for the
    /// lifetime of the subsystem.
    pub fn install(&mut self, name: impl Into<String>, func: TimerFn) {
        self.installed.push((name.into(), func));
    }

    /// Remove a previously-installed per-tick function by name.
    pub fn uninstall(&mut self, name: &str) {
        self.installed.retain(|(n, _)| n != name);
    }

    /// Advance the clock to `now`, firing every due looping call / one-shot
    /// (in fire-time order), then running every installed function exactly
    /// once. A looping call whose next fire time has already passed is
    /// rescheduled `interval` past its last due time, once, regardless of
    /// how many intervals were actually missed (it does not burst-fire
    /// to catch up).
    pub fn advance(&mut self, now: Instant) {
        self.now = now;
        while let Some(Reverse(scheduled)) = self.heap.peek() {
            if scheduled.at > now {
                break;
            }
            let Reverse(mut scheduled) = self.heap.pop().unwrap();
            (scheduled.entry.func)();
            if let Kind::Looping { interval } = scheduled.entry.kind {
                let mut next = scheduled.at + interval;
                if next <= now {
                    next = now + interval;
                }
                self.heap.push(Reverse(Scheduled {
                    at: next,
                    entry: Entry {
                        name: scheduled.entry.name,
                        kind: Kind::Looping { interval },
                        func: scheduled.entry.func,
                    },
                }));
            }
        }
        for (_, func) in &mut self.installed {
            func();
        }
    }

    /// Number of timers (looping + pending one-shot) currently scheduled.
    pub fn pending_count(&self) -> usize {
        self.heap.len()
    }

    /// Number of functions installed for per-tick invocation.
    pub fn installed_count(&self) -> usize {
        self.installed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_call_later_fires_once_past_runtime() {
        let start = Instant::now();
        let mut timers = TimerSubsystem::new(start);
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        timers.call_later("once", Box::new(move || { c.fetch_add(1, Ordering::SeqCst); }), Duration::from_secs(1));

        timers.advance(start + Duration::from_millis(500));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        timers.advance(start + Duration::from_secs(2));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        timers.advance(start + Duration::from_secs(3));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_looping_call_fires_repeatedly() {
        let start = Instant::now();
        let mut timers = TimerSubsystem::new(start);
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        timers
            .looping_call("tick", Box::new(move || { c.fetch_add(1, Ordering::SeqCst); }))
            .start(Duration::from_secs(10));

        timers.advance(start + Duration::from_secs(10));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        timers.advance(start + Duration::from_secs(20));
        assert_eq!(count.load(Ordering::SeqCst), 2);

        timers.advance(start + Duration::from_secs(25));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_looping_call_missed_ticks_coalesce() {
        let start = Instant::now();
        let mut timers = TimerSubsystem::new(start);
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        timers
            .looping_call("tick", Box::new(move || { c.fetch_add(1, Ordering::SeqCst); }))
            .start(Duration::from_secs(10));

        // Jump far past several missed intervals in one go.
        timers.advance(start + Duration::from_secs(95));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_install_runs_every_tick_unconditionally() {
        let start = Instant::now();
        let mut timers = TimerSubsystem::new(start);
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        timers.install("heartbeat", Box::new(move || { c.fetch_add(1, Ordering::SeqCst); }));

        timers.advance(start + Duration::from_millis(10));
        timers.advance(start + Duration::from_millis(20));
        timers.advance(start + Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_uninstall_stops_future_ticks() {
        let start = Instant::now();
        let mut timers = TimerSubsystem::new(start);
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        timers.install("heartbeat", Box::new(move || { c.fetch_add(1, Ordering::SeqCst); }));
        timers.advance(start + Duration::from_millis(10));
        timers.uninstall("heartbeat");
        timers.advance(start + Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pending_and_installed_counts() {
        let start = Instant::now();
        let mut timers = TimerSubsystem::new(start);
        timers.call_later("a", Box::new(|| {}), Duration::from_secs(1));
        timers.looping_call("b", Box::new(|| {})).start(Duration::from_secs(1));
        timers.install("c", Box::new(|| {}));
        assert_eq!(timers.pending_count(), 2);
        assert_eq!(timers.installed_count(), 1);
    }
}
