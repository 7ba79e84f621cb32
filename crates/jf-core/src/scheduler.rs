//! Pass scheduler
//!
//! Mutation bursts and the safety-net interval both feed one queue that holds
//! at most one pending pass. The scheduler never reads a clock: the host
//! passes `now` in milliseconds, arms a single timer for
//! [`Scheduler::next_deadline`], and calls [`Scheduler::poll`] when it fires.

use std::cell::Cell;
use std::rc::Rc;

use crate::config::{DEBOUNCE_MS, SAFETY_INTERVAL_MS};

/// Millisecond time source. Only differences between readings matter.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Clock advanced by hand, for tests and replaying recorded sessions.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<u64>>);

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self(Rc::new(Cell::new(start)))
    }

    pub fn set(&self, now: u64) {
        self.0.set(now);
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Quiet period after the last qualifying mutation.
    pub debounce_ms: u64,
    /// Safety-net interval.
    pub interval_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            debounce_ms: DEBOUNCE_MS,
            interval_ms: SAFETY_INTERVAL_MS,
        }
    }
}

/// What caused a pass to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Debounced,
    Periodic,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    timing: Timing,
    debounce_due: Option<u64>,
    periodic_due: Option<u64>,
    running: bool,
}

impl Scheduler {
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            debounce_due: None,
            periodic_due: None,
            running: false,
        }
    }

    /// Arm the periodic deadline.
    pub fn start(&mut self, now: u64) {
        self.running = true;
        self.periodic_due = Some(now + self.timing.interval_ms);
    }

    /// Drop every pending deadline. `poll` returns nothing until restarted.
    pub fn stop(&mut self) {
        self.running = false;
        self.debounce_due = None;
        self.periodic_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Push the debounced pass out to `now + debounce`. Any number of calls
    /// before it fires collapse into that single pass.
    pub fn note_mutation(&mut self, now: u64) {
        if self.running {
            self.debounce_due = Some(now + self.timing.debounce_ms);
        }
    }

    pub fn next_deadline(&self) -> Option<u64> {
        match (self.debounce_due, self.periodic_due) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// At most one pass per call, even when both deadlines are due.
    pub fn poll(&mut self, now: u64) -> Option<PassKind> {
        if !self.running {
            return None;
        }

        let debounced = self.debounce_due.is_some_and(|due| due <= now);
        let periodic = self.periodic_due.is_some_and(|due| due <= now);

        if periodic {
            // Skip missed ticks rather than replaying them.
            self.periodic_due = Some(now + self.timing.interval_ms);
        }
        if debounced {
            self.debounce_due = None;
            return Some(PassKind::Debounced);
        }
        periodic.then_some(PassKind::Periodic)
    }
}
