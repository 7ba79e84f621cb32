//! Change Detector
//!
//! Decides whether a batch of inserted nodes is worth a pass and feeds the
//! scheduler. Only added element nodes are inspected; removals and attribute
//! changes are left to the periodic pass.

use crate::dom::Element;
use crate::profile::SiteProfile;
use crate::scheduler::{PassKind, Scheduler, Timing};

#[derive(Debug, Clone)]
pub struct ChangeDetector {
    scheduler: Scheduler,
}

impl ChangeDetector {
    pub fn new(timing: Timing) -> Self {
        Self { scheduler: Scheduler::new(timing) }
    }

    pub fn start(&mut self, now: u64) {
        self.scheduler.start(now);
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// True if any node in the batch is, or contains, a card.
    pub fn batch_needs_pass<E: Element>(profile: &SiteProfile, added: &[E]) -> bool {
        added.iter().any(|node| profile.looks_like_card(node))
    }

    /// Inspect one observer batch; schedules a debounced pass on a hit.
    pub fn on_added_nodes<E: Element>(&mut self, profile: &SiteProfile, added: &[E], now: u64) -> bool {
        if !self.scheduler.is_running() || !Self::batch_needs_pass(profile, added) {
            return false;
        }
        self.scheduler.note_mutation(now);
        true
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    pub fn poll(&mut self, now: u64) -> Option<PassKind> {
        self.scheduler.poll(now)
    }
}
