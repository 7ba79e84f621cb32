//! Filter Engine
//!
//! One engine per page. It owns the current config and drives every pass;
//! nothing else writes the config. All entry points take `&mut self`, so a
//! pass always sees one complete config and never a half-applied update.

use serde_json::Value;

use crate::change::ChangeDetector;
use crate::classify::Classifier;
use crate::config::{ConfigError, FilterConfig, InboundMessage};
use crate::dom::{Document, Element};
use crate::matcher::CompanyMatcher;
use crate::profile::{Site, SiteProfile};
use crate::scheduler::{Clock, PassKind, Timing};
use crate::visibility::{state_of, CardState, UnblockError, VisibilityController, HIDDEN_ATTR, HIDDEN_SELECTOR};

/// Transitions made by one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub hidden: usize,
    pub shown: usize,
}

impl PassReport {
    pub fn is_empty(&self) -> bool {
        self.hidden == 0 && self.shown == 0
    }
}

pub struct FilterEngine<D: Document, C: Clock> {
    doc: D,
    clock: C,
    profile: Option<&'static SiteProfile>,
    config: FilterConfig,
    matcher: CompanyMatcher,
    enabled: bool,
    detector: ChangeDetector,
    visibility: VisibilityController<D::Element>,
    torn_down: bool,
}

impl<D: Document, C: Clock> FilterEngine<D, C> {
    /// Engine for the page at `host`. Unsupported hosts get an engine whose
    /// every operation is a no-op.
    pub fn for_host(doc: D, clock: C, host: &str, timing: Timing) -> Self {
        let profile = SiteProfile::for_host(host);
        if profile.is_none() {
            log::debug!("No site profile for {host}; filtering disabled");
        }
        Self::with_profile(doc, clock, profile, timing)
    }

    pub fn with_profile(doc: D, clock: C, profile: Option<&'static SiteProfile>, timing: Timing) -> Self {
        Self {
            doc,
            clock,
            profile,
            config: FilterConfig::default(),
            matcher: CompanyMatcher::default(),
            enabled: true,
            detector: ChangeDetector::new(timing),
            visibility: VisibilityController::new(),
            torn_down: false,
        }
    }

    /// Install the loaded config, run the first pass and start the scheduler.
    pub fn start(&mut self, config: FilterConfig) -> PassReport {
        if self.torn_down {
            return PassReport::default();
        }
        self.swap_config(config);
        let report = self.full_pass();
        if self.profile.is_some() {
            self.detector.start(self.clock.now_ms());
        }
        report
    }

    pub fn site(&self) -> Option<Site> {
        self.profile.map(|profile| profile.site)
    }

    pub fn profile(&self) -> Option<&'static SiteProfile> {
        self.profile
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn active_profile(&self) -> Option<&'static SiteProfile> {
        if self.torn_down || !self.enabled {
            return None;
        }
        self.profile
    }

    /// Hide newly qualifying cards. Hidden and overridden cards are not
    /// classified again; hidden ones only get a lost overlay rebuilt.
    pub fn full_pass(&mut self) -> PassReport {
        let Some(profile) = self.active_profile() else {
            return PassReport::default();
        };

        let classifier = Classifier::new(profile, &self.matcher, self.config.settings);
        let mut report = PassReport::default();
        for card in profile.enumerate_cards(&self.doc) {
            match state_of(&card) {
                CardState::Visible => {
                    if classifier.should_hide(&card) && self.visibility.hide(&card) {
                        report.hidden += 1;
                    }
                }
                CardState::Hidden => {
                    self.visibility.repair(&card);
                }
                CardState::UnblockedOverride => {}
            }
        }

        if report.hidden > 0 {
            log::info!("Hidden {} job postings based on filter criteria", report.hidden);
        }
        report
    }

    /// Move every card to the state the current config asks for, in both
    /// directions. Overridden cards are never hidden.
    pub fn reconcile(&mut self) -> PassReport {
        let Some(profile) = self.active_profile() else {
            return PassReport::default();
        };

        let now = self.clock.now_ms();
        let classifier = Classifier::new(profile, &self.matcher, self.config.settings);
        let mut report = PassReport::default();
        for card in profile.enumerate_cards(&self.doc) {
            let overridden = state_of(&card) == CardState::UnblockedOverride;
            let hidden = card.has_attribute(HIDDEN_ATTR);
            let target_hidden = !overridden && classifier.should_hide(&card);

            if target_hidden && !hidden {
                if self.visibility.hide(&card) {
                    report.hidden += 1;
                }
            } else if !target_hidden && hidden && self.visibility.show(&card, now) {
                report.shown += 1;
            }
        }

        if !report.is_empty() {
            log::info!("Hidden {} and shown {} job postings", report.hidden, report.shown);
        }
        report
    }

    /// Replace the config wholesale, then reconcile.
    pub fn update_config(&mut self, config: FilterConfig) -> PassReport {
        if self.torn_down {
            return PassReport::default();
        }
        self.swap_config(config);
        log::info!(
            "Updated filter settings: {} blocked companies, {:?}",
            self.config.block_list.len(),
            self.config.settings
        );
        self.reconcile()
    }

    pub fn handle_message(&mut self, message: InboundMessage) -> PassReport {
        let next = message.apply_to(&self.config);
        self.update_config(next)
    }

    /// Parse and apply a raw message from the settings surface.
    pub fn handle_message_value(&mut self, value: &Value) -> Result<PassReport, ConfigError> {
        let message = InboundMessage::parse(value)?;
        Ok(self.handle_message(message))
    }

    /// Disabling reveals every card we hid and suspends hiding; enabling runs
    /// a full pass straight away.
    pub fn set_enabled(&mut self, enabled: bool) -> PassReport {
        if self.torn_down {
            return PassReport::default();
        }
        self.enabled = enabled;

        if enabled {
            return self.full_pass();
        }

        let now = self.clock.now_ms();
        let mut report = PassReport::default();
        for card in self.doc.query_selector_all(HIDDEN_SELECTOR) {
            if self.visibility.show(&card, now) {
                report.shown += 1;
            }
        }
        if report.shown > 0 {
            log::info!("Shown {} previously hidden job postings", report.shown);
        }
        report
    }

    /// User clicked "unblock" on one card.
    pub fn unblock_one(&mut self, card: &D::Element) -> Result<String, UnblockError> {
        let profile = self.profile.ok_or(UnblockError::UnsupportedSite)?;
        let now = self.clock.now_ms();
        self.visibility.unblock_one(card, profile, now)
    }

    /// Feed one observer batch of added element nodes. Returns true if a
    /// debounced pass was scheduled.
    pub fn on_added_nodes(&mut self, added: &[D::Element]) -> bool {
        let Some(profile) = self.active_profile() else {
            return false;
        };
        let now = self.clock.now_ms();
        self.detector.on_added_nodes(profile, added, now)
    }

    /// Run whatever is due: transition cleanups, then at most one pass.
    pub fn poll(&mut self) -> PassReport {
        if self.torn_down {
            return PassReport::default();
        }

        let now = self.clock.now_ms();
        self.visibility.flush_cleanups(now);

        match self.detector.poll(now) {
            Some(kind) => {
                let report = self.full_pass();
                if kind == PassKind::Debounced {
                    log::debug!("Debounced pass after DOM insertions: {report:?}");
                }
                report
            }
            None => PassReport::default(),
        }
    }

    /// Earliest time `poll` has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        if self.torn_down {
            return None;
        }
        match (self.detector.next_deadline(), self.visibility.next_cleanup()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Stop scheduling. Every later call is a no-op.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.detector.stop();
        self.visibility.clear_pending();
        log::debug!("Filter engine torn down");
    }

    fn swap_config(&mut self, config: FilterConfig) {
        self.matcher = CompanyMatcher::new(&config.block_list);
        self.config = config;
    }
}
