//! Card classification: which enabled criteria a card trips.

use crate::config::FilterSettings;
use crate::dom::Element;
use crate::matcher::CompanyMatcher;
use crate::profile::{JobStatus, SiteProfile};
use crate::visibility::OVERLAY_SELECTOR;

bitflags::bitflags! {
    /// Why a card should be hidden. Empty means it should be visible.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HideReasons: u8 {
        /// Card text matched a block-list entry
        const COMPANY = 1 << 0;
        const APPLIED = 1 << 1;
        const PROMOTED = 1 << 2;
        const REPOSTED = 1 << 3;
    }
}

/// Borrowed view over one consistent config, used for a whole pass.
pub struct Classifier<'a> {
    profile: &'a SiteProfile,
    matcher: &'a CompanyMatcher,
    settings: FilterSettings,
}

impl<'a> Classifier<'a> {
    pub fn new(profile: &'a SiteProfile, matcher: &'a CompanyMatcher, settings: FilterSettings) -> Self {
        Self { profile, matcher, settings }
    }

    /// Every criterion the card trips. Status predicates only run when their
    /// filter is on.
    pub fn classify<E: Element>(&self, card: &E) -> HideReasons {
        let mut reasons = HideReasons::empty();

        if self.company_blocked(card) {
            reasons |= HideReasons::COMPANY;
        }

        if !self.settings.any_enabled() {
            return reasons;
        }

        let checks = [
            (self.settings.hide_applied, JobStatus::Applied, HideReasons::APPLIED),
            (self.settings.hide_promoted, JobStatus::Promoted, HideReasons::PROMOTED),
            (self.settings.hide_reposted, JobStatus::Reposted, HideReasons::REPOSTED),
        ];
        for (enabled, status, reason) in checks {
            if enabled && self.profile.has_status(card, status) {
                reasons |= reason;
            }
        }

        reasons
    }

    pub fn should_hide<E: Element>(&self, card: &E) -> bool {
        !self.classify(card).is_empty()
    }

    fn company_blocked<E: Element>(&self, card: &E) -> bool {
        if self.matcher.is_empty() {
            return false;
        }

        // Our own overlay is not part of the listing.
        let text = card.text_content_excluding(OVERLAY_SELECTOR);
        if !text.trim().is_empty() {
            let blocked = self.matcher.is_blocked(&text);
            if blocked && log::log_enabled!(log::Level::Debug) {
                log::debug!(
                    "Blocked card for {:?} (pattern {:?})",
                    self.profile.extract_company(card),
                    self.matcher.matched_pattern(&text)
                );
            }
            return blocked;
        }

        // Nothing rendered as text yet; the structured record may still name
        // the company.
        self.profile
            .extract_company(card)
            .is_some_and(|name| self.matcher.matches_name(&name))
    }
}
