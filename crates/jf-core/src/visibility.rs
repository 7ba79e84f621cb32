//! Visibility Controller
//!
//! Owns the per-card hidden/visible/override state and its DOM side effects.
//! State lives on the node itself as marker attributes, so it disappears with
//! the node and survives any number of passes without a side table.
//!
//! Hidden cards stay in layout (blurred, dimmed, inert) because the sites'
//! virtual scrolling keys off child counts. The unblock control sits in a
//! separate absolutely positioned layer so it renders above the blur.

use crate::config::TRANSITION_CLEANUP_MS;
use crate::dom::Element;
use crate::profile::SiteProfile;

/// Present while a card is hidden by us.
pub const HIDDEN_ATTR: &str = "data-job-filter-hidden";
/// Present once the user unblocked this exact card.
pub const UNBLOCKED_ATTR: &str = "data-job-filter-unblocked";
/// Present when we forced `position: relative` to anchor the overlay.
pub const POSITIONED_ATTR: &str = "data-job-filter-positioned";

pub const OVERLAY_CLASS: &str = "job-filter-unblock-overlay";
pub const OVERLAY_SELECTOR: &str = ".job-filter-unblock-overlay";
pub const BUTTON_CLASS: &str = "job-filter-unblock-btn";
pub const BUTTON_SELECTOR: &str = ".job-filter-unblock-btn";
pub const BUTTON_LABEL: &str = "\u{1F441}\u{FE0F} Unblock";

/// Every hidden card, regardless of site profile.
pub const HIDDEN_SELECTOR: &str = r#"[data-job-filter-hidden="true"]"#;

type Style = &'static [(&'static str, &'static str)];

const HIDDEN_STYLE: Style = &[
    ("transition", "all 0.3s ease-out"),
    ("filter", "blur(2px)"),
    ("opacity", "0.3"),
    ("pointer-events", "none"),
    ("border", "1px solid rgba(255, 0, 0, 0.2)"),
    ("border-radius", "4px"),
];

const RESTORED_PROPERTIES: &[&str] = &["filter", "opacity", "pointer-events", "border", "border-radius"];

const OVERLAY_STYLE: Style = &[
    ("position", "absolute"),
    ("top", "0"),
    ("left", "0"),
    ("right", "0"),
    ("bottom", "0"),
    ("z-index", "999999"),
    ("pointer-events", "none"),
    ("display", "flex"),
    ("justify-content", "flex-end"),
    ("align-items", "flex-start"),
    ("padding", "10px"),
];

const BUTTON_STYLE: Style = &[
    ("background", "rgba(255, 255, 255, 0.98)"),
    ("border", "none"),
    ("border-radius", "4px"),
    ("padding", "4px 8px"),
    ("font-size", "12px"),
    ("cursor", "pointer"),
    ("color", "#ff4444"),
    ("font-weight", "bold"),
    ("box-shadow", "0 2px 8px rgba(0,0,0,0.3)"),
    ("transition", "all 0.2s ease"),
    ("filter", "none"),
    ("backdrop-filter", "none"),
    ("transform", "translateZ(0)"),
    ("isolation", "isolate"),
    ("pointer-events", "auto"),
    ("outline", "none"),
];

/// Applied to the unblock button while hovered.
pub const BUTTON_HOVER_STYLE: Style = &[
    ("background", "#ff4444"),
    ("color", "white"),
    ("transform", "translateZ(0) scale(1.05)"),
];

/// Applied to the unblock button when the pointer leaves.
pub const BUTTON_REST_STYLE: Style = &[
    ("background", "rgba(255, 255, 255, 0.98)"),
    ("color", "#ff4444"),
    ("transform", "translateZ(0) scale(1)"),
];

pub fn apply_style<E: Element>(element: &E, style: Style) {
    for (property, value) in style {
        element.set_style(property, value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Visible,
    Hidden,
    /// Visible and exempt from automatic hiding for the node's lifetime.
    UnblockedOverride,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnblockError {
    #[error("card has no job id; nothing to scope the override to")]
    MissingJobId,
    #[error("page is not a supported job site")]
    UnsupportedSite,
}

pub fn state_of<E: Element>(card: &E) -> CardState {
    if card.has_attribute(UNBLOCKED_ATTR) {
        CardState::UnblockedOverride
    } else if card.has_attribute(HIDDEN_ATTR) {
        CardState::Hidden
    } else {
        CardState::Visible
    }
}

fn is_hidden<E: Element>(card: &E) -> bool {
    card.has_attribute(HIDDEN_ATTR)
}

/// Applies transitions and tracks the reveal-transition cleanups still due.
#[derive(Debug)]
pub struct VisibilityController<E: Element> {
    pending_cleanups: Vec<(E, u64)>,
}

impl<E: Element> Default for VisibilityController<E> {
    fn default() -> Self {
        Self { pending_cleanups: Vec::new() }
    }
}

impl<E: Element> VisibilityController<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide a card. Returns true if a transition happened.
    ///
    /// Marker, treatment and overlay are applied in one synchronous call. If
    /// the overlay cannot be built the whole change is rolled back.
    pub fn hide(&mut self, card: &E) -> bool {
        match state_of(card) {
            CardState::Hidden | CardState::UnblockedOverride => return false,
            CardState::Visible => {}
        }

        card.set_attribute(HIDDEN_ATTR, "true");
        apply_style(card, HIDDEN_STYLE);
        if card.is_statically_positioned() {
            card.set_style("position", "relative");
            card.set_attribute(POSITIONED_ATTR, "true");
        }

        if !attach_overlay(card) {
            log::warn!("Could not attach unblock overlay; leaving card visible");
            restore(card);
            card.set_style("transition", "");
            return false;
        }
        true
    }

    /// Reveal a card hidden by us. Returns true if a transition happened.
    pub fn show(&mut self, card: &E, now: u64) -> bool {
        if !is_hidden(card) {
            return false;
        }

        detach_overlay(card);
        restore(card);
        card.set_style("transition", "all 0.3s ease-in");
        self.schedule_cleanup(card, now + TRANSITION_CLEANUP_MS);
        true
    }

    /// Re-attach the overlay to a hidden card whose overlay the page dropped
    /// while re-rendering. Returns true if the overlay was rebuilt.
    pub fn repair(&mut self, card: &E) -> bool {
        if state_of(card) != CardState::Hidden || card.query_selector(OVERLAY_SELECTOR).is_some() {
            return false;
        }
        if attach_overlay(card) {
            log::debug!("Restored missing unblock overlay");
            return true;
        }
        log::warn!("Could not restore unblock overlay; revealing card");
        restore(card);
        false
    }

    /// Exempt one card from automatic hiding and reveal it.
    ///
    /// Refused when the card carries no job id.
    pub fn unblock_one(&mut self, card: &E, profile: &SiteProfile, now: u64) -> Result<String, UnblockError> {
        let Some(job_id) = profile.job_id(card) else {
            log::warn!("Could not find job ID for this card; not unblocking");
            return Err(UnblockError::MissingJobId);
        };

        card.set_attribute(UNBLOCKED_ATTR, "true");
        self.show(card, now);
        log::info!("Unblocked specific job with ID: {job_id}");
        Ok(job_id)
    }

    /// Clear reveal transitions that are due. Cards hidden again in the
    /// meantime keep their hide transition.
    pub fn flush_cleanups(&mut self, now: u64) -> usize {
        let before = self.pending_cleanups.len();
        self.pending_cleanups.retain(|(card, due)| {
            if *due > now {
                return true;
            }
            if !is_hidden(card) {
                card.set_style("transition", "");
            }
            false
        });
        before - self.pending_cleanups.len()
    }

    pub fn next_cleanup(&self) -> Option<u64> {
        self.pending_cleanups.iter().map(|(_, due)| *due).min()
    }

    pub fn clear_pending(&mut self) {
        self.pending_cleanups.clear();
    }

    fn schedule_cleanup(&mut self, card: &E, due: u64) {
        match self.pending_cleanups.iter_mut().find(|(pending, _)| pending.same_node(card)) {
            Some(entry) => entry.1 = due,
            None => self.pending_cleanups.push((card.clone(), due)),
        }
    }
}

fn restore<E: Element>(card: &E) {
    card.remove_attribute(HIDDEN_ATTR);
    for property in RESTORED_PROPERTIES {
        card.set_style(property, "");
    }
    if card.has_attribute(POSITIONED_ATTR) {
        card.set_style("position", "");
        card.remove_attribute(POSITIONED_ATTR);
    }
}

fn attach_overlay<E: Element>(card: &E) -> bool {
    detach_overlay(card);

    let Some(overlay) = card.append_element("div") else {
        return false;
    };
    overlay.set_attribute("class", OVERLAY_CLASS);
    apply_style(&overlay, OVERLAY_STYLE);

    let Some(button) = overlay.append_element("button") else {
        overlay.remove();
        return false;
    };
    button.set_attribute("class", BUTTON_CLASS);
    button.set_attribute("type", "button");
    button.set_text(BUTTON_LABEL);
    apply_style(&button, BUTTON_STYLE);
    true
}

fn detach_overlay<E: Element>(card: &E) {
    if let Some(overlay) = card.query_selector(OVERLAY_SELECTOR) {
        overlay.remove();
    }
}
