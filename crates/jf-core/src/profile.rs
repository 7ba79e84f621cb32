//! Site Profiles
//!
//! Everything site-specific lives here as static data: how to find job cards,
//! where the company name is, and how each listing status is shown. The
//! selectors track markup the sites change without notice, so every lookup
//! degrades to "absent" / "false" instead of failing.

use serde::Deserialize;

use crate::dom::{Document, Element};

/// Supported job sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    LinkedIn,
    Indeed,
}

/// Listing statuses a user can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Applied,
    Promoted,
    Reposted,
}

/// How one status is detected on one site.
#[derive(Debug, Clone, Copy)]
pub struct StatusRule {
    /// Lower-case words looked for in the card's footer text.
    pub footer_keywords: &'static [&'static str],
    /// Fallback selectors; any descendant match means the status is present.
    pub indicators: &'static [&'static str],
}

/// Per-site strategy bundle. Selected once per page load.
#[derive(Debug)]
pub struct SiteProfile {
    pub site: Site,
    /// Selector enumerating every job card in the document.
    pub card_selector: &'static str,
    /// Cheap selectors the change detector tests added nodes against.
    pub card_hints: &'static [&'static str],
    /// Attribute carrying a JSON company record, when the site has one.
    pub company_info_attr: Option<&'static str>,
    /// Company-name selectors, tried in order.
    pub company_selectors: &'static [&'static str],
    /// Region holding the status line ("Applied 2 days ago", "Promoted").
    pub footer_selector: Option<&'static str>,
    /// Attribute holding a stable per-listing id.
    pub job_id_attr: &'static str,
    pub applied: StatusRule,
    pub promoted: StatusRule,
    pub reposted: StatusRule,
}

pub static LINKEDIN: SiteProfile = SiteProfile {
    site: Site::LinkedIn,
    card_selector: r#"li[data-occludable-job-id], [data-entity-urn*="jobPosting"]"#,
    card_hints: &[
        r#"[data-entity-urn*="jobPosting"]"#,
        "li[data-occludable-job-id]",
    ],
    company_info_attr: Some("fh-webext-company-info"),
    company_selectors: &[
        ".job-card-container__company-name",
        ".job-card-container__subtitle",
        r#"[data-testid="job-card-company-name"]"#,
        ".job-card-container__primary-description",
        ".artdeco-entity-lockup__subtitle",
    ],
    footer_selector: Some(".job-card-list__footer-wrapper"),
    job_id_attr: "data-occludable-job-id",
    applied: StatusRule {
        footer_keywords: &["applied"],
        indicators: &[
            r#"[data-testid="job-card-applied"]"#,
            ".job-card-container__applied",
            ".artdeco-inline-feedback--success",
            r#"[aria-label*="Applied"]"#,
            ".job-card-container__status--applied",
        ],
    },
    promoted: StatusRule {
        footer_keywords: &["promoted", "sponsored"],
        indicators: &[
            r#"[data-testid="job-card-promoted"]"#,
            ".job-card-container__promoted",
            r#"[aria-label*="Promoted"]"#,
            ".job-card-container__sponsored",
            r#"[data-testid="job-card-sponsored"]"#,
        ],
    },
    reposted: StatusRule {
        footer_keywords: &["reposted"],
        indicators: &[
            r#"[data-testid="job-card-reposted"]"#,
            ".job-card-container__reposted",
            r#"[aria-label*="Reposted"]"#,
            ".job-card-container__repost",
        ],
    },
};

pub static INDEED: SiteProfile = SiteProfile {
    site: Site::Indeed,
    card_selector: ".job_seen_beacon",
    card_hints: &[".job_seen_beacon", ".jobsearch-ResultsList > div"],
    company_info_attr: None,
    company_selectors: &[
        r#"[data-testid="company-name"]"#,
        ".companyName",
        ".company",
        r#"[data-testid="jobsearch-CompanyInfoContainer"]"#,
    ],
    footer_selector: None,
    job_id_attr: "data-jk",
    applied: StatusRule {
        footer_keywords: &[],
        indicators: &[
            r#"[data-testid="applied-job"]"#,
            ".jobsearch-ResultsList .applied",
            r#"[aria-label*="Applied"]"#,
        ],
    },
    promoted: StatusRule {
        footer_keywords: &[],
        indicators: &[
            r#"[data-testid="promoted-job"]"#,
            ".jobsearch-ResultsList .promoted",
            r#"[aria-label*="Promoted"]"#,
            ".jobsearch-ResultsList .sponsored",
        ],
    },
    reposted: StatusRule {
        footer_keywords: &[],
        indicators: &[
            r#"[data-testid="reposted-job"]"#,
            ".jobsearch-ResultsList .reposted",
            r#"[aria-label*="Reposted"]"#,
        ],
    },
};

/// Machine-readable company record some cards carry.
#[derive(Debug, Deserialize)]
struct CompanyInfo {
    company_name: Option<String>,
}

impl SiteProfile {
    /// Pick the profile for a page hostname.
    ///
    /// LinkedIn matches `linkedin.com` and its subdomains. Indeed runs
    /// country sites (`uk.indeed.com`, `indeed.co.uk`, `ca.indeed.com`), so any
    /// host with an `indeed` label followed by a public suffix matches.
    pub fn for_host(host: &str) -> Option<&'static SiteProfile> {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        let labels: Vec<&str> = host.split('.').collect();

        if host == "linkedin.com" || host.ends_with(".linkedin.com") {
            return Some(&LINKEDIN);
        }
        if let Some(pos) = labels.iter().position(|label| *label == "indeed") {
            if pos + 1 < labels.len() {
                return Some(&INDEED);
            }
        }
        None
    }

    pub fn status_rule(&self, status: JobStatus) -> &StatusRule {
        match status {
            JobStatus::Applied => &self.applied,
            JobStatus::Promoted => &self.promoted,
            JobStatus::Reposted => &self.reposted,
        }
    }

    /// Every card currently in the document. A node reachable through more
    /// than one selector appears once.
    pub fn enumerate_cards<D: Document>(&self, doc: &D) -> Vec<D::Element> {
        let mut cards: Vec<D::Element> = Vec::new();
        for card in doc.query_selector_all(self.card_selector) {
            if !cards.iter().any(|seen| seen.same_node(&card)) {
                cards.push(card);
            }
        }
        cards
    }

    /// Best-effort company name: structured data first, then markup.
    pub fn extract_company<E: Element>(&self, card: &E) -> Option<String> {
        if let Some(name) = self.company_from_attribute(card) {
            return Some(name);
        }

        self.company_selectors.iter().find_map(|selector| {
            let text = card.query_selector(selector)?.text_content();
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
    }

    fn company_from_attribute<E: Element>(&self, card: &E) -> Option<String> {
        let attr = self.company_info_attr?;
        let raw = card.attribute(attr)?;
        match serde_json::from_str::<CompanyInfo>(&raw) {
            Ok(info) => info
                .company_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            Err(err) => {
                log::debug!("Unreadable {attr} attribute, falling back to markup: {err}");
                None
            }
        }
    }

    /// Lower-cased, trimmed footer text, or `None` if the card has no footer.
    pub fn footer_text<E: Element>(&self, card: &E) -> Option<String> {
        let footer = card.query_selector(self.footer_selector?)?;
        Some(footer.text_content().trim().to_lowercase())
    }

    /// Footer keyword first, then indicator selectors.
    pub fn has_status<E: Element>(&self, card: &E, status: JobStatus) -> bool {
        let rule = self.status_rule(status);

        if !rule.footer_keywords.is_empty() {
            if let Some(footer) = self.footer_text(card) {
                if rule.footer_keywords.iter().any(|keyword| footer.contains(keyword)) {
                    return true;
                }
            }
        }

        rule.indicators
            .iter()
            .any(|selector| card.query_selector(selector).is_some())
    }

    pub fn is_applied<E: Element>(&self, card: &E) -> bool {
        self.has_status(card, JobStatus::Applied)
    }

    pub fn is_promoted<E: Element>(&self, card: &E) -> bool {
        self.has_status(card, JobStatus::Promoted)
    }

    pub fn is_reposted<E: Element>(&self, card: &E) -> bool {
        self.has_status(card, JobStatus::Reposted)
    }

    /// Whether a freshly inserted node is, or contains, something card-like.
    pub fn looks_like_card<E: Element>(&self, node: &E) -> bool {
        self.card_hints
            .iter()
            .any(|hint| node.matches(hint) || node.query_selector(hint).is_some())
    }

    /// The stable listing id, if the card carries a non-blank one.
    ///
    /// Read from the card root first, then from the first descendant carrying
    /// the attribute (Indeed puts `data-jk` on the title link).
    pub fn job_id<E: Element>(&self, card: &E) -> Option<String> {
        let non_blank = |id: String| {
            let id = id.trim();
            (!id.is_empty()).then(|| id.to_string())
        };
        card.attribute(self.job_id_attr).and_then(non_blank).or_else(|| {
            card.query_selector(&format!("[{}]", self.job_id_attr))
                .and_then(|inner| inner.attribute(self.job_id_attr))
                .and_then(non_blank)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MemoryDocument, MemoryElement};

    fn linkedin_card(id: &str) -> MemoryElement {
        MemoryElement::new("li").with_attr("data-occludable-job-id", id)
    }

    #[test]
    fn test_for_host() {
        assert_eq!(SiteProfile::for_host("www.linkedin.com").map(|p| p.site), Some(Site::LinkedIn));
        assert_eq!(SiteProfile::for_host("linkedin.com").map(|p| p.site), Some(Site::LinkedIn));
        assert_eq!(SiteProfile::for_host("www.indeed.com").map(|p| p.site), Some(Site::Indeed));
        assert_eq!(SiteProfile::for_host("uk.indeed.com").map(|p| p.site), Some(Site::Indeed));
        assert_eq!(SiteProfile::for_host("indeed.co.uk").map(|p| p.site), Some(Site::Indeed));
        assert!(SiteProfile::for_host("notlinkedin.com").is_none());
        assert!(SiteProfile::for_host("example.com").is_none());
        assert!(SiteProfile::for_host("indeed").is_none());
    }

    #[test]
    fn test_enumerate_cards_dedups_overlapping_selectors() {
        let doc = MemoryDocument::new();
        doc.body().append_child(
            &linkedin_card("1").with_attr("data-entity-urn", "urn:li:jobPosting:1"),
        );
        doc.body().append_child(&linkedin_card("2"));
        assert_eq!(LINKEDIN.enumerate_cards(&doc).len(), 2);
        assert!(INDEED.enumerate_cards(&doc).is_empty());
    }

    #[test]
    fn test_extract_company_prefers_structured_data() {
        let card = linkedin_card("1")
            .with_attr("fh-webext-company-info", r#"{"company_name":"Globex"}"#)
            .with_child(
                MemoryElement::new("div")
                    .with_class("artdeco-entity-lockup__subtitle")
                    .with_text("Initech"),
            );
        assert_eq!(LINKEDIN.extract_company(&card).as_deref(), Some("Globex"));
    }

    #[test]
    fn test_extract_company_malformed_json_falls_through() {
        let card = linkedin_card("1")
            .with_attr("fh-webext-company-info", "{bad json")
            .with_child(
                MemoryElement::new("div")
                    .with_class("artdeco-entity-lockup__subtitle")
                    .with_text("  Initech \n"),
            );
        assert_eq!(LINKEDIN.extract_company(&card).as_deref(), Some("Initech"));
    }

    #[test]
    fn test_extract_company_skips_blank_markup() {
        let card = MemoryElement::new("div")
            .with_class("job_seen_beacon")
            .with_child(MemoryElement::new("span").with_attr("data-testid", "company-name").with_text("   "))
            .with_child(MemoryElement::new("span").with_class("companyName").with_text("Umbrella"));
        assert_eq!(INDEED.extract_company(&card).as_deref(), Some("Umbrella"));
        assert_eq!(INDEED.extract_company(&MemoryElement::new("div")), None);
    }

    #[test]
    fn test_footer_keywords() {
        let card = linkedin_card("1").with_child(
            MemoryElement::new("ul")
                .with_class("job-card-list__footer-wrapper")
                .with_text("Applied 2 days ago"),
        );
        assert!(LINKEDIN.is_applied(&card));
        assert!(!LINKEDIN.is_promoted(&card));
        assert!(!LINKEDIN.is_reposted(&card));

        let card = linkedin_card("2").with_child(
            MemoryElement::new("ul")
                .with_class("job-card-list__footer-wrapper")
                .with_text("Sponsored"),
        );
        assert!(LINKEDIN.is_promoted(&card));
    }

    #[test]
    fn test_indicator_fallback() {
        let card = linkedin_card("1").with_child(
            MemoryElement::new("span").with_attr("aria-label", "Reposted 1 week ago"),
        );
        assert!(LINKEDIN.is_reposted(&card));

        let doc = MemoryDocument::new();
        let card = MemoryElement::new("div")
            .with_class("job_seen_beacon")
            .with_child(MemoryElement::new("span").with_attr("data-testid", "applied-job"));
        doc.body().append_child(&card);
        assert!(INDEED.is_applied(&card));
        assert!(!INDEED.is_promoted(&card));
    }

    #[test]
    fn test_looks_like_card() {
        let wrapper = MemoryElement::new("div").with_child(linkedin_card("1"));
        assert!(LINKEDIN.looks_like_card(&wrapper));
        assert!(LINKEDIN.looks_like_card(&linkedin_card("2")));
        assert!(!LINKEDIN.looks_like_card(&MemoryElement::new("span")));
    }

    #[test]
    fn test_job_id() {
        assert_eq!(LINKEDIN.job_id(&linkedin_card("42")).as_deref(), Some("42"));
        assert_eq!(LINKEDIN.job_id(&linkedin_card(" ")), None);
        assert_eq!(LINKEDIN.job_id(&MemoryElement::new("li")), None);

        let indeed = MemoryElement::parse_fragment(
            r#"<div class="job_seen_beacon"><h2><a class="jcs-JobTitle" data-jk="f00ba4">Engineer</a></h2></div>"#,
        )
        .remove(0);
        assert_eq!(INDEED.job_id(&indeed).as_deref(), Some("f00ba4"));
        let bare = MemoryElement::new("div").with_class("job_seen_beacon");
        assert_eq!(INDEED.job_id(&bare), None);
    }
}
