//! End-to-end filtering scenarios against an in-memory results page.

use jf_core::visibility::{state_of, HIDDEN_SELECTOR, OVERLAY_SELECTOR};
use jf_core::{
    BlockList, CardState, Document, Element, FilterConfig, FilterEngine, FilterSettings, ManualClock,
    MemoryDocument, MemoryElement, PassReport, Timing,
};

type Engine = FilterEngine<MemoryDocument, ManualClock>;

struct Page {
    doc: MemoryDocument,
    list: MemoryElement,
    clock: ManualClock,
}

impl Page {
    fn linkedin() -> Self {
        let doc = MemoryDocument::new();
        let list = MemoryElement::new("ul").with_class("scaffold-layout__list");
        doc.body().append_child(&list);
        Self { doc, list, clock: ManualClock::new(0) }
    }

    fn card(&self, id: &str, company: &str, footer: &str) -> MemoryElement {
        let card = MemoryElement::new("li")
            .with_attr("data-occludable-job-id", id)
            .with_child(
                MemoryElement::new("div")
                    .with_class("artdeco-entity-lockup__subtitle")
                    .with_text(company),
            )
            .with_child(
                MemoryElement::new("ul")
                    .with_class("job-card-list__footer-wrapper")
                    .with_text(footer),
            );
        self.list.append_child(&card);
        card
    }

    fn engine(&self) -> Engine {
        FilterEngine::for_host(self.doc.clone(), self.clock.clone(), "www.linkedin.com", Timing::default())
    }
}

fn config(companies: &[&str], settings: FilterSettings) -> FilterConfig {
    FilterConfig::new(companies.iter().copied().collect::<BlockList>(), settings)
}

fn hidden(cards: &[&MemoryElement]) -> Vec<bool> {
    cards.iter().map(|card| state_of(*card) == CardState::Hidden).collect()
}

#[test]
fn test_block_list_scenario() {
    let page = Page::linkedin();
    let acme = page.card("1", "Acme Corp International", "");
    let initech = page.card("2", "Initech", "");
    let lower = page.card("3", "acme corp", "");

    let mut engine = page.engine();
    engine.start(FilterConfig::default());
    engine.update_config(config(&["Acme Corp"], FilterSettings::default()));

    assert_eq!(hidden(&[&acme, &initech, &lower]), vec![true, false, true]);
    assert!(acme.query_selector(OVERLAY_SELECTOR).is_some());
    assert!(initech.query_selector(OVERLAY_SELECTOR).is_none());
}

#[test]
fn test_full_pass_scenario() {
    let page = Page::linkedin();
    let acme = page.card("1", "Acme Corp International", "");
    let initech = page.card("2", "Initech", "");
    let lower = page.card("3", "acme corp", "");

    let mut engine = page.engine();
    engine.start(config(&["Acme Corp"], FilterSettings::default()));
    assert_eq!(hidden(&[&acme, &initech, &lower]), vec![true, false, true]);
    assert_eq!(engine.full_pass(), PassReport::default());
}

#[test]
fn test_applied_footer_hides_with_empty_block_list() {
    let page = Page::linkedin();
    let card = page.card("1", "Initech", "Applied 2 days ago");

    let mut engine = page.engine();
    engine.start(config(&[], FilterSettings { hide_applied: true, ..FilterSettings::default() }));
    assert_eq!(state_of(&card), CardState::Hidden);
}

#[test]
fn test_malformed_structured_data_falls_through() {
    let page = Page::linkedin();
    let card = page.card("1", "Initech", "");
    card.set_attribute("fh-webext-company-info", "{bad json");

    let mut engine = page.engine();
    engine.start(config(&["Initech"], FilterSettings::default()));
    assert_eq!(state_of(&card), CardState::Hidden);
    assert_eq!(engine.profile().unwrap().extract_company(&card).as_deref(), Some("Initech"));
}

#[test]
fn test_reconcile_is_idempotent() {
    let page = Page::linkedin();
    page.card("1", "Acme", "Promoted");
    page.card("2", "Initech", "Reposted");
    page.card("3", "Globex", "");

    let mut engine = page.engine();
    engine.start(FilterConfig::default());

    let settings = FilterSettings { hide_reposted: true, ..FilterSettings::default() };
    let first = engine.update_config(config(&["Acme"], settings));
    assert_eq!(first, PassReport { hidden: 2, shown: 0 });
    assert_eq!(engine.reconcile(), PassReport::default());
    assert_eq!(engine.full_pass(), PassReport::default());
}

#[test]
fn test_override_survives_every_pass() {
    let page = Page::linkedin();
    let card = page.card("77", "Acme", "Promoted");

    let mut engine = page.engine();
    engine.start(config(&["Acme"], FilterSettings::default()));
    assert_eq!(state_of(&card), CardState::Hidden);

    assert_eq!(engine.unblock_one(&card).as_deref(), Ok("77"));
    assert_eq!(state_of(&card), CardState::UnblockedOverride);

    let everything = FilterSettings { hide_applied: true, hide_promoted: true, hide_reposted: true };
    engine.update_config(config(&["Acme", "acme"], everything));
    engine.full_pass();
    engine.reconcile();
    engine.set_enabled(false);
    engine.set_enabled(true);
    page.clock.set(10_000);
    engine.poll();

    assert_eq!(state_of(&card), CardState::UnblockedOverride);
    assert!(card.query_selector(OVERLAY_SELECTOR).is_none());
}

#[test]
fn test_unblock_without_job_id_changes_nothing() {
    let page = Page::linkedin();
    let card = MemoryElement::new("div")
        .with_attr("data-entity-urn", "urn:li:fsd_jobPosting:5")
        .with_text("Acme");
    page.list.append_child(&card);

    let mut engine = page.engine();
    engine.start(config(&["Acme"], FilterSettings::default()));
    assert_eq!(state_of(&card), CardState::Hidden);

    assert!(engine.unblock_one(&card).is_err());
    assert_eq!(state_of(&card), CardState::Hidden);
    assert!(card.query_selector(OVERLAY_SELECTOR).is_some());
}

#[test]
fn test_disable_enable_round_trip() {
    let page = Page::linkedin();
    let cards = [
        page.card("1", "Acme", ""),
        page.card("2", "Initech", "Promoted"),
        page.card("3", "Globex", ""),
        page.card("4", "Umbrella", "Applied"),
    ];
    let refs: Vec<&MemoryElement> = cards.iter().collect();

    let mut engine = page.engine();
    let settings = FilterSettings { hide_promoted: true, hide_applied: true, ..FilterSettings::default() };
    engine.start(config(&["Acme"], settings));
    let before = hidden(&refs);
    assert_eq!(before, vec![true, true, false, true]);

    let off = engine.set_enabled(false);
    assert_eq!(off.shown, 3);
    assert!(page.doc.query_selector_all(HIDDEN_SELECTOR).is_empty());
    assert!(page.doc.query_selector_all(OVERLAY_SELECTOR).is_empty());

    let on = engine.set_enabled(true);
    assert_eq!(on.hidden, 3);
    assert_eq!(hidden(&refs), before);
}

#[test]
fn test_relaxing_a_filter_reveals() {
    let page = Page::linkedin();
    let card = page.card("1", "Initech", "Promoted");

    let mut engine = page.engine();
    engine.start(config(&[], FilterSettings { hide_promoted: true, ..FilterSettings::default() }));
    assert_eq!(state_of(&card), CardState::Hidden);

    let report = engine.update_config(config(&[], FilterSettings::default()));
    assert_eq!(report, PassReport { hidden: 0, shown: 1 });
    assert_eq!(state_of(&card), CardState::Visible);
    assert!(card.query_selector(OVERLAY_SELECTOR).is_none());
}

#[test]
fn test_overlay_label_does_not_pin_hidden_cards() {
    let page = Page::linkedin();
    let card = page.card("1", "Initech", "Promoted");

    let mut engine = page.engine();
    engine.start(config(&["Block"], FilterSettings { hide_promoted: true, ..FilterSettings::default() }));
    assert_eq!(state_of(&card), CardState::Hidden);

    let report = engine.update_config(config(&["Block"], FilterSettings::default()));
    assert_eq!(report, PassReport { hidden: 0, shown: 1 });
    assert_eq!(state_of(&card), CardState::Visible);
}

#[test]
fn test_blank_block_list_entries_hide_nothing() {
    let page = Page::linkedin();
    let card = page.card("1", "Initech", "");

    let mut engine = page.engine();
    engine.start(config(&["", "   "], FilterSettings::default()));
    assert_eq!(state_of(&card), CardState::Visible);
}

#[test]
fn test_insert_burst_coalesces_into_one_pass() {
    let page = Page::linkedin();
    let mut engine = page.engine();
    engine.start(config(&["Acme"], FilterSettings::default()));

    // Insertions at 10, 40 and 70 ms.
    for (i, gap) in [10u64, 30, 30].into_iter().enumerate() {
        page.clock.advance(gap);
        let card = page.card(&format!("n{i}"), "Acme", "");
        assert!(engine.on_added_nodes(&[card]));
    }

    page.clock.advance(99);
    assert_eq!(engine.poll(), PassReport::default());
    page.clock.advance(1);
    assert_eq!(engine.poll(), PassReport { hidden: 3, shown: 0 });
    page.clock.advance(1);
    assert_eq!(engine.poll(), PassReport::default());
}

#[test]
fn test_indeed_page() {
    let doc = MemoryDocument::new();
    let results = MemoryElement::new("div").with_class("jobsearch-ResultsList");
    doc.body().append_child(&results);

    let sponsored = MemoryElement::new("div")
        .with_class("job_seen_beacon")
        .with_attr("data-jk", "abc")
        .with_child(MemoryElement::new("span").with_attr("data-testid", "company-name").with_text("Initech"))
        .with_child(MemoryElement::new("span").with_class("sponsored").with_text("Sponsored"));
    let plain = MemoryElement::new("div")
        .with_class("job_seen_beacon")
        .with_attr("data-jk", "def")
        .with_child(MemoryElement::new("span").with_attr("data-testid", "company-name").with_text("Globex"));
    results.append_child(&sponsored);
    results.append_child(&plain);

    let clock = ManualClock::new(0);
    let mut engine = FilterEngine::for_host(doc.clone(), clock, "www.indeed.com", Timing::default());
    engine.start(config(&[], FilterSettings { hide_promoted: true, ..FilterSettings::default() }));

    assert_eq!(state_of(&sponsored), CardState::Hidden);
    assert_eq!(state_of(&plain), CardState::Visible);
    assert_eq!(engine.unblock_one(&sponsored).as_deref(), Ok("abc"));
}

#[test]
fn test_indeed_unblock_reads_job_id_from_title_link() {
    let doc = MemoryDocument::new();
    for node in MemoryElement::parse_fragment(
        r#"<div class="jobsearch-ResultsList">
             <div class="job_seen_beacon">
               <h2 class="jobTitle"><a class="jcs-JobTitle" data-jk="9f1c">Backend Engineer</a></h2>
               <span data-testid="company-name">Acme</span>
             </div>
           </div>"#,
    ) {
        doc.body().append_child(&node);
    }

    let mut engine = FilterEngine::for_host(doc.clone(), ManualClock::new(0), "uk.indeed.com", Timing::default());
    engine.start(config(&["acme"], FilterSettings::default()));

    let card = doc.query_selector_all(".job_seen_beacon").remove(0);
    assert_eq!(state_of(&card), CardState::Hidden);
    assert_eq!(engine.unblock_one(&card).as_deref(), Ok("9f1c"));
    assert_eq!(state_of(&card), CardState::UnblockedOverride);
}
