//! Selector evaluation for the in-memory tree, backed by `scraper`.
//!
//! The tree is rendered to markup with every element tagged by its position
//! in a handle table, parsed once, and queried with `scraper::Selector`.
//! Matches map back to live handles through that tag.

use scraper::{ElementRef, Html, Node, Selector};

use super::memory::{Child, MemoryElement};
use super::Element;

/// Attribute carrying each element's index into the handle table.
pub(crate) const NODE_ATTR: &str = "data-memory-node";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// A parsed rendering of one tree, rooted at its topmost element.
pub(crate) struct Markup {
    html: Html,
    nodes: Vec<MemoryElement>,
}

impl Markup {
    pub(crate) fn render(root: &MemoryElement) -> Self {
        let mut out = String::new();
        let mut nodes = Vec::new();

        let html = if root.tag() == "html" {
            out.push_str("<!DOCTYPE html>");
            render_element(root, &mut out, &mut nodes);
            Html::parse_document(&out)
        } else {
            render_element(root, &mut out, &mut nodes);
            Html::parse_fragment(&out)
        };
        Self { html, nodes }
    }

    /// Handles matching `selector`, in document order. A selector that does
    /// not parse matches nothing.
    pub(crate) fn select(&self, selector: &str) -> Vec<MemoryElement> {
        let Ok(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.html
            .select(&selector)
            .filter_map(|element| element.value().attr(NODE_ATTR))
            .filter_map(|index| index.parse::<usize>().ok())
            .filter_map(|index| self.nodes.get(index).cloned())
            .collect()
    }
}

fn render_element(element: &MemoryElement, out: &mut String, nodes: &mut Vec<MemoryElement>) {
    let tag = element.tag();
    let index = nodes.len();
    nodes.push(element.clone());

    out.push('<');
    out.push_str(&tag);
    for (name, value) in element.attributes() {
        if name == NODE_ATTR {
            continue;
        }
        out.push(' ');
        out.push_str(&name);
        out.push_str("=\"");
        escape_into(&value, true, out);
        out.push('"');
    }
    out.push_str(&format!(" {NODE_ATTR}=\"{index}\">"));

    if VOID_ELEMENTS.contains(&tag.as_str()) {
        return;
    }

    for child in element.child_nodes() {
        match child {
            Child::Element(child) => render_element(&child, out, nodes),
            Child::Text(text) => escape_into(&text, false, out),
        }
    }

    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

/// Convert the top-level elements of an HTML fragment into detached handles.
pub(crate) fn parse_fragment(markup: &str) -> Vec<MemoryElement> {
    let fragment = Html::parse_fragment(markup);
    fragment
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .map(convert)
        .collect()
}

fn convert(source: ElementRef<'_>) -> MemoryElement {
    let element = MemoryElement::new(source.value().name());
    for (name, value) in source.value().attrs() {
        element.set_attribute(name, value);
    }
    for child in source.children() {
        match child.value() {
            Node::Text(text) => element.append_text(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    element.append_child(&convert(child));
                }
            }
            _ => {}
        }
    }
    element
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_escapes_text_and_attributes() {
        let el = MemoryElement::new("div")
            .with_attr("title", r#"say "hi" & go"#)
            .with_text("<b>Acme & Co</b>");
        let markup = Markup::render(&el);

        let found = markup.select(r#"div[title='say "hi" & go']"#);
        assert_eq!(found.len(), 1);
        assert!(found[0].same_node(&el));
        assert!(markup.select("b").is_empty());
    }

    #[test]
    fn test_select_maps_back_to_handles() {
        let list = MemoryElement::new("ul")
            .with_child(MemoryElement::new("li").with_attr("data-jk", "a"))
            .with_child(MemoryElement::new("li").with_attr("data-jk", "b"));
        let found = Markup::render(&list).select("ul > li");
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].attribute("data-jk").as_deref(), Some("b"));
    }

    #[test]
    fn test_bad_selector_matches_nothing() {
        let markup = Markup::render(&MemoryElement::new("div"));
        assert!(markup.select("div:::").is_empty());
        assert!(markup.select("").is_empty());
    }

    #[test]
    fn test_parse_fragment() {
        let parsed = parse_fragment(
            r#"<li data-occludable-job-id="7"><span class="company">Initech</span> Austin</li><li></li>"#,
        );
        assert_eq!(parsed.len(), 2);
        let card = &parsed[0];
        assert_eq!(card.tag(), "li");
        assert_eq!(card.attribute("data-occludable-job-id").as_deref(), Some("7"));
        assert_eq!(card.text_content(), "Initech Austin");
        assert!(card.query_selector("span.company").is_some());
    }
}
