//! `web-sys` implementation of the engine's document traits.

use jf_core::{Clock, Document, Element};
use wasm_bindgen::JsCast;

/// A live page element.
#[derive(Debug, Clone, PartialEq)]
pub struct WebElement(pub web_sys::Element);

impl WebElement {
    fn html(&self) -> Option<&web_sys::HtmlElement> {
        self.0.dyn_ref::<web_sys::HtmlElement>()
    }
}

impl Element for WebElement {
    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.0.has_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        let _ = self.0.set_attribute(name, value);
    }

    fn remove_attribute(&self, name: &str) {
        let _ = self.0.remove_attribute(name);
    }

    fn text_content(&self) -> String {
        self.0.text_content().unwrap_or_default()
    }

    fn text_content_excluding(&self, selector: &str) -> String {
        // Prune a detached copy so the live card is never touched.
        let Some(copy) = self
            .0
            .clone_node_with_deep(true)
            .ok()
            .and_then(|node| node.dyn_into::<web_sys::Element>().ok())
        else {
            return self.text_content();
        };
        if let Ok(nodes) = copy.query_selector_all(selector) {
            for idx in 0..nodes.length() {
                if let Some(element) = nodes.item(idx).and_then(|node| node.dyn_into::<web_sys::Element>().ok()) {
                    element.remove();
                }
            }
        }
        copy.text_content().unwrap_or_default()
    }

    fn query_selector(&self, selector: &str) -> Option<Self> {
        // A selector the browser rejects throws; treat it as no match.
        self.0.query_selector(selector).ok().flatten().map(WebElement)
    }

    fn matches(&self, selector: &str) -> bool {
        self.0.matches(selector).unwrap_or(false)
    }

    fn set_style(&self, property: &str, value: &str) {
        let Some(html) = self.html() else {
            return;
        };
        let style = html.style();
        if value.is_empty() {
            let _ = style.remove_property(property);
        } else {
            let _ = style.set_property(property, value);
        }
    }

    fn is_statically_positioned(&self) -> bool {
        let Some(window) = web_sys::window() else {
            return true;
        };
        match window.get_computed_style(&self.0) {
            Ok(Some(computed)) => computed
                .get_property_value("position")
                .map_or(true, |position| position.is_empty() || position == "static"),
            _ => true,
        }
    }

    fn append_element(&self, tag: &str) -> Option<Self> {
        let document = self.0.owner_document()?;
        let child = document.create_element(tag).ok()?;
        self.0.append_child(&child).ok()?;
        Some(WebElement(child))
    }

    fn set_text(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn remove(&self) {
        self.0.remove();
    }

    fn same_node(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

/// The page document.
#[derive(Debug, Clone)]
pub struct WebDocument(pub web_sys::Document);

impl Document for WebDocument {
    type Element = WebElement;

    fn query_selector_all(&self, selector: &str) -> Vec<WebElement> {
        let Ok(nodes) = self.0.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|idx| nodes.item(idx))
            .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
            .map(WebElement)
            .collect()
    }
}

/// Milliseconds from `performance.now()`.
#[derive(Debug, Clone)]
pub struct PerformanceClock(pub web_sys::Performance);

impl Clock for PerformanceClock {
    fn now_ms(&self) -> u64 {
        self.0.now().max(0.0) as u64
    }
}

/// Element nodes added by a batch of mutation records. Removals and
/// attribute changes are ignored.
pub fn added_elements(records: &js_sys::Array) -> Vec<WebElement> {
    let mut added = Vec::new();
    for record in records.iter() {
        let Ok(record) = record.dyn_into::<web_sys::MutationRecord>() else {
            continue;
        };
        if record.type_() != "childList" {
            continue;
        }
        let nodes = record.added_nodes();
        for idx in 0..nodes.length() {
            if let Some(element) = nodes.item(idx).and_then(|node| node.dyn_into::<web_sys::Element>().ok()) {
                added.push(WebElement(element));
            }
        }
    }
    added
}
