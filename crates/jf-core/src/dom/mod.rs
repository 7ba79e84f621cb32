//! Document Abstraction
//!
//! The engine never touches a concrete DOM. It works against the two traits
//! below, which the wasm runtime implements over `web-sys` and which
//! [`memory`] implements for tests, with `scraper` evaluating selectors.
//!
//! Element handles are cheap, clonable references to a live node; mutation
//! goes through `&self` exactly like a browser node handle. Selector strings
//! are passed through verbatim. A host that cannot evaluate a selector must
//! report "no match" rather than fail.

mod markup;
pub mod memory;

pub use memory::{MemoryDocument, MemoryElement};

/// A handle to one live element.
pub trait Element: Clone {
    /// Attribute value, `None` when absent.
    fn attribute(&self, name: &str) -> Option<String>;

    fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    fn set_attribute(&self, name: &str, value: &str);

    fn remove_attribute(&self, name: &str);

    /// Concatenated text of every descendant text node.
    fn text_content(&self) -> String;

    /// Like [`Element::text_content`], leaving out every descendant subtree
    /// matching `selector`.
    fn text_content_excluding(&self, selector: &str) -> String;

    /// First descendant matching `selector` in document order.
    fn query_selector(&self, selector: &str) -> Option<Self>;

    /// Whether this element itself matches `selector`.
    fn matches(&self, selector: &str) -> bool;

    /// Set an inline style property. An empty value removes the property.
    fn set_style(&self, property: &str, value: &str);

    /// True when the computed `position` is `static`.
    fn is_statically_positioned(&self) -> bool;

    /// Create a new element with `tag` and append it as the last child.
    fn append_element(&self, tag: &str) -> Option<Self>;

    /// Replace all children with a single text node.
    fn set_text(&self, text: &str);

    /// Detach this element from its parent.
    fn remove(&self);

    /// Node identity, not structural equality.
    fn same_node(&self, other: &Self) -> bool;
}

/// The document a filter engine runs against.
pub trait Document {
    type Element: Element;

    /// Every element matching `selector`, in document order, without duplicates.
    fn query_selector_all(&self, selector: &str) -> Vec<Self::Element>;
}
