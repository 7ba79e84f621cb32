//! In-memory document used by tests and by offline evaluation of saved
//! markup fixtures.
//!
//! Nodes are reference-counted with weak parent links, so handles behave like
//! browser node handles: cloning shares the node, and mutation through any
//! clone is visible through every other. Selectors are evaluated by `scraper`
//! (see [`super::markup`]).

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::markup::{self, Markup};
use super::{Document, Element};

#[derive(Debug, Clone)]
pub(crate) enum Child {
    Element(MemoryElement),
    Text(String),
}

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    attrs: Vec<(String, String)>,
    styles: Vec<(String, String)>,
    children: Vec<Child>,
    parent: Weak<RefCell<NodeData>>,
}

/// Element handle into an in-memory tree.
#[derive(Debug, Clone)]
pub struct MemoryElement(Rc<RefCell<NodeData>>);

impl MemoryElement {
    pub fn new(tag: &str) -> Self {
        Self(Rc::new(RefCell::new(NodeData {
            tag: tag.to_ascii_lowercase(),
            ..NodeData::default()
        })))
    }

    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_class(self, class: &str) -> Self {
        let merged = match self.attribute("class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.with_attr("class", &merged)
    }

    /// Top-level elements of an HTML fragment, as detached trees.
    pub fn parse_fragment(html: &str) -> Vec<MemoryElement> {
        markup::parse_fragment(html)
    }

    pub fn with_text(self, text: &str) -> Self {
        self.append_text(text);
        self
    }

    pub fn with_child(self, child: MemoryElement) -> Self {
        self.append_child(&child);
        self
    }

    pub fn append_text(&self, text: &str) {
        self.0.borrow_mut().children.push(Child::Text(text.to_string()));
    }

    /// Append `child`, detaching it from any previous parent first.
    pub fn append_child(&self, child: &MemoryElement) {
        child.remove();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.borrow_mut().children.push(Child::Element(child.clone()));
    }

    pub fn tag(&self) -> String {
        self.0.borrow().tag.clone()
    }

    pub fn parent(&self) -> Option<MemoryElement> {
        self.0.borrow().parent.upgrade().map(MemoryElement)
    }

    pub fn children(&self) -> Vec<MemoryElement> {
        self.0
            .borrow()
            .children
            .iter()
            .filter_map(|child| match child {
                Child::Element(el) => Some(el.clone()),
                Child::Text(_) => None,
            })
            .collect()
    }

    /// Inline style value, `None` when unset.
    pub fn style(&self, property: &str) -> Option<String> {
        self.0
            .borrow()
            .styles
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.clone())
    }

    pub(crate) fn attributes(&self) -> Vec<(String, String)> {
        self.0.borrow().attrs.clone()
    }

    pub(crate) fn child_nodes(&self) -> Vec<Child> {
        self.0.borrow().children.clone()
    }

    /// Outermost ancestor, or `self` when detached.
    fn top(&self) -> MemoryElement {
        let mut top = self.clone();
        while let Some(parent) = top.parent() {
            top = parent;
        }
        top
    }

    fn contains(&self, other: &MemoryElement) -> bool {
        let mut current = other.parent();
        while let Some(node) = current {
            if node.same_node(self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Descendants matching `selector`. Ancestors outside `self` take part in
    /// matching, as with a browser's scoped queries.
    fn select_within(&self, selector: &str) -> Vec<MemoryElement> {
        Markup::render(&self.top())
            .select(selector)
            .into_iter()
            .filter(|el| self.contains(el))
            .collect()
    }

    fn collect_text(&self, skip: &[MemoryElement], out: &mut String) {
        for child in self.child_nodes() {
            match child {
                Child::Text(text) => out.push_str(&text),
                Child::Element(el) if skip.iter().any(|s| s.same_node(&el)) => {}
                Child::Element(el) => el.collect_text(skip, out),
            }
        }
    }
}

impl Element for MemoryElement {
    fn attribute(&self, name: &str) -> Option<String> {
        self.0
            .borrow()
            .attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    fn set_attribute(&self, name: &str, value: &str) {
        let mut node = self.0.borrow_mut();
        match node.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => node.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attribute(&self, name: &str) {
        self.0.borrow_mut().attrs.retain(|(key, _)| key != name);
    }

    fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&[], &mut out);
        out
    }

    fn text_content_excluding(&self, selector: &str) -> String {
        let skip = self.select_within(selector);
        let mut out = String::new();
        self.collect_text(&skip, &mut out);
        out
    }

    fn query_selector(&self, selector: &str) -> Option<Self> {
        self.select_within(selector).into_iter().next()
    }

    fn matches(&self, selector: &str) -> bool {
        Markup::render(&self.top())
            .select(selector)
            .iter()
            .any(|el| el.same_node(self))
    }

    fn set_style(&self, property: &str, value: &str) {
        let mut node = self.0.borrow_mut();
        node.styles.retain(|(name, _)| name != property);
        if !value.is_empty() {
            node.styles.push((property.to_string(), value.to_string()));
        }
    }

    fn is_statically_positioned(&self) -> bool {
        self.style("position").map_or(true, |value| value == "static")
    }

    fn append_element(&self, tag: &str) -> Option<Self> {
        let child = MemoryElement::new(tag);
        self.append_child(&child);
        Some(child)
    }

    fn set_text(&self, text: &str) {
        let mut node = self.0.borrow_mut();
        for child in node.children.drain(..) {
            if let Child::Element(el) = child {
                el.0.borrow_mut().parent = Weak::new();
            }
        }
        node.children.push(Child::Text(text.to_string()));
    }

    fn remove(&self) {
        let Some(parent) = self.parent() else {
            return;
        };
        parent.0.borrow_mut().children.retain(|child| match child {
            Child::Element(el) => !Rc::ptr_eq(&el.0, &self.0),
            Child::Text(_) => true,
        });
        self.0.borrow_mut().parent = Weak::new();
    }

    fn same_node(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A document with an `<html><body>` skeleton.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    root: MemoryElement,
    body: MemoryElement,
}

impl MemoryDocument {
    pub fn new() -> Self {
        let body = MemoryElement::new("body");
        let root = MemoryElement::new("html").with_child(body.clone());
        Self { root, body }
    }

    pub fn body(&self) -> &MemoryElement {
        &self.body
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    type Element = MemoryElement;

    fn query_selector_all(&self, selector: &str) -> Vec<MemoryElement> {
        Markup::render(&self.root).select(selector)
    }
}
