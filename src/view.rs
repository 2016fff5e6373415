//! Serializable UI description returned by route handlers.
//!
//! Views produce a plain node tree instead of live DOM, so routing, state and
//! the translation overlay can run (and be tested) headlessly. Markers used
//! by the translation overlay travel as ordinary attributes:
//! `data-i18n-key`, `data-i18n-params`, `data-i18n-format`, `data-i18n-attr`
//! and `data-i18n-ignore`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    Element(Element),
    Text(TextNode),
    /// Raw markup inserted by the `html` translation format.
    Raw { html: String },
}

impl Node {
    pub fn raw(html: impl Into<String>) -> Self {
        Node::Raw { html: html.into() }
    }

    pub fn to_html(&self) -> String {
        match self {
            Node::Element(el) => el.to_html(),
            Node::Text(t) => escape_html(&t.text),
            Node::Raw { html } => html.clone(),
        }
    }
}

/// A text node. The first value ever observed by the translation overlay is
/// captured into `original` and becomes the stable cache key for free-text
/// auto-translation; a later pass can therefore always restore or re-derive
/// the source-language string even after the visible text was replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            original: None,
        }
    }

    /// Remember the current text as the source-language original, unless an
    /// original was already captured by an earlier pass.
    pub fn capture_original(&mut self) {
        if self.original.is_none() {
            self.original = Some(self.text.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// First-captured values of translatable attributes, keyed by attribute
    /// name. Mirrors `TextNode::original`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub original_attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Remember the current value of `name` as its source-language original.
    pub fn capture_original_attr(&mut self, name: &str) {
        if !self.original_attrs.contains_key(name) {
            if let Some(value) = self.attrs.get(name) {
                self.original_attrs.insert(name.to_string(), value.clone());
            }
        }
    }

    pub fn original_attr(&self, name: &str) -> Option<&str> {
        self.original_attrs.get(name).map(String::as_str)
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_html(value));
            out.push('"');
        }
        out.push('>');
        for child in &self.children {
            out.push_str(&child.to_html());
        }
        out.push_str(&format!("</{}>", self.tag));
        out
    }
}

/// Builder-style element constructor used by view code.
pub fn el(tag: impl Into<String>) -> ElementBuilder {
    ElementBuilder {
        element: Element {
            tag: tag.into(),
            ..Element::default()
        },
    }
}

/// Plain text node constructor.
pub fn text(value: impl Into<String>) -> Node {
    Node::Text(TextNode::new(value))
}

pub struct ElementBuilder {
    element: Element,
}

impl ElementBuilder {
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.element.attrs.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.element.children.push(node.into());
        self
    }

    pub fn text(self, value: impl Into<String>) -> Self {
        self.child(text(value))
    }

    pub fn build(self) -> Node {
        Node::Element(self.element)
    }
}

impl From<ElementBuilder> for Node {
    fn from(builder: ElementBuilder) -> Self {
        builder.build()
    }
}

/// The single mount point rendered views are swapped into.
#[derive(Debug, Default)]
pub struct Mount {
    tree: Option<Node>,
    focused: bool,
    translating: bool,
}

impl Mount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear-then-insert in one step; no intermediate empty state is ever
    /// observable because nothing yields between the two.
    pub fn set_content(&mut self, tree: Node) {
        self.tree = Some(tree);
        self.focused = false;
    }

    /// Restore focus to the mount so keyboard and screen-reader users land at
    /// the top of the new content.
    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_translating(&mut self, active: bool) {
        self.translating = active;
    }

    pub fn is_translating(&self) -> bool {
        self.translating
    }

    pub fn tree(&self) -> Option<&Node> {
        self.tree.as_ref()
    }

    pub fn tree_mut(&mut self) -> Option<&mut Node> {
        self.tree.as_mut()
    }

    pub fn to_html(&self) -> String {
        self.tree.as_ref().map(Node::to_html).unwrap_or_default()
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_expected_tree() {
        let node = el("section")
            .attr("class", "hero")
            .child(el("h1").attr("data-i18n-key", "home.title").text("Hola"))
            .build();

        let Node::Element(section) = &node else {
            panic!("expected element");
        };
        assert_eq!(section.tag, "section");
        assert_eq!(section.attr("class"), Some("hero"));
        assert_eq!(section.children.len(), 1);
    }

    #[test]
    fn capture_original_is_first_write_wins() {
        let mut node = TextNode::new("Hola");
        node.capture_original();
        node.text = "Hello".into();
        node.capture_original();
        assert_eq!(node.original.as_deref(), Some("Hola"));
    }

    #[test]
    fn capture_original_attr_is_first_write_wins() {
        let mut element = Element {
            tag: "input".into(),
            ..Element::default()
        };
        element.set_attr("placeholder", "Tu nombre");
        element.capture_original_attr("placeholder");
        element.set_attr("placeholder", "Your name");
        element.capture_original_attr("placeholder");
        assert_eq!(element.original_attr("placeholder"), Some("Tu nombre"));
    }

    #[test]
    fn to_html_escapes_text_but_not_raw() {
        let node = el("p")
            .child(text("a < b"))
            .child(Node::raw("<strong>c</strong>"))
            .build();
        assert_eq!(node.to_html(), "<p>a &lt; b<strong>c</strong></p>");
    }

    #[test]
    fn mount_swap_resets_focus_until_restored() {
        let mut mount = Mount::new();
        mount.set_content(text("first"));
        mount.focus();
        assert!(mount.is_focused());

        mount.set_content(text("second"));
        assert!(!mount.is_focused());
        assert_eq!(mount.to_html(), "second");
    }

    #[test]
    fn node_tree_serializes() {
        let node = el("a").attr("href", "/home").text("Inicio").build();
        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(node, back);
    }
}
