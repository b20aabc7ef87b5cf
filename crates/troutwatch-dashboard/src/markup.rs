//! Owned markup tree rendered to HTML.
//!
//! Tiles hold their body as a list of [`Node`]s instead of a live
//! document, so the registry can be built, updated, and inspected without
//! a browser. Text and attribute values are escaped on render; only
//! [`Node::Raw`] is emitted verbatim.

use std::fmt::Write as _;

/// Elements rendered without a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

/// A node in a tile body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with attributes and children.
    Element(Element),
    /// Text content, escaped on render.
    Text(String),
    /// Trusted markup, emitted as-is.
    Raw(String),
}

impl Node {
    /// Text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Trusted markup node.
    pub fn raw(markup: impl Into<String>) -> Self {
        Self::Raw(markup.into())
    }

    /// Render to an HTML string.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    /// Append the rendered HTML to `out`.
    pub fn render_into(&self, out: &mut String) {
        match self {
            Self::Element(element) => element.render_into(out),
            Self::Text(text) => escape_into(text, out),
            Self::Raw(markup) => out.push_str(markup),
        }
    }

    /// Concatenated text content of this node and its descendants.
    ///
    /// Raw markup contributes nothing.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
            Self::Text(text) => out.push_str(text),
            Self::Raw(_) => {}
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// An HTML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, Option<String>)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an element with no attributes or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Shorthand for `<div>`.
    pub fn div() -> Self {
        Self::new("div")
    }

    /// Shorthand for `<span>`.
    pub fn span() -> Self {
        Self::new("span")
    }

    /// Set an attribute, replacing any previous value.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name.into(), Some(value.into()));
        self
    }

    /// Set a boolean attribute (rendered without a value).
    #[must_use]
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.set_attr(name.into(), None);
        self
    }

    /// Set the `class` attribute.
    #[must_use]
    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    /// Set the `style` attribute.
    #[must_use]
    pub fn style(self, style: impl Into<String>) -> Self {
        self.attr("style", style)
    }

    /// Append a child node.
    #[must_use]
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append a text child.
    #[must_use]
    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    /// Tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Value of an attribute. Boolean attributes yield `Some("")`.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    /// Child nodes.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Mutable child nodes.
    pub const fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Render to an HTML string.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    /// Append the rendered HTML to `out`.
    pub fn render_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            if let Some(value) = value {
                out.push_str("=\"");
                escape_into(value, out);
                out.push('"');
            }
        }
        out.push('>');

        if VOID_TAGS.contains(&self.tag.as_str()) {
            return;
        }

        for child in &self.children {
            child.render_into(out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }

    fn set_attr(&mut self, name: String, value: Option<String>) {
        if let Some(slot) = self.attrs.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.attrs.push((name, value));
        }
    }
}

/// Render a list of nodes to one HTML string.
pub fn render_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.render_into(&mut out);
    }
    out
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_elements() {
        let node: Node = Element::div()
            .class("value")
            .child(Element::span().text("21.7 °C"))
            .into();
        assert_eq!(node.render(), r#"<div class="value"><span>21.7 °C</span></div>"#);
    }

    #[test]
    fn escapes_text_and_attributes() {
        let html = Element::div()
            .attr("title", r#"a "b" <c>"#)
            .text("<script>alert('x')</script> & co")
            .render();
        assert_eq!(
            html,
            "<div title=\"a &quot;b&quot; &lt;c&gt;\">&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; co</div>"
        );
    }

    #[test]
    fn raw_markup_is_verbatim() {
        assert_eq!(Node::raw("<b>x</b>").render(), "<b>x</b>");
    }

    #[test]
    fn void_and_flag_attributes() {
        let html = Element::new("input")
            .attr("type", "range")
            .flag("disabled")
            .render();
        assert_eq!(html, r#"<input type="range" disabled>"#);
    }

    #[test]
    fn attr_replaces_previous_value() {
        let el = Element::div().class("a").class("b");
        assert_eq!(el.get_attr("class"), Some("b"));
        assert_eq!(el.render(), r#"<div class="b"></div>"#);
    }

    #[test]
    fn text_content_skips_raw() {
        let node: Node = Element::div()
            .text("Air")
            .child(Node::raw("<i>x</i>"))
            .child(Element::span().text(" — Normal"))
            .into();
        assert_eq!(node.text_content(), "Air — Normal");
    }

    #[test]
    fn render_list() {
        let nodes = vec![Node::text("a"), Element::div().text("b").into()];
        assert_eq!(render_nodes(&nodes), "a<div>b</div>");
    }
}
