//! Tiles: identified regions of the dashboard grid.
//!
//! A [`Tile`] has a stable id, a header (icon and title), a grid span
//! ([`TileSize`]) and a [`Body`] that callers rewrite on every refresh.
//! Tiles are created through the [`TileRegistry`](crate::TileRegistry)
//! only; the body is the sole part that changes afterwards.

use std::fmt;

use crate::markup::{Element, Node, render_nodes};

/// Title used when a spec does not set one.
pub const DEFAULT_TITLE: &str = "Tile";
/// Icon used when a spec does not set one.
pub const DEFAULT_ICON: &str = "▣";

/// Grid span of a tile, `<cols>x<rows>` with single-digit dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileSize {
    cols: u8,
    rows: u8,
}

impl TileSize {
    /// The `1x1` span every unrecognized size falls back to.
    pub const DEFAULT: Self = Self { cols: 1, rows: 1 };

    /// Parse a strict `<digit>x<digit>` token (surrounding whitespace
    /// allowed).
    pub fn parse(token: &str) -> Option<Self> {
        let mut chars = token.trim().chars();
        let cols = chars.next()?.to_digit(10)?;
        if chars.next()? != 'x' {
            return None;
        }
        let rows = chars.next()?.to_digit(10)?;
        if chars.next().is_some() {
            return None;
        }
        Some(Self {
            cols: u8::try_from(cols).ok()?,
            rows: u8::try_from(rows).ok()?,
        })
    }

    /// Normalize an optional size token, defaulting to `1x1` on anything
    /// that is not a strict `<digit>x<digit>`.
    pub fn normalize(token: Option<&str>) -> Self {
        token.and_then(Self::parse).unwrap_or(Self::DEFAULT)
    }

    /// Columns spanned.
    pub const fn cols(self) -> u8 {
        self.cols
    }

    /// Rows spanned.
    pub const fn rows(self) -> u8 {
        self.rows
    }
}

impl Default for TileSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for TileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

/// Registration request for a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSpec {
    /// Stable identifier. Must not be blank.
    pub id: String,
    /// Header title.
    pub title: Option<String>,
    /// Header glyph.
    pub icon: Option<String>,
    /// Raw size token, normalized on registration.
    pub size: Option<String>,
}

impl TileSpec {
    /// Spec with only an identifier; everything else defaults.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            icon: None,
            size: None,
        }
    }

    /// Set the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the icon.
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Set the size token.
    #[must_use]
    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }
}

/// Content accepted by [`Body::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// A markup string, inserted as trusted HTML.
    Markup(String),
    /// A node whose ownership moves into the body.
    Node(Node),
}

impl From<String> for Content {
    fn from(markup: String) -> Self {
        Self::Markup(markup)
    }
}

impl From<&str> for Content {
    fn from(markup: &str) -> Self {
        Self::Markup(markup.to_owned())
    }
}

impl From<Node> for Content {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<Element> for Content {
    fn from(element: Element) -> Self {
        Self::Node(element.into())
    }
}

/// The mutable content region of a tile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    nodes: Vec<Node>,
}

impl Body {
    /// Body holding the initial placeholder block.
    pub fn placeholder() -> Self {
        Self {
            nodes: vec![
                Element::div()
                    .class("placeholder muted")
                    .text("placeholder")
                    .into(),
            ],
        }
    }

    /// Replace the whole body with `content`.
    pub fn set(&mut self, content: impl Into<Content>) {
        let node = match content.into() {
            Content::Markup(markup) => Node::Raw(markup),
            Content::Node(node) => node,
        };
        self.nodes = vec![node];
    }

    /// Replace the body with a single `<div class="value">` block.
    pub fn set_value(&mut self, text: impl fmt::Display) {
        self.nodes = vec![Element::div().class("value").text(text.to_string()).into()];
    }

    /// Replace the body with a list of nodes.
    pub fn replace(&mut self, nodes: Vec<Node>) {
        self.nodes = nodes;
    }

    /// Current nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Whether the body still shows the registration placeholder.
    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }

    /// Rendered HTML of the body content.
    pub fn render(&self) -> String {
        render_nodes(&self.nodes)
    }

    /// Concatenated text of the body.
    pub fn text_content(&self) -> String {
        self.nodes.iter().map(Node::text_content).collect()
    }
}

/// Mutation handle passed to a tile's mount callback.
///
/// `el`, `set` and `set_value` are the sanctioned ways to fill a fresh
/// tile; a callback is expected to use one of them.
#[derive(Debug)]
pub struct TileApi<'a> {
    body: &'a mut Body,
}

impl<'a> TileApi<'a> {
    pub(crate) const fn new(body: &'a mut Body) -> Self {
        Self { body }
    }

    /// Direct access to the body.
    pub const fn el(&mut self) -> &mut Body {
        &mut *self.body
    }

    /// Replace the body. See [`Body::set`].
    pub fn set(&mut self, content: impl Into<Content>) {
        self.body.set(content);
    }

    /// Replace the body with a value block. See [`Body::set_value`].
    pub fn set_value(&mut self, text: impl fmt::Display) {
        self.body.set_value(text);
    }
}

/// A registered tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    id: String,
    title: String,
    icon: String,
    size: TileSize,
    body: Body,
}

impl Tile {
    pub(crate) fn from_spec(spec: TileSpec) -> Self {
        Self {
            size: TileSize::normalize(spec.size.as_deref()),
            id: spec.id,
            title: spec.title.unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
            icon: spec.icon.unwrap_or_else(|| DEFAULT_ICON.to_owned()),
            body: Body::placeholder(),
        }
    }

    /// Identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Header title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Header glyph.
    pub fn icon(&self) -> &str {
        &self.icon
    }

    /// Grid span.
    pub const fn size(&self) -> TileSize {
        self.size
    }

    /// Body content.
    pub const fn body(&self) -> &Body {
        &self.body
    }

    pub(crate) const fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Build the tile's `<section>` element.
    pub fn to_element(&self) -> Element {
        let size = self.size.to_string();
        let header = Element::div()
            .class("header")
            .child(
                Element::span()
                    .class("icon")
                    .attr("aria-hidden", "true")
                    .text(self.icon.as_str()),
            )
            .child(Element::span().class("title").text(self.title.as_str()));

        let mut body = Element::div().class("body");
        body.children_mut().extend(self.body.nodes().iter().cloned());

        Element::new("section")
            .attr("id", self.id.as_str())
            .class(format!("tile size-{size} s-{size}"))
            .attr("role", "gridcell")
            .attr("tabindex", "0")
            .attr("aria-label", self.title.as_str())
            .child(header)
            .child(body)
    }

    /// Rendered HTML of the whole tile.
    pub fn render(&self) -> String {
        self.to_element().render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_accepts_digit_x_digit() {
        assert_eq!(TileSize::normalize(Some("2x3")).to_string(), "2x3");
        assert_eq!(TileSize::normalize(Some(" 4x5 ")).to_string(), "4x5");
    }

    #[test]
    fn size_rejects_everything_else() {
        for bad in ["foo", "", "10x", "10x1", "2x", "x2", "2X3", "2x3x", "2 x 3", "٣x٣"] {
            assert_eq!(TileSize::normalize(Some(bad)), TileSize::DEFAULT, "{bad:?}");
        }
        assert_eq!(TileSize::normalize(None).to_string(), "1x1");
    }

    #[test]
    fn spec_defaults() {
        let tile = Tile::from_spec(TileSpec::new("t"));
        assert_eq!(tile.title(), DEFAULT_TITLE);
        assert_eq!(tile.icon(), DEFAULT_ICON);
        assert_eq!(tile.size(), TileSize::DEFAULT);
        assert!(tile.body().is_placeholder());
    }

    #[test]
    fn body_set_variants() {
        let mut body = Body::placeholder();
        body.set("<b>bold</b>");
        assert_eq!(body.render(), "<b>bold</b>");

        body.set(Element::div().text("node"));
        assert_eq!(body.render(), "<div>node</div>");

        body.set_value(21.7);
        assert_eq!(body.render(), r#"<div class="value">21.7</div>"#);
        assert!(!body.is_placeholder());
    }

    #[test]
    fn tile_markup() {
        let tile = Tile::from_spec(
            TileSpec::new("sensor-temp-air")
                .title("Temp air")
                .icon("🌡")
                .size("2x1"),
        );
        assert_eq!(
            tile.render(),
            "<section id=\"sensor-temp-air\" class=\"tile size-2x1 s-2x1\" role=\"gridcell\" \
             tabindex=\"0\" aria-label=\"Temp air\"><div class=\"header\">\
             <span class=\"icon\" aria-hidden=\"true\">🌡</span><span class=\"title\">Temp air</span>\
             </div><div class=\"body\"><div class=\"placeholder muted\">placeholder</div></div></section>"
        );
    }

    #[test]
    fn title_is_escaped() {
        let tile = Tile::from_spec(TileSpec::new("x").title("<b>"));
        assert!(tile.render().contains("<span class=\"title\">&lt;b&gt;</span>"));
    }
}
