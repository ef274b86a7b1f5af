//! Node kind definitions.
//!
//! [`NodeKind`] represents every node type a parsed HTML document can
//! contain. Each variant carries its kind-specific payload; navigation links
//! (parent, children, siblings) live in `NodeData`, not here.

/// An attribute on an element node, as an ordered `(name, value)` pair.
///
/// Attribute order is preserved from the source document, and names are
/// normalized to lowercase by the HTML parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name (lowercase).
    pub name: String,
    /// The attribute value (character references already resolved).
    pub value: String,
}

impl Attribute {
    /// Creates an attribute from a name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The kind of a node and its associated payload.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The document node — exactly one per `Document`, always the root.
    Document,

    /// An element node, e.g., `<div class="x">`.
    Element {
        /// The tag name, normalized to lowercase.
        name: String,
        /// Attributes in source order.
        attributes: Vec<Attribute>,
    },

    /// A text node containing character data (references already resolved).
    Text {
        /// The text content.
        content: String,
    },

    /// A comment node, without the `<!--` and `-->` delimiters.
    Comment {
        /// The comment text.
        content: String,
    },

    /// A document type declaration, e.g., `<!DOCTYPE html>`.
    Doctype {
        /// The root element name declared in the DOCTYPE.
        name: String,
    },
}

impl NodeKind {
    /// Returns true for element nodes.
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }

    /// Returns true for the document node.
    #[must_use]
    pub fn is_document(&self) -> bool {
        matches!(self, Self::Document)
    }

    /// Returns true for text nodes.
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}
