//! Attribute, class, and text access on selections.
//!
//! Readers follow the first-node convention: `attr` and friends answer for
//! the first node in the selection. Writers apply to every node. Neither
//! pushes a rollback frame — property access is not a set-producing
//! operation.

use super::Selection;
use crate::tree::Document;

impl Selection {
    /// Returns the value of `name` on the *first* node, or `None` if the
    /// selection is empty or the first node lacks the attribute.
    #[must_use]
    pub fn attr(&self, doc: &Document, name: &str) -> Option<String> {
        self.check_doc(doc);
        let first = *self.nodes.first()?;
        doc.attribute(first, name).map(str::to_string)
    }

    /// Like [`attr`](Self::attr), but substitutes `default` for a missing
    /// attribute.
    #[must_use]
    pub fn attr_or(&self, doc: &Document, name: &str, default: &str) -> String {
        self.attr(doc, name)
            .unwrap_or_else(|| default.to_string())
    }

    /// Sets `name` to `value` on every element node in the selection.
    pub fn set_attr(&self, doc: &mut Document, name: &str, value: &str) -> &Self {
        self.check_doc(doc);
        for &node in &self.nodes {
            doc.set_attribute(node, name, value);
        }
        self
    }

    /// Removes `name` from every element node in the selection.
    pub fn remove_attr(&self, doc: &mut Document, name: &str) -> &Self {
        self.check_doc(doc);
        for &node in &self.nodes {
            doc.remove_attribute(node, name);
        }
        self
    }

    /// Returns true if *any* node carries `class` as a whitespace-separated
    /// token of its `class` attribute.
    #[must_use]
    pub fn has_class(&self, doc: &Document, class: &str) -> bool {
        self.check_doc(doc);
        self.nodes.iter().any(|&node| {
            doc.attribute(node, "class")
                .is_some_and(|value| value.split_ascii_whitespace().any(|token| token == class))
        })
    }

    /// Adds each whitespace-separated token of `classes` to every node's
    /// `class` attribute, skipping tokens already present.
    pub fn add_class(&self, doc: &mut Document, classes: &str) -> &Self {
        self.check_doc(doc);
        for &node in &self.nodes {
            let mut current = doc
                .attribute(node, "class")
                .map(str::to_string)
                .unwrap_or_default();
            for token in classes.split_ascii_whitespace() {
                if !current.split_ascii_whitespace().any(|t| t == token) {
                    if !current.is_empty() {
                        current.push(' ');
                    }
                    current.push_str(token);
                }
            }
            if !current.is_empty() {
                doc.set_attribute(node, "class", &current);
            }
        }
        self
    }

    /// Removes each whitespace-separated token of `classes` from every
    /// node's `class` attribute. An attribute left without tokens is
    /// removed entirely.
    pub fn remove_class(&self, doc: &mut Document, classes: &str) -> &Self {
        self.check_doc(doc);
        for &node in &self.nodes {
            let Some(current) = doc.attribute(node, "class") else {
                continue;
            };
            let kept: Vec<&str> = current
                .split_ascii_whitespace()
                .filter(|token| !classes.split_ascii_whitespace().any(|c| c == *token))
                .collect();
            if kept.is_empty() {
                doc.remove_attribute(node, "class");
            } else {
                let joined = kept.join(" ");
                doc.set_attribute(node, "class", &joined);
            }
        }
        self
    }

    /// Returns the concatenated text content of *all* nodes, in selection
    /// order. Comments contribute nothing.
    #[must_use]
    pub fn text(&self, doc: &Document) -> String {
        self.check_doc(doc);
        let mut result = String::new();
        for &node in &self.nodes {
            result.push_str(&doc.text_content(node));
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::Document;

    fn doc() -> Document {
        Document::parse_html(
            r#"<div id="x" class="a b">hello <em>world</em></div><div id="y">!</div>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_attr_reads_first_node() {
        let doc = doc();
        let divs = doc.select("div");
        assert_eq!(divs.attr(&doc, "id").as_deref(), Some("x"));
        assert_eq!(divs.attr(&doc, "missing"), None);
        assert_eq!(divs.attr_or(&doc, "missing", "fallback"), "fallback");
        assert_eq!(doc.select("table").attr(&doc, "id"), None);
    }

    #[test]
    fn test_set_attr_applies_to_all() {
        let mut doc = doc();
        let divs = doc.select("div");
        divs.set_attr(&mut doc, "data-mark", "1");
        for &node in divs.nodes() {
            assert_eq!(doc.attribute(node, "data-mark"), Some("1"));
        }
        divs.remove_attr(&mut doc, "data-mark");
        assert_eq!(divs.attr(&doc, "data-mark"), None);
    }

    #[test]
    fn test_class_tokens() {
        let mut doc = doc();
        let divs = doc.select("div");

        assert!(divs.has_class(&doc, "a"));
        assert!(divs.has_class(&doc, "b"));
        assert!(!divs.has_class(&doc, "ab"));

        divs.add_class(&mut doc, "b c");
        // "b" was already present on #x; "c" lands on both
        assert_eq!(doc.select("#x").attr(&doc, "class").as_deref(), Some("a b c"));
        assert_eq!(doc.select("#y").attr(&doc, "class").as_deref(), Some("b c"));

        divs.remove_class(&mut doc, "a c");
        assert_eq!(doc.select("#x").attr(&doc, "class").as_deref(), Some("b"));

        divs.remove_class(&mut doc, "b");
        // Attribute removed once empty
        assert_eq!(doc.select("#y").attr(&doc, "class"), None);
    }

    #[test]
    fn test_text_concatenates_all_nodes() {
        let doc = doc();
        assert_eq!(doc.select("div").text(&doc), "hello world!");
        assert_eq!(doc.select("em").text(&doc), "world");
        assert_eq!(doc.select("table").text(&doc), "");
    }
}
