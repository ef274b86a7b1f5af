//! Set algebra over selections: filter, exclude, intersect, union, has.
//!
//! All operations here reduce or extend the receiver's node list and build
//! the result with [`Selection::push_stack`], so the dedup and rollback
//! invariants hold exactly as they do for traversal.
//!
//! Pattern-driven operations compile leniently: an uncompilable pattern
//! behaves as "matches nothing", which makes `filter` return an empty
//! selection and `not` return the receiver's nodes unchanged.

use std::collections::HashSet;

use super::{Selection, lenient};
use crate::matcher::Matcher;
use crate::tree::{Document, NodeId};

impl Selection {
    // --- Filter ---

    /// Keeps the nodes matching `pattern`, preserving order.
    #[must_use]
    pub fn filter(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.filter_matcher(doc, &matcher)
    }

    /// [`filter`](Self::filter) with a pre-compiled matcher.
    #[must_use]
    pub fn filter_matcher<M: Matcher>(&self, doc: &Document, matcher: &M) -> Selection {
        self.check_doc(doc);
        self.push_stack(matcher.filter_nodes(doc, &self.nodes))
    }

    /// Keeps the nodes for which `predicate` returns true. The predicate
    /// receives each node's position and a singleton selection over it, in
    /// selection order.
    #[must_use]
    pub fn filter_fn(
        &self,
        doc: &Document,
        mut predicate: impl FnMut(usize, &Selection) -> bool,
    ) -> Selection {
        self.check_doc(doc);
        let kept = self
            .nodes
            .iter()
            .enumerate()
            .filter(|&(i, &node)| predicate(i, &Selection::from_node(doc, node)))
            .map(|(_, &node)| node)
            .collect();
        self.push_stack(kept)
    }

    // --- Exclude ---

    /// Keeps the nodes *not* matching `pattern` (the complement of
    /// [`filter`](Self::filter) within the receiver).
    #[must_use]
    pub fn not(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.not_matcher(doc, &matcher)
    }

    /// [`not`](Self::not) with a pre-compiled matcher.
    #[must_use]
    pub fn not_matcher<M: Matcher>(&self, doc: &Document, matcher: &M) -> Selection {
        self.check_doc(doc);
        let kept = self
            .nodes
            .iter()
            .copied()
            .filter(|&node| !matcher.matches(doc, node))
            .collect();
        self.push_stack(kept)
    }

    /// Keeps the nodes for which `predicate` returns false.
    #[must_use]
    pub fn not_fn(
        &self,
        doc: &Document,
        mut predicate: impl FnMut(usize, &Selection) -> bool,
    ) -> Selection {
        self.filter_fn(doc, |i, sel| !predicate(i, sel))
    }

    /// Keeps the nodes that are not members of `other`.
    #[must_use]
    pub fn not_selection(&self, doc: &Document, other: &Selection) -> Selection {
        self.not_nodes(doc, other.nodes())
    }

    /// Keeps the nodes not present in `nodes`.
    #[must_use]
    pub fn not_nodes(&self, doc: &Document, nodes: &[NodeId]) -> Selection {
        self.check_doc(doc);
        let excluded: HashSet<NodeId> = nodes.iter().copied().collect();
        let kept = self
            .nodes
            .iter()
            .copied()
            .filter(|node| !excluded.contains(node))
            .collect();
        self.push_stack(kept)
    }

    // --- Intersect ---

    /// Keeps the nodes present (by identity) in both the receiver and
    /// `other`, preserving the receiver's order.
    #[must_use]
    pub fn intersect_selection(&self, doc: &Document, other: &Selection) -> Selection {
        self.intersect_nodes(doc, other.nodes())
    }

    /// Keeps the nodes present (by identity) in both the receiver and
    /// `nodes`, preserving the receiver's order.
    #[must_use]
    pub fn intersect_nodes(&self, doc: &Document, nodes: &[NodeId]) -> Selection {
        self.check_doc(doc);
        let keep: HashSet<NodeId> = nodes.iter().copied().collect();
        let kept = self
            .nodes
            .iter()
            .copied()
            .filter(|node| keep.contains(node))
            .collect();
        self.push_stack(kept)
    }

    // --- Union ---

    /// Appends the nodes matching `pattern` — evaluated against the
    /// *document root*, not the receiver's nodes — then deduplicates.
    #[must_use]
    pub fn add(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.check_doc(doc);
        let mut union = self.nodes.clone();
        union.extend(matcher.match_all(doc, doc.root()));
        self.push_stack(union)
    }

    /// Appends the members of `other`, then deduplicates (receiver's nodes
    /// keep their positions).
    #[must_use]
    pub fn add_selection(&self, doc: &Document, other: &Selection) -> Selection {
        self.add_nodes(doc, other.nodes())
    }

    /// Appends the given nodes, then deduplicates.
    #[must_use]
    pub fn add_nodes(&self, doc: &Document, nodes: &[NodeId]) -> Selection {
        self.check_doc(doc);
        let mut union = self.nodes.clone();
        union.extend_from_slice(nodes);
        self.push_stack(union)
    }

    // --- Has-descendant ---

    /// Keeps the nodes whose subtree — strictly below the node itself —
    /// contains at least one match for `pattern`.
    #[must_use]
    pub fn has(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.check_doc(doc);
        let kept = self
            .nodes
            .iter()
            .copied()
            .filter(|&node| doc.descendants(node).any(|d| matcher.matches(doc, d)))
            .collect();
        self.push_stack(kept)
    }

    /// Keeps the nodes whose subtree contains at least one member of
    /// `other`.
    #[must_use]
    pub fn has_selection(&self, doc: &Document, other: &Selection) -> Selection {
        self.has_nodes(doc, other.nodes())
    }

    /// Keeps the nodes whose subtree contains at least one of `nodes`.
    #[must_use]
    pub fn has_nodes(&self, doc: &Document, nodes: &[NodeId]) -> Selection {
        self.check_doc(doc);
        let wanted: HashSet<NodeId> = nodes.iter().copied().collect();
        let kept = self
            .nodes
            .iter()
            .copied()
            .filter(|&node| doc.descendants(node).any(|d| wanted.contains(&d)))
            .collect();
        self.push_stack(kept)
    }

    // --- Membership tests ---

    /// Returns true if at least one node matches `pattern`.
    #[must_use]
    pub fn is(&self, doc: &Document, pattern: &str) -> bool {
        let matcher = lenient(pattern);
        self.is_matcher(doc, &matcher)
    }

    /// [`is`](Self::is) with a pre-compiled matcher.
    #[must_use]
    pub fn is_matcher<M: Matcher>(&self, doc: &Document, matcher: &M) -> bool {
        self.check_doc(doc);
        self.nodes.iter().any(|&node| matcher.matches(doc, node))
    }

    /// Returns true if at least one node is a member of `other`.
    #[must_use]
    pub fn is_selection(&self, other: &Selection) -> bool {
        let members: HashSet<NodeId> = other.nodes.iter().copied().collect();
        self.nodes.iter().any(|node| members.contains(node))
    }

    /// Returns true if `predicate` returns true for at least one node.
    #[must_use]
    pub fn is_fn(
        &self,
        doc: &Document,
        mut predicate: impl FnMut(usize, &Selection) -> bool,
    ) -> bool {
        self.check_doc(doc);
        self.nodes
            .iter()
            .enumerate()
            .any(|(i, &node)| predicate(i, &Selection::from_node(doc, node)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Document;

    fn doc() -> Document {
        Document::parse_html(
            r#"<ul>
                 <li id="a" class="odd">1</li>
                 <li id="b" class="even"><em>2</em></li>
                 <li id="c" class="odd">3</li>
               </ul>"#,
        )
        .unwrap()
    }

    fn ids(doc: &Document, sel: &Selection) -> Vec<String> {
        sel.nodes()
            .iter()
            .filter_map(|&id| doc.attribute(id, "id").map(str::to_string))
            .collect()
    }

    #[test]
    fn test_filter_keeps_matching_in_order() {
        let doc = doc();
        let items = doc.select("li");
        assert_eq!(ids(&doc, &items.filter(&doc, ".odd")), vec!["a", "c"]);
    }

    #[test]
    fn test_filter_invalid_pattern_yields_empty() {
        let doc = doc();
        let items = doc.select("li");
        let filtered = items.filter(&doc, "[broken");
        assert!(filtered.is_empty());
        // Still rolls back to the receiver
        assert_eq!(filtered.rollback(), items);
    }

    #[test]
    fn test_filter_fn_order_and_args() {
        let doc = doc();
        let items = doc.select("li");
        let mut seen = Vec::new();
        let odd_positions = items.filter_fn(&doc, |i, single| {
            assert_eq!(single.len(), 1);
            seen.push(i);
            i % 2 == 0
        });
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(ids(&doc, &odd_positions), vec!["a", "c"]);
    }

    #[test]
    fn test_not_is_filter_complement() {
        let doc = doc();
        let items = doc.select("li");
        assert_eq!(ids(&doc, &items.not(&doc, ".odd")), vec!["b"]);
        // Invalid pattern matches nothing, so not() keeps everything
        assert_eq!(items.not(&doc, "[broken").nodes(), items.nodes());

        let evens = doc.select(".even");
        assert_eq!(ids(&doc, &items.not_selection(&doc, &evens)), vec!["a", "c"]);
    }

    #[test]
    fn test_intersect_preserves_receiver_order() {
        let doc = doc();
        let items = doc.select("li");
        let reversed: Vec<_> = items.nodes().iter().rev().copied().collect();
        let other = Selection::from_nodes(&doc, reversed);
        let both = items.intersect_selection(&doc, &other);
        assert_eq!(both.nodes(), items.nodes());
    }

    #[test]
    fn test_add_pattern_evaluates_at_document_root() {
        let doc = doc();
        let a = doc.select("#a");
        // "em" does not exist under #a; union still finds it from the root.
        let union = a.add(&doc, "em");
        assert_eq!(union.len(), 2);
    }

    #[test]
    fn test_add_selection_dedups() {
        let doc = doc();
        let items = doc.select("li");
        let some = doc.select(".odd");
        let union = items.add_selection(&doc, &some);
        assert_eq!(union.nodes(), items.nodes());
    }

    #[test]
    fn test_has_descendant() {
        let doc = doc();
        let items = doc.select("li");
        assert_eq!(ids(&doc, &items.has(&doc, "em")), vec!["b"]);

        let ems = doc.select("em");
        assert_eq!(ids(&doc, &items.has_selection(&doc, &ems)), vec!["b"]);

        // A node never "has" itself
        assert!(ems.has(&doc, "em").is_empty());
    }

    #[test]
    fn test_is_predicates() {
        let doc = doc();
        let items = doc.select("li");
        assert!(items.is(&doc, ".even"));
        assert!(!items.is(&doc, "table"));
        assert!(!items.is(&doc, "[broken"));
        assert!(items.is_selection(&doc.select("#c")));
        assert!(items.is_fn(&doc, |i, _| i == 2));
    }

    #[test]
    fn test_rollback_law_for_set_algebra() {
        let doc = doc();
        let items = doc.select("li");
        assert_eq!(items.filter(&doc, ".odd").rollback(), items);
        assert_eq!(items.not(&doc, ".odd").rollback(), items);
        assert_eq!(items.add(&doc, "em").rollback(), items);
        assert_eq!(items.has(&doc, "em").rollback(), items);
        assert_eq!(
            items.intersect_selection(&doc, &doc.select(".odd")).rollback(),
            items
        );
    }
}
