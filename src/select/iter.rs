//! Iteration over a selection's nodes.

use super::Selection;
use crate::tree::{Document, NodeId};

impl Selection {
    /// Returns an iterator over the selection's nodes, in order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.nodes.iter(),
        }
    }

    /// Calls `f` for each node, in order, with its position and a singleton
    /// selection over it.
    pub fn each(&self, doc: &Document, mut f: impl FnMut(usize, &Selection)) {
        self.check_doc(doc);
        for (i, &node) in self.nodes.iter().enumerate() {
            f(i, &Selection::from_node(doc, node));
        }
    }

    /// Like [`each`](Self::each), but stops as soon as `f` returns false.
    pub fn each_while(&self, doc: &Document, mut f: impl FnMut(usize, &Selection) -> bool) {
        self.check_doc(doc);
        for (i, &node) in self.nodes.iter().enumerate() {
            if !f(i, &Selection::from_node(doc, node)) {
                break;
            }
        }
    }

    /// Collects `f(position, singleton)` for each node, in order.
    #[must_use]
    pub fn map<T>(&self, doc: &Document, mut f: impl FnMut(usize, &Selection) -> T) -> Vec<T> {
        self.check_doc(doc);
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, &node)| f(i, &Selection::from_node(doc, node)))
            .collect()
    }
}

/// Iterator over the node ids of a [`Selection`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, NodeId>,
}

impl Iterator for Iter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a Selection {
    type Item = NodeId;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Document;

    fn doc() -> Document {
        Document::parse_html("<ul><li>a</li><li>b</li><li>c</li></ul>").unwrap()
    }

    #[test]
    fn test_iter_yields_nodes_in_order() {
        let doc = doc();
        let items = doc.select("li");
        let collected: Vec<NodeId> = items.iter().collect();
        assert_eq!(collected, items.nodes());
        assert_eq!(items.iter().len(), 3);

        // for-loop over &Selection
        let mut count = 0;
        for node in &items {
            assert_eq!(doc.node_name(node), Some("li"));
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_each_positions() {
        let doc = doc();
        let items = doc.select("li");
        let mut seen = Vec::new();
        items.each(&doc, |i, single| {
            seen.push((i, single.text(&doc)));
        });
        assert_eq!(
            seen,
            vec![
                (0, "a".to_string()),
                (1, "b".to_string()),
                (2, "c".to_string())
            ]
        );
    }

    #[test]
    fn test_each_while_stops_early() {
        let doc = doc();
        let items = doc.select("li");
        let mut visited = 0;
        items.each_while(&doc, |i, _| {
            visited += 1;
            i < 1
        });
        assert_eq!(visited, 2);
    }

    #[test]
    fn test_map_collects() {
        let doc = doc();
        let items = doc.select("li");
        let texts = items.map(&doc, |_, single| single.text(&doc));
        assert_eq!(texts, vec!["a", "b", "c"]);
    }
}
