//! Traversal operations: children, parents, siblings, descendants.
//!
//! Every operation here follows the same two-phase shape: expand each source
//! node independently into a raw candidate list, then build the result with
//! [`Selection::push_stack`], which deduplicates by identity keeping the
//! first occurrence. When multiple source nodes' neighborhoods overlap, the
//! result is therefore in "first expansion, first occurrence" order, not
//! strict document order.
//!
//! Filtered variants compute the raw (unfiltered) candidates first and apply
//! the matcher as a post-filter before deduplication — traversal and
//! matching stay fully decoupled.
//!
//! Until-boundary variants stop a walk *before* the first node matching a
//! boundary pattern or belonging to a boundary node set; the boundary node
//! itself is excluded. A boundary that never matches leaves the walk
//! unmodified.

use std::collections::HashSet;

use super::{Selection, lenient};
use crate::matcher::Matcher;
use crate::tree::{Document, NodeId};

/// Boundary predicate for the until-variants: either a compiled pattern or
/// an explicit node set.
enum Boundary<'a, M: Matcher> {
    Pattern(&'a M),
    Nodes(HashSet<NodeId>),
}

impl<M: Matcher> Boundary<'_, M> {
    fn stops_at(&self, doc: &Document, node: NodeId) -> bool {
        match self {
            Boundary::Pattern(matcher) => matcher.matches(doc, node),
            Boundary::Nodes(set) => set.contains(&node),
        }
    }
}

fn element_children(doc: &Document, id: NodeId) -> Vec<NodeId> {
    doc.children(id)
        .filter(|&c| doc.node(c).kind.is_element())
        .collect()
}

fn next_element_sibling(doc: &Document, id: NodeId) -> Option<NodeId> {
    let mut current = doc.next_sibling(id);
    while let Some(s) = current {
        if doc.node(s).kind.is_element() {
            return Some(s);
        }
        current = doc.next_sibling(s);
    }
    None
}

fn prev_element_sibling(doc: &Document, id: NodeId) -> Option<NodeId> {
    let mut current = doc.prev_sibling(id);
    while let Some(s) = current {
        if doc.node(s).kind.is_element() {
            return Some(s);
        }
        current = doc.prev_sibling(s);
    }
    None
}

impl Selection {
    /// Expands each node through `expand`, then pushes the concatenated
    /// candidates (dedup, rollback link).
    fn map_nodes(
        &self,
        doc: &Document,
        mut expand: impl FnMut(&Document, NodeId, &mut Vec<NodeId>),
    ) -> Selection {
        self.check_doc(doc);
        let mut raw = Vec::new();
        for &node in &self.nodes {
            expand(doc, node, &mut raw);
        }
        self.push_stack(raw)
    }

    /// Like [`map_nodes`](Self::map_nodes), but post-filters the raw
    /// candidates through `matcher` before deduplication.
    fn map_nodes_filtered<M: Matcher>(
        &self,
        doc: &Document,
        matcher: &M,
        mut expand: impl FnMut(&Document, NodeId, &mut Vec<NodeId>),
    ) -> Selection {
        self.check_doc(doc);
        let mut raw = Vec::new();
        for &node in &self.nodes {
            expand(doc, node, &mut raw);
        }
        let filtered = matcher.filter_nodes(doc, &raw);
        self.push_stack(filtered)
    }

    // --- Children ---

    /// The immediate element children of each node.
    #[must_use]
    pub fn children(&self, doc: &Document) -> Selection {
        self.map_nodes(doc, |doc, node, out| {
            out.extend(element_children(doc, node));
        })
    }

    /// The immediate element children of each node matching `pattern`.
    #[must_use]
    pub fn children_filtered(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.map_nodes_filtered(doc, &matcher, |doc, node, out| {
            out.extend(element_children(doc, node));
        })
    }

    /// The immediate children of each node, of every kind (text and comment
    /// nodes included).
    #[must_use]
    pub fn contents(&self, doc: &Document) -> Selection {
        self.map_nodes(doc, |doc, node, out| {
            out.extend(doc.children(node));
        })
    }

    // --- Parent / ancestors ---

    /// The immediate parent of each node, when it is an addressable
    /// (non-document) node.
    #[must_use]
    pub fn parent(&self, doc: &Document) -> Selection {
        self.map_nodes(doc, |doc, node, out| {
            if let Some(p) = doc.parent(node) {
                if !doc.node(p).kind.is_document() {
                    out.push(p);
                }
            }
        })
    }

    /// The immediate parent of each node, filtered by `pattern`.
    #[must_use]
    pub fn parent_filtered(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.map_nodes_filtered(doc, &matcher, |doc, node, out| {
            if let Some(p) = doc.parent(node) {
                if !doc.node(p).kind.is_document() {
                    out.push(p);
                }
            }
        })
    }

    /// Every element ancestor of each node, nearest first, stopping at the
    /// document root.
    #[must_use]
    pub fn parents(&self, doc: &Document) -> Selection {
        self.map_nodes(doc, |doc, node, out| {
            collect_ancestors::<crate::matcher::MatchNothing>(doc, node, None, out);
        })
    }

    /// Every element ancestor of each node matching `pattern`.
    #[must_use]
    pub fn parents_filtered(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.map_nodes_filtered(doc, &matcher, |doc, node, out| {
            collect_ancestors::<crate::matcher::MatchNothing>(doc, node, None, out);
        })
    }

    /// Element ancestors of each node up to — and excluding — the first one
    /// matching `pattern`. A pattern that never matches yields the same
    /// result as [`parents`](Self::parents).
    #[must_use]
    pub fn parents_until(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.parents_until_matcher(doc, &matcher)
    }

    /// [`parents_until`](Self::parents_until) with a pre-compiled matcher.
    #[must_use]
    pub fn parents_until_matcher<M: Matcher>(&self, doc: &Document, matcher: &M) -> Selection {
        self.map_nodes(doc, |doc, node, out| {
            collect_ancestors(doc, node, Some(&Boundary::Pattern(matcher)), out);
        })
    }

    /// Element ancestors of each node up to — and excluding — the first one
    /// that is a member of `boundary`.
    #[must_use]
    pub fn parents_until_selection(&self, doc: &Document, boundary: &Selection) -> Selection {
        let set: HashSet<NodeId> = boundary.nodes.iter().copied().collect();
        self.map_nodes(doc, |doc, node, out| {
            collect_ancestors::<crate::matcher::MatchNothing>(
                doc,
                node,
                Some(&Boundary::Nodes(set.clone())),
                out,
            );
        })
    }

    /// The first node in each node's self-then-ancestors chain that matches
    /// `pattern` (elements only).
    #[must_use]
    pub fn closest(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.map_nodes(doc, |doc, node, out| {
            let mut current = Some(node);
            while let Some(id) = current {
                if doc.node(id).kind.is_element() && matcher.matches(doc, id) {
                    out.push(id);
                    break;
                }
                current = doc.parent(id);
            }
        })
    }

    // --- Siblings ---

    /// The immediately following element sibling of each node.
    #[must_use]
    pub fn next(&self, doc: &Document) -> Selection {
        self.map_nodes(doc, |doc, node, out| {
            out.extend(next_element_sibling(doc, node));
        })
    }

    /// The immediately following element sibling, filtered by `pattern`.
    #[must_use]
    pub fn next_filtered(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.map_nodes_filtered(doc, &matcher, |doc, node, out| {
            out.extend(next_element_sibling(doc, node));
        })
    }

    /// The immediately preceding element sibling of each node.
    #[must_use]
    pub fn prev(&self, doc: &Document) -> Selection {
        self.map_nodes(doc, |doc, node, out| {
            out.extend(prev_element_sibling(doc, node));
        })
    }

    /// The immediately preceding element sibling, filtered by `pattern`.
    #[must_use]
    pub fn prev_filtered(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.map_nodes_filtered(doc, &matcher, |doc, node, out| {
            out.extend(prev_element_sibling(doc, node));
        })
    }

    /// All following element siblings of each node, in document order.
    #[must_use]
    pub fn next_all(&self, doc: &Document) -> Selection {
        self.map_nodes(doc, |doc, node, out| {
            collect_siblings::<crate::matcher::MatchNothing>(
                doc,
                node,
                Direction::Forward,
                None,
                out,
            );
        })
    }

    /// All following element siblings matching `pattern`.
    #[must_use]
    pub fn next_all_filtered(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.map_nodes_filtered(doc, &matcher, |doc, node, out| {
            collect_siblings::<crate::matcher::MatchNothing>(
                doc,
                node,
                Direction::Forward,
                None,
                out,
            );
        })
    }

    /// All preceding element siblings of each node, nearest first.
    #[must_use]
    pub fn prev_all(&self, doc: &Document) -> Selection {
        self.map_nodes(doc, |doc, node, out| {
            collect_siblings::<crate::matcher::MatchNothing>(
                doc,
                node,
                Direction::Backward,
                None,
                out,
            );
        })
    }

    /// All preceding element siblings matching `pattern`.
    #[must_use]
    pub fn prev_all_filtered(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.map_nodes_filtered(doc, &matcher, |doc, node, out| {
            collect_siblings::<crate::matcher::MatchNothing>(
                doc,
                node,
                Direction::Backward,
                None,
                out,
            );
        })
    }

    /// Following element siblings up to — and excluding — the first one
    /// matching `pattern`.
    #[must_use]
    pub fn next_until(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.map_nodes(doc, |doc, node, out| {
            collect_siblings(
                doc,
                node,
                Direction::Forward,
                Some(&Boundary::Pattern(&matcher)),
                out,
            );
        })
    }

    /// Following element siblings up to — and excluding — the first member
    /// of `boundary`.
    #[must_use]
    pub fn next_until_selection(&self, doc: &Document, boundary: &Selection) -> Selection {
        let set: HashSet<NodeId> = boundary.nodes.iter().copied().collect();
        self.map_nodes(doc, |doc, node, out| {
            collect_siblings::<crate::matcher::MatchNothing>(
                doc,
                node,
                Direction::Forward,
                Some(&Boundary::Nodes(set.clone())),
                out,
            );
        })
    }

    /// Preceding element siblings up to — and excluding — the first one
    /// matching `pattern`, nearest first.
    #[must_use]
    pub fn prev_until(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.map_nodes(doc, |doc, node, out| {
            collect_siblings(
                doc,
                node,
                Direction::Backward,
                Some(&Boundary::Pattern(&matcher)),
                out,
            );
        })
    }

    /// Preceding element siblings up to — and excluding — the first member
    /// of `boundary`, nearest first.
    #[must_use]
    pub fn prev_until_selection(&self, doc: &Document, boundary: &Selection) -> Selection {
        let set: HashSet<NodeId> = boundary.nodes.iter().copied().collect();
        self.map_nodes(doc, |doc, node, out| {
            collect_siblings::<crate::matcher::MatchNothing>(
                doc,
                node,
                Direction::Backward,
                Some(&Boundary::Nodes(set.clone())),
                out,
            );
        })
    }

    /// All element siblings of each node, excluding the node itself.
    #[must_use]
    pub fn siblings(&self, doc: &Document) -> Selection {
        self.map_nodes(doc, |doc, node, out| {
            if let Some(parent) = doc.parent(node) {
                out.extend(
                    element_children(doc, parent)
                        .into_iter()
                        .filter(|&s| s != node),
                );
            }
        })
    }

    /// All element siblings matching `pattern`, excluding the node itself.
    #[must_use]
    pub fn siblings_filtered(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.map_nodes_filtered(doc, &matcher, |doc, node, out| {
            if let Some(parent) = doc.parent(node) {
                out.extend(
                    element_children(doc, parent)
                        .into_iter()
                        .filter(|&s| s != node),
                );
            }
        })
    }

    // --- Descendant search ---

    /// All descendants of each node matching `pattern`. The context nodes
    /// themselves never match, even when they satisfy the pattern.
    #[must_use]
    pub fn find(&self, doc: &Document, pattern: &str) -> Selection {
        let matcher = lenient(pattern);
        self.find_matcher(doc, &matcher)
    }

    /// [`find`](Self::find) with a pre-compiled matcher.
    #[must_use]
    pub fn find_matcher<M: Matcher>(&self, doc: &Document, matcher: &M) -> Selection {
        self.map_nodes(doc, |doc, node, out| {
            out.extend(matcher.match_all(doc, node));
        })
    }

    /// The members of `other` that are descendants of at least one node in
    /// this selection.
    #[must_use]
    pub fn find_selection(&self, doc: &Document, other: &Selection) -> Selection {
        self.find_in_set(doc, other.nodes())
    }

    /// The given nodes that are descendants of at least one node in this
    /// selection.
    #[must_use]
    pub fn find_nodes(&self, doc: &Document, nodes: &[NodeId]) -> Selection {
        self.find_in_set(doc, nodes)
    }

    fn find_in_set(&self, doc: &Document, candidates: &[NodeId]) -> Selection {
        let set: HashSet<NodeId> = candidates.iter().copied().collect();
        self.map_nodes(doc, |doc, node, out| {
            out.extend(doc.descendants(node).filter(|id| set.contains(id)));
        })
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

/// Collects element ancestors of `node`, nearest first, stopping before a
/// boundary match when one is given. The document node is never collected.
fn collect_ancestors<M: Matcher>(
    doc: &Document,
    node: NodeId,
    boundary: Option<&Boundary<'_, M>>,
    out: &mut Vec<NodeId>,
) {
    for ancestor in doc.ancestors(node) {
        if !doc.node(ancestor).kind.is_element() {
            break;
        }
        if let Some(boundary) = boundary {
            if boundary.stops_at(doc, ancestor) {
                break;
            }
        }
        out.push(ancestor);
    }
}

/// Collects element siblings of `node` in the given direction, stopping
/// before a boundary match when one is given.
fn collect_siblings<M: Matcher>(
    doc: &Document,
    node: NodeId,
    direction: Direction,
    boundary: Option<&Boundary<'_, M>>,
    out: &mut Vec<NodeId>,
) {
    let step = match direction {
        Direction::Forward => next_element_sibling,
        Direction::Backward => prev_element_sibling,
    };
    let mut current = step(doc, node);
    while let Some(sibling) = current {
        if let Some(boundary) = boundary {
            if boundary.stops_at(doc, sibling) {
                break;
            }
        }
        out.push(sibling);
        current = step(doc, sibling);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Document;

    fn ids(doc: &Document, sel: &Selection) -> Vec<String> {
        sel.nodes()
            .iter()
            .filter_map(|&id| doc.attribute(id, "id").map(str::to_string))
            .collect()
    }

    fn nested_doc() -> Document {
        Document::parse_html(
            r#"<div id="root">
                 <section id="s1">
                   <p id="p1">one</p>
                   <p id="p2">two</p>
                 </section>
                 <section id="s2">
                   <p id="p3">three</p>
                 </section>
               </div>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_children_elements_only() {
        let doc = Document::parse_html("<div id=d>text<span id=s>x</span><!--c--></div>").unwrap();
        let div = doc.select("#d");
        assert_eq!(ids(&doc, &div.children(&doc)), vec!["s"]);
        // contents includes the text and comment nodes too
        assert_eq!(div.contents(&doc).len(), 3);
    }

    #[test]
    fn test_parent_skips_document_node() {
        let doc = nested_doc();
        let html = doc.select("html");
        assert!(html.parent(&doc).is_empty());

        let p = doc.select("#p1");
        assert_eq!(ids(&doc, &p.parent(&doc)), vec!["s1"]);
    }

    #[test]
    fn test_parents_nearest_first_with_overlap_dedup() {
        let doc = nested_doc();
        let ps = doc.select("p");
        let parents = ps.parents(&doc);
        // p1 expands to [s1, root, body, html]; p2's expansion is all
        // duplicates; p3 contributes s2 (first new occurrence).
        let got = ids(&doc, &parents);
        assert_eq!(got, vec!["s1", "root", "s2"]);
    }

    #[test]
    fn test_parents_until_boundary_excluded() {
        let doc = nested_doc();
        let p = doc.select("#p1");
        let until = p.parents_until(&doc, "#root");
        assert_eq!(ids(&doc, &until), vec!["s1"]);
    }

    #[test]
    fn test_parents_until_nonmatching_boundary_runs_to_completion() {
        let doc = nested_doc();
        let p = doc.select("#p1");
        assert_eq!(
            p.parents_until(&doc, "#nosuch").nodes(),
            p.parents(&doc).nodes()
        );
    }

    #[test]
    fn test_parents_until_selection() {
        let doc = nested_doc();
        let p = doc.select("#p1");
        let boundary = doc.select("#root");
        assert_eq!(ids(&doc, &p.parents_until_selection(&doc, &boundary)), vec!["s1"]);
    }

    #[test]
    fn test_sibling_walks() {
        let doc = Document::parse_html(
            "<ul><li id=n1>1</li><li id=n2>2</li><li id=n3>3</li>\
             <li id=n4>4</li><li id=n5>5</li><li id=n6>6</li></ul>",
        )
        .unwrap();
        let n1 = doc.select("#n1");
        let n4 = doc.select("#n4");

        assert_eq!(ids(&doc, &n1.next(&doc)), vec!["n2"]);
        assert!(n1.prev(&doc).is_empty());
        assert_eq!(ids(&doc, &n4.prev(&doc)), vec!["n3"]);
        assert_eq!(
            ids(&doc, &n1.next_all(&doc)),
            vec!["n2", "n3", "n4", "n5", "n6"]
        );
        // prev_all is nearest-first
        assert_eq!(ids(&doc, &n4.prev_all(&doc)), vec!["n3", "n2", "n1"]);
        assert_eq!(ids(&doc, &n1.next_until(&doc, "#n4")), vec!["n2", "n3"]);
        assert_eq!(ids(&doc, &n4.prev_until(&doc, "#n1")), vec!["n3", "n2"]);

        let boundary = doc.select("#n5");
        assert_eq!(
            ids(&doc, &n1.next_until_selection(&doc, &boundary)),
            vec!["n2", "n3", "n4"]
        );

        assert_eq!(
            ids(&doc, &n4.siblings(&doc)),
            vec!["n1", "n2", "n3", "n5", "n6"]
        );
    }

    #[test]
    fn test_sibling_walks_skip_text_nodes() {
        let doc = Document::parse_html("<ul><li id=a>1</li> text <li id=b>2</li></ul>").unwrap();
        let a = doc.select("#a");
        assert_eq!(ids(&doc, &a.next(&doc)), vec!["b"]);
    }

    #[test]
    fn test_find_excludes_context_node() {
        let doc = nested_doc();
        let sections = doc.select("section");
        // "section" within each section subtree matches nothing: the
        // context node itself is never a candidate.
        assert!(sections.find(&doc, "section").is_empty());
        assert_eq!(ids(&doc, &sections.find(&doc, "p")), vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_find_selection_membership() {
        let doc = nested_doc();
        let s1 = doc.select("#s1");
        let all_ps = doc.select("p");
        let inside = s1.find_selection(&doc, &all_ps);
        assert_eq!(ids(&doc, &inside), vec!["p1", "p2"]);
    }

    #[test]
    fn test_closest_self_or_ancestor() {
        let doc = nested_doc();
        let p = doc.select("#p1");
        assert_eq!(ids(&doc, &p.closest(&doc, "p")), vec!["p1"]);
        assert_eq!(ids(&doc, &p.closest(&doc, "section")), vec!["s1"]);
        assert!(p.closest(&doc, "table").is_empty());
    }

    #[test]
    fn test_filtered_variants_post_filter() {
        let doc = nested_doc();
        let root = doc.select("#root");
        assert_eq!(ids(&doc, &root.children_filtered(&doc, "#s2")), vec!["s2"]);
        let p1 = doc.select("#p1");
        assert_eq!(ids(&doc, &p1.parents_filtered(&doc, "div")), vec!["root"]);
        assert!(p1.next_filtered(&doc, "#p3").is_empty());
        assert_eq!(ids(&doc, &p1.next_filtered(&doc, "#p2")), vec!["p2"]);
        assert_eq!(ids(&doc, &p1.siblings_filtered(&doc, "p")), vec!["p2"]);
    }

    #[test]
    fn test_empty_selection_propagates() {
        let doc = nested_doc();
        let none = doc.select("table");
        assert!(none.children(&doc).is_empty());
        assert!(none.parents(&doc).is_empty());
        assert!(none.next_all(&doc).is_empty());
        assert!(none.find(&doc, "p").is_empty());
        assert!(none.siblings(&doc).is_empty());
    }

    #[test]
    fn test_rollback_law_for_traversals() {
        let doc = nested_doc();
        let sel = doc.select("p");
        assert_eq!(sel.children(&doc).rollback(), sel);
        assert_eq!(sel.parent(&doc).rollback(), sel);
        assert_eq!(sel.parents(&doc).rollback(), sel);
        assert_eq!(sel.parents_until(&doc, "#root").rollback(), sel);
        assert_eq!(sel.next(&doc).rollback(), sel);
        assert_eq!(sel.prev_all(&doc).rollback(), sel);
        assert_eq!(sel.siblings(&doc).rollback(), sel);
        assert_eq!(sel.find(&doc, "em").rollback(), sel);
        assert_eq!(sel.closest(&doc, "div").rollback(), sel);
    }
}
