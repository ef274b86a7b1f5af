//! Tree manipulation through selections.
//!
//! Every insertion operation takes a content source — a pattern evaluated
//! against the document root, another selection, or raw node ids — and
//! places that content relative to each node of the receiver.
//!
//! The clone-vs-move policy: with `k` target nodes, targets `0..k-1` receive
//! fresh deep clones of the content and the *last* target receives the
//! original nodes, detached from wherever they were. A single-target
//! insertion is therefore a pure move. Content order is preserved at every
//! target; the `after` and `prepend` families insert against a fixed anchor,
//! so the content list is reversed once up front to compensate.
//!
//! Manipulation mutates the document in place and returns the receiver
//! unchanged — no rollback frame is pushed, because the selection's node
//! set did not change. `empty` and `cloned` are the exceptions: they
//! produce *new* selections (former children, fresh copies) with no
//! rollback source, since neither is a derived view of the receiver.

use super::{Selection, lenient};
use crate::matcher::Matcher;
use crate::tree::{Document, NodeId};

/// Where content lands relative to a target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertPosition {
    /// As the target's last children.
    Append,
    /// As the target's first children.
    Prepend,
    /// As preceding siblings of the target.
    Before,
    /// As following siblings of the target.
    After,
}

impl Selection {
    // --- Append ---

    /// Appends the nodes matching `pattern` (evaluated against the document
    /// root) as the last children of each node in the selection.
    pub fn append(&self, doc: &mut Document, pattern: &str) -> &Self {
        let content = select_content(doc, pattern);
        self.insert(doc, InsertPosition::Append, content)
    }

    /// Appends the members of `content` as the last children of each node.
    pub fn append_selection(&self, doc: &mut Document, content: &Selection) -> &Self {
        content.check_doc(doc);
        self.insert(doc, InsertPosition::Append, content.nodes.clone())
    }

    /// Appends the given nodes as the last children of each node.
    pub fn append_nodes(&self, doc: &mut Document, content: &[NodeId]) -> &Self {
        self.insert(doc, InsertPosition::Append, content.to_vec())
    }

    // --- Prepend ---

    /// Inserts the nodes matching `pattern` as the first children of each
    /// node in the selection, preserving content order.
    pub fn prepend(&self, doc: &mut Document, pattern: &str) -> &Self {
        let content = select_content(doc, pattern);
        self.insert(doc, InsertPosition::Prepend, content)
    }

    /// Inserts the members of `content` as the first children of each node.
    pub fn prepend_selection(&self, doc: &mut Document, content: &Selection) -> &Self {
        content.check_doc(doc);
        self.insert(doc, InsertPosition::Prepend, content.nodes.clone())
    }

    /// Inserts the given nodes as the first children of each node.
    pub fn prepend_nodes(&self, doc: &mut Document, content: &[NodeId]) -> &Self {
        self.insert(doc, InsertPosition::Prepend, content.to_vec())
    }

    // --- Before ---

    /// Inserts the nodes matching `pattern` as preceding siblings of each
    /// node in the selection. Detached targets are skipped.
    pub fn before(&self, doc: &mut Document, pattern: &str) -> &Self {
        let content = select_content(doc, pattern);
        self.insert(doc, InsertPosition::Before, content)
    }

    /// Inserts the members of `content` as preceding siblings of each node.
    pub fn before_selection(&self, doc: &mut Document, content: &Selection) -> &Self {
        content.check_doc(doc);
        self.insert(doc, InsertPosition::Before, content.nodes.clone())
    }

    /// Inserts the given nodes as preceding siblings of each node.
    pub fn before_nodes(&self, doc: &mut Document, content: &[NodeId]) -> &Self {
        self.insert(doc, InsertPosition::Before, content.to_vec())
    }

    // --- After ---

    /// Inserts the nodes matching `pattern` as following siblings of each
    /// node in the selection. Detached targets are skipped.
    pub fn after(&self, doc: &mut Document, pattern: &str) -> &Self {
        let content = select_content(doc, pattern);
        self.insert(doc, InsertPosition::After, content)
    }

    /// Inserts the members of `content` as following siblings of each node.
    pub fn after_selection(&self, doc: &mut Document, content: &Selection) -> &Self {
        content.check_doc(doc);
        self.insert(doc, InsertPosition::After, content.nodes.clone())
    }

    /// Inserts the given nodes as following siblings of each node.
    pub fn after_nodes(&self, doc: &mut Document, content: &[NodeId]) -> &Self {
        self.insert(doc, InsertPosition::After, content.to_vec())
    }

    // --- Removal ---

    /// Detaches every node in the selection from its parent. The subtrees
    /// stay intact and remain addressed by this selection.
    pub fn remove(&self, doc: &mut Document) -> &Self {
        self.check_doc(doc);
        for &node in &self.nodes {
            doc.detach(node);
        }
        self
    }

    /// Detaches all children of every node in the selection and returns the
    /// former children as a new selection (in removal order, no rollback
    /// source).
    pub fn empty(&self, doc: &mut Document) -> Selection {
        self.check_doc(doc);
        let mut removed = Vec::new();
        for &node in &self.nodes {
            let children: Vec<NodeId> = doc.children(node).collect();
            for child in children {
                doc.detach(child);
                removed.push(child);
            }
        }
        self.detached_result(removed)
    }

    /// Produces fully independent deep copies of every node's subtree and
    /// returns them as a new selection. The copies are detached and have
    /// fresh identities, so they never compare equal to their sources.
    pub fn cloned(&self, doc: &mut Document) -> Selection {
        self.check_doc(doc);
        let copies = self
            .nodes
            .clone()
            .into_iter()
            .map(|node| doc.clone_subtree(node))
            .collect();
        self.detached_result(copies)
    }

    /// The shared insertion loop implementing the clone-vs-move policy.
    fn insert(
        &self,
        doc: &mut Document,
        position: InsertPosition,
        mut content: Vec<NodeId>,
    ) -> &Self {
        self.check_doc(doc);
        if self.nodes.is_empty() || content.is_empty() {
            return self;
        }

        // Fixed-anchor positions consume content back to front.
        if matches!(position, InsertPosition::Prepend | InsertPosition::After) {
            content.reverse();
        }

        let last = self.nodes.len() - 1;
        for (i, &target) in self.nodes.iter().enumerate() {
            if matches!(position, InsertPosition::Before | InsertPosition::After)
                && doc.parent(target).is_none()
            {
                log::warn!("insertion relative to a detached node skipped");
                continue;
            }

            for &item in &content {
                // Refuse to move a node into its own subtree.
                if item == target || doc.ancestors(target).any(|a| a == item) {
                    log::warn!("skipping insertion of a node into its own subtree");
                    continue;
                }

                let node = if i == last {
                    doc.detach(item);
                    item
                } else {
                    doc.clone_subtree(item)
                };

                match position {
                    InsertPosition::Append => doc.append_child(target, node),
                    InsertPosition::Prepend => doc.prepend_child(target, node),
                    InsertPosition::Before => doc.insert_before(target, node),
                    InsertPosition::After => doc.insert_after(target, node),
                }
            }
        }
        self
    }
}

/// Resolves a content pattern against the whole document.
fn select_content(doc: &Document, pattern: &str) -> Vec<NodeId> {
    lenient(pattern).match_all(doc, doc.root())
}
