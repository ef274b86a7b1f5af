//! The Selection set engine.
//!
//! A [`Selection`] is an ordered, identity-deduplicated set of node
//! references into one [`Document`], plus a link to the selection it was
//! derived from. Every producing operation allocates a new `Selection`
//! through [`Selection::push_stack`], which enforces the two engine-wide
//! invariants regardless of which operation ran:
//!
//! - **no two entries reference the same node** (structural identity, first
//!   occurrence wins — a hard ordering guarantee, not an artifact), and
//! - **the source selection is recorded**, so [`Selection::rollback`]
//!   restores the selection that was active before the operation.
//!
//! Selections do not borrow the document. All operations take an explicitly
//! passed `&Document` (traversal, set algebra) or `&mut Document`
//! (manipulation), so the borrow checker serializes mutation and there is no
//! hidden document state. Each selection records its document's
//! [`DocumentId`]; debug builds assert the pairing on every operation.
//!
//! After the manipulation engine detaches nodes, stale selections remain
//! usable: traversal from a detached node simply finds no parent and no
//! siblings, so results are valid but possibly empty.
//!
//! # Submodules
//!
//! - [`traversal`]: parent/ancestor/sibling/descendant walks.
//! - [`filter`]: set algebra (filter, exclude, intersect, union, has).
//! - [`manipulation`]: tree mutation with the clone-vs-move policy.
//! - [`property`]: attribute, class, and text access.
//! - [`iter`]: lazy iteration over a selection's nodes.

mod filter;
mod iter;
mod manipulation;
mod property;
mod traversal;

pub use iter::Iter;

use std::collections::HashSet;

use crate::error::OutOfRangeError;
use crate::matcher::Pattern;
use crate::tree::{Document, DocumentId, NodeId};

/// An ordered, duplicate-free set of node references with a rollback source.
///
/// Immutable once constructed; every operation returns a new `Selection`.
/// Comparison (`==`) is by node-list identity and document id — the rollback
/// chain does not participate.
///
/// # Examples
///
/// ```
/// use domquery::Document;
///
/// let doc = Document::parse_html("<ul><li id=a>x</li><li id=b>y</li></ul>").unwrap();
/// let items = doc.select("li");
/// let b = items.filter(&doc, "#b");
/// assert_eq!(b.attr(&doc, "id").as_deref(), Some("b"));
/// assert_eq!(b.rollback(), items);
/// ```
#[derive(Debug, Clone)]
pub struct Selection {
    /// The referenced nodes, in first-occurrence order.
    nodes: Vec<NodeId>,
    /// Identity of the document the nodes belong to.
    doc_id: DocumentId,
    /// The selection this one was derived from, for rollback.
    prev: Option<Box<Selection>>,
}

impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        self.doc_id == other.doc_id && self.nodes == other.nodes
    }
}

impl Eq for Selection {}

impl Selection {
    /// Creates a selection over no nodes, tied to a document.
    #[must_use]
    pub fn none(doc: &Document) -> Self {
        Self {
            nodes: Vec::new(),
            doc_id: doc.id(),
            prev: None,
        }
    }

    /// Creates a singleton selection over one node.
    #[must_use]
    pub fn from_node(doc: &Document, node: NodeId) -> Self {
        Self {
            nodes: vec![node],
            doc_id: doc.id(),
            prev: None,
        }
    }

    /// Creates a selection from a raw node list, deduplicating by identity
    /// (first occurrence wins). No rollback source is recorded.
    #[must_use]
    pub fn from_nodes(doc: &Document, nodes: Vec<NodeId>) -> Self {
        Self {
            nodes: dedup_first(nodes),
            doc_id: doc.id(),
            prev: None,
        }
    }

    /// Builds the successor selection for a producing operation: dedup the
    /// candidate list (first occurrence wins) and record the receiver as the
    /// rollback source.
    pub(crate) fn push_stack(&self, nodes: Vec<NodeId>) -> Self {
        Self {
            nodes: dedup_first(nodes),
            doc_id: self.doc_id,
            prev: Some(Box::new(self.clone())),
        }
    }

    /// Builds a successor with the same node list semantics but no rollback
    /// source (used by `empty` and `cloned`, whose results are not derived
    /// views of the receiver).
    pub(crate) fn detached_result(&self, nodes: Vec<NodeId>) -> Self {
        Self {
            nodes: dedup_first(nodes),
            doc_id: self.doc_id,
            prev: None,
        }
    }

    /// Asserts (debug builds) that this selection belongs to `doc`.
    pub(crate) fn check_doc(&self, doc: &Document) {
        debug_assert_eq!(
            self.doc_id,
            doc.id(),
            "selection used with a document it was not derived from"
        );
    }

    /// Returns the selection that was active before the most recent
    /// producing operation, or a copy of the receiver if none was recorded.
    ///
    /// For every traversal, filter, and set operation `op`,
    /// `op(sel).rollback() == sel` holds by node-list identity and document
    /// reference. Manipulation operations mutate in place and push no frame.
    #[must_use]
    pub fn rollback(&self) -> Self {
        match &self.prev {
            Some(prev) => (**prev).clone(),
            None => self.clone(),
        }
    }

    /// Returns the referenced nodes in order.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Returns the identity of the document this selection was derived from.
    #[must_use]
    pub fn document_id(&self) -> DocumentId {
        self.doc_id
    }

    /// Returns the number of referenced nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the selection references no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if `node` is a member of this selection.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Returns the position of `node` within this selection, if present.
    #[must_use]
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }

    // --- Indexed access ---

    /// Reduces the selection to its first node (empty stays empty).
    #[must_use]
    pub fn first(&self) -> Self {
        self.push_stack(self.nodes.first().copied().into_iter().collect())
    }

    /// Reduces the selection to its last node (empty stays empty).
    #[must_use]
    pub fn last(&self) -> Self {
        self.push_stack(self.nodes.last().copied().into_iter().collect())
    }

    /// Reduces the selection to the node at `index`. Negative indices count
    /// from the end (`-1` is the last node).
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] when the resolved index is outside the
    /// selection. There is no clamping.
    pub fn eq(&self, index: isize) -> Result<Self, OutOfRangeError> {
        let resolved = self.resolve_index(index)?;
        Ok(self.push_stack(vec![self.nodes[resolved]]))
    }

    /// Returns the node at `index`. Negative indices count from the end.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] when the resolved index is outside the
    /// selection.
    pub fn get(&self, index: isize) -> Result<NodeId, OutOfRangeError> {
        let resolved = self.resolve_index(index)?;
        Ok(self.nodes[resolved])
    }

    /// Reduces the selection to the half-open range `start..end`. Negative
    /// endpoints count from the end; `end` may equal the length.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] when either endpoint falls outside the
    /// selection or the range is inverted.
    pub fn slice(&self, start: isize, end: isize) -> Result<Self, OutOfRangeError> {
        let len = self.nodes.len();
        let resolve_endpoint = |raw: isize| -> Result<usize, OutOfRangeError> {
            let resolved = if raw < 0 { raw + len as isize } else { raw };
            if resolved < 0 || resolved > len as isize {
                return Err(OutOfRangeError {
                    index: resolved,
                    len,
                });
            }
            Ok(resolved as usize)
        };

        let start = resolve_endpoint(start)?;
        let end = resolve_endpoint(end)?;
        if start > end {
            return Err(OutOfRangeError {
                index: start as isize,
                len: end,
            });
        }
        Ok(self.push_stack(self.nodes[start..end].to_vec()))
    }

    fn resolve_index(&self, index: isize) -> Result<usize, OutOfRangeError> {
        let len = self.nodes.len();
        let resolved = if index < 0 {
            index + len as isize
        } else {
            index
        };
        if resolved < 0 || resolved >= len as isize {
            return Err(OutOfRangeError {
                index: resolved,
                len,
            });
        }
        Ok(resolved as usize)
    }
}

/// Removes duplicate node identities, keeping the first occurrence.
fn dedup_first(nodes: Vec<NodeId>) -> Vec<NodeId> {
    let mut seen = HashSet::with_capacity(nodes.len());
    let mut result = Vec::with_capacity(nodes.len());
    for node in nodes {
        if seen.insert(node) {
            result.push(node);
        }
    }
    result
}

impl Document {
    /// Returns the root selection: a singleton over the document node.
    ///
    /// This gives a `Document` the same query surface as a selection
    /// anchored at its root.
    #[must_use]
    pub fn selection(&self) -> Selection {
        Selection::from_node(self, self.root())
    }

    /// Finds all nodes in the document matching `pattern`.
    ///
    /// The pattern is compiled leniently: an invalid pattern yields an empty
    /// selection. Use [`Pattern::compile`](crate::matcher::Pattern::compile)
    /// to surface compilation errors.
    #[must_use]
    pub fn select(&self, pattern: &str) -> Selection {
        self.selection().find(self, pattern)
    }
}

pub(crate) fn lenient(pattern: &str) -> Pattern {
    Pattern::compile_lenient(pattern)
}
