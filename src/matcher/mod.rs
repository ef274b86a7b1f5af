//! Selector matcher capability.
//!
//! The selection engine consumes matching as a narrow capability: anything
//! implementing [`Matcher`] can test a single node, enumerate matches within
//! a subtree, or filter a node list. The crate ships two adapters:
//!
//! - [`Pattern`] — a compiled CSS selector (the real selector-compiler
//!   adapter). See [`parser`] for the supported grammar.
//! - [`MatchNothing`] — matches nothing, ever. This is also what lenient
//!   compilation degrades to, so operations driven by a pattern string can
//!   treat an uncompilable pattern as "no match" instead of an error.
//!
//! Strict compilation ([`Pattern::compile`]) is the single entry point that
//! surfaces [`PatternError`] to callers.
//!
//! # Submodules
//!
//! - [`ast`]: parsed pattern representation.
//! - [`parser`]: recursive descent pattern parser.
//! - [`eval`]: matching of parsed patterns against a document tree.

pub mod ast;
mod eval;
pub mod parser;

use crate::error::PatternError;
use crate::tree::{Document, NodeId};
use ast::SelectorList;

/// Capability for testing and enumerating nodes against a pattern.
///
/// `match_all` and `filter_nodes` have default implementations in terms of
/// [`matches`](Matcher::matches); implementors only need the single-node
/// test.
pub trait Matcher {
    /// Tests whether a single node matches.
    fn matches(&self, doc: &Document, node: NodeId) -> bool;

    /// Returns all matching nodes within the subtree rooted at `root`, in
    /// document order. The subtree root itself is excluded.
    fn match_all(&self, doc: &Document, root: NodeId) -> Vec<NodeId> {
        doc.descendants(root)
            .filter(|&id| self.matches(doc, id))
            .collect()
    }

    /// Returns the sublist of `nodes` that match, preserving order.
    fn filter_nodes(&self, doc: &Document, nodes: &[NodeId]) -> Vec<NodeId> {
        nodes
            .iter()
            .copied()
            .filter(|&id| self.matches(doc, id))
            .collect()
    }
}

/// A compiled selector pattern.
///
/// Obtained from [`Pattern::compile`] (strict, returns [`PatternError`] on
/// bad input) or [`Pattern::compile_lenient`] (never fails; invalid input
/// yields a pattern that matches nothing).
///
/// # Examples
///
/// ```
/// use domquery::matcher::{Matcher, Pattern};
/// use domquery::Document;
///
/// let doc = Document::parse_html("<p class='a'>x</p><p>y</p>").unwrap();
/// let pattern = Pattern::compile("p.a").unwrap();
/// assert_eq!(pattern.match_all(&doc, doc.root()).len(), 1);
///
/// assert!(Pattern::compile("p..").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Pattern {
    /// The original pattern text, for diagnostics.
    source: String,
    /// The parsed selector; `None` means the pattern matches nothing
    /// (lenient compilation of invalid input).
    list: Option<SelectorList>,
}

impl Pattern {
    /// Compiles a pattern string, rejecting invalid input.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] describing the first syntax problem.
    pub fn compile(source: &str) -> Result<Self, PatternError> {
        let list = parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            list: Some(list),
        })
    }

    /// Compiles a pattern string, degrading invalid input to a pattern that
    /// matches nothing.
    ///
    /// This is what every internal pattern consumer uses, so filter/find
    /// style operations return empty results for bad patterns instead of
    /// propagating an error through every call site.
    #[must_use]
    pub fn compile_lenient(source: &str) -> Self {
        match parser::parse(source) {
            Ok(list) => Self {
                source: source.to_string(),
                list: Some(list),
            },
            Err(err) => {
                log::debug!("pattern {source:?} failed to compile, matching nothing: {err}");
                Self {
                    source: source.to_string(),
                    list: None,
                }
            }
        }
    }

    /// Returns the original pattern text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns true if this pattern can never match (lenient compilation of
    /// invalid input).
    #[must_use]
    pub fn never_matches(&self) -> bool {
        self.list.is_none()
    }
}

impl Matcher for Pattern {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        match &self.list {
            Some(list) => eval::matches_list(doc, node, list),
            None => false,
        }
    }
}

/// The always-fails adapter: matches no node.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchNothing;

impl Matcher for MatchNothing {
    fn matches(&self, _doc: &Document, _node: NodeId) -> bool {
        false
    }

    fn match_all(&self, _doc: &Document, _root: NodeId) -> Vec<NodeId> {
        Vec::new()
    }

    fn filter_nodes(&self, _doc: &Document, _nodes: &[NodeId]) -> Vec<NodeId> {
        Vec::new()
    }
}
