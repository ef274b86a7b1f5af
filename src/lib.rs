//! domquery — query and manipulate HTML documents with CSS selectors.
//!
//! The crate parses HTML into an arena-backed [`Document`] and exposes a
//! [`Selection`] engine over it: an ordered, duplicate-free set of node
//! references that traversal, filtering, and manipulation operations flow
//! through, each recording its source so [`Selection::rollback`] can restore
//! the previous set.
//!
//! # Quick start
//!
//! ```
//! use domquery::Document;
//!
//! let mut doc = Document::parse_html(
//!     "<ul><li id='a'>one</li><li id='b' class='pick'>two</li></ul>",
//! ).unwrap();
//!
//! let items = doc.select("li");
//! assert_eq!(items.len(), 2);
//!
//! let picked = items.filter(&doc, ".pick");
//! assert_eq!(picked.text(&doc), "two");
//! assert_eq!(picked.rollback(), items);
//!
//! picked.set_attr(&mut doc, "data-seen", "yes");
//! assert_eq!(doc.select("[data-seen]").len(), 1);
//! ```
//!
//! # Module overview
//!
//! - [`tree`]: the arena document tree — nodes, navigation, mutation.
//! - [`html`]: the error-tolerant HTML parser and byte decoding.
//! - [`matcher`]: the [`Matcher`](matcher::Matcher) capability and the CSS
//!   selector compiler behind it.
//! - [`select`]: the `Selection` engine — traversal, set algebra,
//!   manipulation, properties, iteration.
//! - [`error`]: error and diagnostic types.
//!
//! # Concurrency
//!
//! A `Document` is an ordinary owned value: `Send`, and shareable across
//! threads behind `&Document` for read-only work. Mutation requires
//! `&mut Document`, so the borrow checker rules out concurrent writes.
//! Selections are plain data (node ids plus a document id) and are `Send`
//! and `Sync` themselves.

pub mod error;
pub mod html;
pub mod matcher;
pub mod select;
pub mod tree;

pub use error::{OutOfRangeError, ParseError, PatternError};
pub use matcher::{Matcher, Pattern};
pub use select::Selection;
pub use tree::{Document, NodeId, NodeKind};
