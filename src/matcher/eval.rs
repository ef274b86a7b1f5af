//! Selector evaluation against a document tree.
//!
//! Complex selectors are evaluated right-to-left: the rightmost compound is
//! tested against the candidate node, then the chain walks outward through
//! the tree (ancestors for descendant/child combinators, preceding element
//! siblings for the sibling combinators).

use super::ast::{
    AttrOp, AttrSelector, Combinator, ComplexSelector, CompoundPart, CompoundSelector,
    PseudoClass, SelectorList,
};
use crate::tree::{Document, NodeId};

/// Tests a node against a full selector list (any group may match).
///
/// Only element nodes can match; every other kind returns false.
pub(crate) fn matches_list(doc: &Document, node: NodeId, list: &SelectorList) -> bool {
    if !doc.node(node).kind.is_element() {
        return false;
    }
    list.groups
        .iter()
        .any(|group| matches_complex(doc, node, group))
}

fn matches_complex(doc: &Document, node: NodeId, complex: &ComplexSelector) -> bool {
    matches_parts(doc, node, &complex.parts)
}

/// Right-to-left match of a combinator chain ending at `node`.
fn matches_parts(doc: &Document, node: NodeId, parts: &[CompoundPart]) -> bool {
    let Some((last, rest)) = parts.split_last() else {
        return true;
    };
    if !matches_compound(doc, node, &last.compound) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }

    match last.combinator {
        Combinator::None => true,
        Combinator::Descendant => doc
            .ancestors(node)
            .filter(|&a| doc.node(a).kind.is_element())
            .any(|a| matches_parts(doc, a, rest)),
        Combinator::Child => match doc.parent(node) {
            Some(p) if doc.node(p).kind.is_element() => matches_parts(doc, p, rest),
            _ => false,
        },
        Combinator::NextSibling => match prev_element_sibling(doc, node) {
            Some(prev) => matches_parts(doc, prev, rest),
            None => false,
        },
        Combinator::SubsequentSibling => {
            let mut current = prev_element_sibling(doc, node);
            while let Some(prev) = current {
                if matches_parts(doc, prev, rest) {
                    return true;
                }
                current = prev_element_sibling(doc, prev);
            }
            false
        }
    }
}

fn prev_element_sibling(doc: &Document, node: NodeId) -> Option<NodeId> {
    let mut current = doc.prev_sibling(node);
    while let Some(id) = current {
        if doc.node(id).kind.is_element() {
            return Some(id);
        }
        current = doc.prev_sibling(id);
    }
    None
}

fn next_element_sibling(doc: &Document, node: NodeId) -> Option<NodeId> {
    let mut current = doc.next_sibling(node);
    while let Some(id) = current {
        if doc.node(id).kind.is_element() {
            return Some(id);
        }
        current = doc.next_sibling(id);
    }
    None
}

/// 1-based position of `node` among its parent's element children.
fn element_position(doc: &Document, node: NodeId) -> Option<i32> {
    let parent = doc.parent(node)?;
    let mut position = 0;
    for child in doc.children(parent) {
        if doc.node(child).kind.is_element() {
            position += 1;
            if child == node {
                return Some(position);
            }
        }
    }
    None
}

pub(crate) fn matches_compound(doc: &Document, node: NodeId, compound: &CompoundSelector) -> bool {
    if !doc.node(node).kind.is_element() {
        return false;
    }

    if let Some(tag) = &compound.tag {
        if doc.node_name(node) != Some(tag.as_str()) {
            return false;
        }
    }

    if let Some(id) = &compound.id {
        if doc.attribute(node, "id") != Some(id.as_str()) {
            return false;
        }
    }

    if !compound.classes.is_empty() {
        let Some(class_attr) = doc.attribute(node, "class") else {
            return false;
        };
        for class in &compound.classes {
            if !class_attr
                .split_ascii_whitespace()
                .any(|token| token == class)
            {
                return false;
            }
        }
    }

    for attr in &compound.attrs {
        if !matches_attr(doc, node, attr) {
            return false;
        }
    }

    for pseudo in &compound.pseudos {
        if !matches_pseudo(doc, node, pseudo) {
            return false;
        }
    }

    true
}

fn matches_attr(doc: &Document, node: NodeId, attr: &AttrSelector) -> bool {
    let Some(value) = doc.attribute(node, &attr.name) else {
        return false;
    };
    match attr.op {
        AttrOp::Exists => true,
        AttrOp::Equals => value == attr.value,
        AttrOp::Prefix => !attr.value.is_empty() && value.starts_with(&attr.value),
        AttrOp::Suffix => !attr.value.is_empty() && value.ends_with(&attr.value),
        AttrOp::Contains => !attr.value.is_empty() && value.contains(&attr.value),
        AttrOp::Includes => value
            .split_ascii_whitespace()
            .any(|token| token == attr.value),
        AttrOp::DashMatch => {
            value == attr.value
                || value
                    .strip_prefix(&attr.value)
                    .is_some_and(|rest| rest.starts_with('-'))
        }
    }
}

fn matches_pseudo(doc: &Document, node: NodeId, pseudo: &PseudoClass) -> bool {
    match pseudo {
        PseudoClass::FirstChild => {
            doc.parent(node).is_some() && prev_element_sibling(doc, node).is_none()
        }
        PseudoClass::LastChild => {
            doc.parent(node).is_some() && next_element_sibling(doc, node).is_none()
        }
        PseudoClass::NthChild(nth) => {
            element_position(doc, node).is_some_and(|pos| nth.matches(pos))
        }
        PseudoClass::Not(inner) => !matches_compound(doc, node, inner),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::matcher::{Matcher, Pattern};
    use crate::tree::Document;

    fn doc() -> Document {
        Document::parse_html(
            r#"<div id="top" class="outer box">
                 <p class="lead">first</p>
                 <p>second</p>
                 <ul id="menu" data-kind="menu">
                   <li id="a"><a href="https://example.com/x">x</a></li>
                   <li id="b" class="active">y</li>
                   <li id="c">z</li>
                 </ul>
               </div>"#,
        )
        .unwrap()
    }

    fn select_ids(doc: &Document, pattern: &str) -> Vec<String> {
        let matcher = Pattern::compile(pattern).unwrap();
        matcher
            .match_all(doc, doc.root())
            .into_iter()
            .filter_map(|id| doc.attribute(id, "id").map(str::to_string))
            .collect()
    }

    #[test]
    fn test_tag_and_id() {
        let doc = doc();
        assert_eq!(select_ids(&doc, "li"), vec!["a", "b", "c"]);
        assert_eq!(select_ids(&doc, "#b"), vec!["b"]);
        assert_eq!(select_ids(&doc, "li#c"), vec!["c"]);
    }

    #[test]
    fn test_class_matching() {
        let doc = doc();
        assert_eq!(select_ids(&doc, ".active"), vec!["b"]);
        // Multi-class attribute: both tokens match
        assert_eq!(select_ids(&doc, ".outer.box"), vec!["top"]);
        assert!(select_ids(&doc, ".missing").is_empty());
    }

    #[test]
    fn test_attribute_ops() {
        let doc = doc();
        assert_eq!(select_ids(&doc, "[data-kind]"), vec!["menu"]);
        assert_eq!(select_ids(&doc, "[data-kind=menu]"), vec!["menu"]);
        let pattern = Pattern::compile("a[href^='https:']").unwrap();
        assert_eq!(pattern.match_all(&doc, doc.root()).len(), 1);
        let pattern = Pattern::compile("a[href$='/x']").unwrap();
        assert_eq!(pattern.match_all(&doc, doc.root()).len(), 1);
        let pattern = Pattern::compile("[class~=box]").unwrap();
        assert_eq!(pattern.match_all(&doc, doc.root()).len(), 1);
    }

    #[test]
    fn test_combinators() {
        let doc = doc();
        assert_eq!(select_ids(&doc, "ul > li"), vec!["a", "b", "c"]);
        assert_eq!(select_ids(&doc, "div li"), vec!["a", "b", "c"]);
        assert_eq!(select_ids(&doc, "#a + li"), vec!["b"]);
        assert_eq!(select_ids(&doc, "#a ~ li"), vec!["b", "c"]);
        // Child combinator does not reach deeper levels
        assert!(select_ids(&doc, "div > a").is_empty());
    }

    #[test]
    fn test_pseudo_classes() {
        let doc = doc();
        assert_eq!(select_ids(&doc, "li:first-child"), vec!["a"]);
        assert_eq!(select_ids(&doc, "li:last-child"), vec!["c"]);
        assert_eq!(select_ids(&doc, "li:nth-child(2)"), vec!["b"]);
        assert_eq!(select_ids(&doc, "li:nth-child(odd)"), vec!["a", "c"]);
        assert_eq!(select_ids(&doc, "li:not(.active)"), vec!["a", "c"]);
    }

    #[test]
    fn test_groups_in_document_order() {
        let doc = doc();
        // Groups union in document order, not group order
        assert_eq!(select_ids(&doc, "#c, #a"), vec!["a", "c"]);
    }

    #[test]
    fn test_match_all_excludes_root() {
        let doc = doc();
        let ul = Pattern::compile("ul").unwrap().match_all(&doc, doc.root())[0];
        // Matching "ul" within the ul subtree finds nothing: the context
        // node itself is excluded.
        assert!(Pattern::compile("ul").unwrap().match_all(&doc, ul).is_empty());
    }
}
