//! End-to-end tests for the manipulation engine: the clone-vs-move policy,
//! ordering at every insertion position, removal, and clone isolation.

use domquery::{Document, Selection};
use pretty_assertions::assert_eq;

fn child_ids(doc: &Document, node: domquery::NodeId) -> Vec<String> {
    doc.children(node)
        .filter_map(|c| doc.attribute(c, "id").map(str::to_string))
        .collect()
}

#[test]
fn one_content_three_targets_clones_then_moves() {
    let mut doc = Document::parse_html(
        "<div id='t1'></div><div id='t2'></div><div id='t3'></div>\
         <span id='c'>payload</span>",
    )
    .unwrap();

    let targets = doc.select("div");
    let content = doc.select("#c");
    let original = content.nodes()[0];

    targets.append_selection(&mut doc, &content);

    // Every target now holds exactly one span with the payload.
    for &target in targets.nodes() {
        let children: Vec<_> = doc.children(target).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(doc.text_content(children[0]), "payload");
    }

    // The original moved into the last target; earlier targets got clones.
    let last_child = doc.first_child(targets.nodes()[2]).unwrap();
    assert_eq!(last_child, original);
    let first_child = doc.first_child(targets.nodes()[0]).unwrap();
    assert_ne!(first_child, original);

    // Clone isolation: mutating a clone leaves the original untouched.
    Selection::from_node(&doc, first_child).set_attr(&mut doc, "data-x", "1");
    assert_eq!(doc.attribute(original, "data-x"), None);
}

#[test]
fn before_and_after_keep_content_order_at_each_target() {
    let mut doc = Document::parse_html(
        "<div id='wrap'>\
           <b id='anchor'></b>\
         </div>\
         <i id='c1'></i><i id='c2'></i>",
    )
    .unwrap();

    let anchor = doc.select("#anchor");
    anchor.after(&mut doc, "i");

    let wrap = doc.select("#wrap").nodes()[0];
    assert_eq!(child_ids(&doc, wrap), vec!["anchor", "c1", "c2"]);

    // Move them again, this time in front.
    let italics = doc.select("i");
    anchor.before_selection(&mut doc, &italics);
    assert_eq!(child_ids(&doc, wrap), vec!["c1", "c2", "anchor"]);
}

#[test]
fn prepend_and_append_at_multiple_targets() {
    let mut doc = Document::parse_html(
        "<ul id='u1'><li id='old1'></li></ul>\
         <ul id='u2'><li id='old2'></li></ul>\
         <li id='n1'></li><li id='n2'></li>",
    )
    .unwrap();

    let lists = doc.select("ul");
    lists.prepend(&mut doc, "body > li");

    let u1 = doc.select("#u1").nodes()[0];
    let u2 = doc.select("#u2").nodes()[0];

    // Clones in the first list, originals in the last, order preserved.
    let first = child_ids(&doc, u1);
    assert_eq!(first, vec!["n1", "n2", "old1"]);
    let second = child_ids(&doc, u2);
    assert_eq!(second, vec!["n1", "n2", "old2"]);

    // Nothing left at the old position.
    assert_eq!(doc.select("body > li").len(), 0);
}

#[test]
fn remove_then_reinsert_elsewhere() {
    let mut doc = Document::parse_html(
        "<div id='from'><p id='moved'>x</p></div><div id='to'></div>",
    )
    .unwrap();

    let p = doc.select("#moved");
    p.remove(&mut doc);
    assert_eq!(doc.select("#from p").len(), 0);

    // Stale selections traverse to empty, never panic.
    assert!(p.parent(&doc).is_empty());
    assert!(p.siblings(&doc).is_empty());

    // The detached subtree can be inserted again.
    doc.select("#to").append_selection(&mut doc, &p);
    assert_eq!(doc.select("#to p").text(&doc), "x");
}

#[test]
fn empty_strips_children_and_returns_them() {
    let mut doc = Document::parse_html(
        "<div id='box'><p id='p1'>a</p><p id='p2'>b</p></div>",
    )
    .unwrap();

    let target = doc.select("#box");
    let removed = target.empty(&mut doc);

    assert_eq!(target.text(&doc), "");
    assert_eq!(removed.len(), 2);
    assert_eq!(removed.text(&doc), "ab");
    assert!(removed.nodes().iter().all(|&n| doc.parent(n).is_none()));
}

#[test]
fn cloned_selection_is_fully_independent() {
    let mut doc =
        Document::parse_html("<ul id='src'><li>a</li><li>b</li></ul>").unwrap();

    let source = doc.select("li");
    let copies = source.cloned(&mut doc);

    assert_eq!(copies.len(), 2);
    for (&copy, &orig) in copies.nodes().iter().zip(source.nodes()) {
        assert_ne!(copy, orig);
        assert!(doc.parent(copy).is_none());
    }

    // Attach the copies somewhere and mutate them.
    let target = doc.select("#src");
    target.append_selection(&mut doc, &copies);
    assert_eq!(doc.select("li").len(), 4);

    copies.set_attr(&mut doc, "data-copy", "1");
    assert!(source
        .nodes()
        .iter()
        .all(|&n| doc.attribute(n, "data-copy").is_none()));
}

#[test]
fn manipulation_pushes_no_rollback_frame() {
    let mut doc =
        Document::parse_html("<div id='box'></div><p id='c'></p>").unwrap();

    let target = doc.select("#box");
    let before = target.clone();
    target.append(&mut doc, "#c");

    assert_eq!(target, before);
    // Rollback still unwinds the *query* chain, not the mutation.
    assert_eq!(target.rollback(), doc.selection());
}

#[test]
fn insertion_with_empty_content_or_targets_is_a_noop() {
    let mut doc = Document::parse_html("<div id='box'><p>x</p></div>").unwrap();
    let node_count = doc.node_count();

    doc.select("#box").append(&mut doc, ".absent");
    doc.select(".absent").append(&mut doc, "p");

    assert_eq!(doc.node_count(), node_count);
    assert_eq!(doc.select("#box p").len(), 1);
}
