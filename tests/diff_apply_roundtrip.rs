//! Diffing against a live tree: the patch program must transform a
//! rendered old tree into exactly what rendering the new tree directly
//! would have produced.

use espalier::apply::{apply, materialize};
use espalier::diff::diff;
use espalier::{Attribute, MemoryHost, Patch, RenderSession, VTree, Value};

use espalier::backend::HostBackend;

fn install_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[test]
fn text_swap_end_to_end() {
    install_tracing();

    let mut tree = VTree::new();
    let old_text = tree.text("a");
    let old_root = tree.element("div", vec![], vec![old_text]);
    let new_text = tree.text("b");
    let new_root = tree.element("div", vec![], vec![new_text]);

    let mut host = MemoryHost::new();
    let container = host.create_element("root");
    let mut session = RenderSession::new(host, container);
    session
        .full_render(&mut tree, old_root, |_value| {})
        .unwrap();
    assert_eq!(session.backend().collect_text(container).unwrap(), "a");

    let patches = diff(&mut tree, old_root, new_root).unwrap();
    assert_eq!(
        patches,
        vec![
            Patch::Descend { index: 0 },
            Patch::ReplaceText {
                index: 0,
                value: "b".into()
            },
            Patch::Ascend { levels: 1 },
        ]
    );

    session
        .diff_render(&mut tree, old_root, new_root, |_value| {})
        .unwrap();
    assert_eq!(session.backend().collect_text(container).unwrap(), "b");
}

#[test]
fn patched_tree_matches_direct_render() {
    let mut tree = VTree::new();

    let old_root = {
        let title = tree.text("old title");
        let heading = tree.element("h1", vec![Attribute::style("color", "red")], vec![title]);
        let first = tree.text("first");
        let second = tree.text("second");
        let item_a = tree.element("li", vec![], vec![first]);
        let item_b = tree.element("li", vec![], vec![second]);
        let list = tree.element("ul", vec![Attribute::plain("id", "items")], vec![item_a, item_b]);
        tree.element("div", vec![], vec![heading, list])
    };

    let new_root = {
        let title = tree.text("new title");
        let heading = tree.element("h1", vec![Attribute::style("color", "blue")], vec![title]);
        let first = tree.text("first");
        let third = tree.text("third");
        let fourth = tree.text("fourth");
        let item_a = tree.element("li", vec![], vec![first]);
        let item_c = tree.element("li", vec![], vec![third]);
        let item_d = tree.element("li", vec![], vec![fourth]);
        let list = tree.element(
            "ul",
            vec![Attribute::plain("id", "items"), Attribute::plain("role", "list")],
            vec![item_a, item_c, item_d],
        );
        tree.element("div", vec![], vec![heading, list])
    };

    // Render the old tree, then patch it forward.
    let mut patched = MemoryHost::new();
    let patched_container = patched.create_element("root");
    let rendered = materialize(&mut tree, &mut patched, old_root).unwrap();
    patched.append_child(patched_container, rendered).unwrap();

    let patches = diff(&mut tree, old_root, new_root).unwrap();
    assert!(!patches.is_empty());
    apply(&mut tree, &mut patched, patched_container, &patches).unwrap();

    // Render the new tree directly.
    let mut direct = MemoryHost::new();
    let direct_container = direct.create_element("root");
    let rendered = materialize(&mut tree, &mut direct, new_root).unwrap();
    direct.append_child(direct_container, rendered).unwrap();

    assert_eq!(
        patched.snapshot(patched_container).unwrap(),
        direct.snapshot(direct_container).unwrap()
    );
}

#[test]
fn attribute_update_adds_then_removes() {
    let mut tree = VTree::new();
    let old_root = tree.element(
        "div",
        vec![
            Attribute::plain("id", "x"),
            Attribute::plain("stale", "1"),
            Attribute::style("top", "0"),
        ],
        vec![],
    );
    let new_root = tree.element(
        "div",
        vec![Attribute::plain("id", "y"), Attribute::style("left", "2px")],
        vec![],
    );

    let mut host = MemoryHost::new();
    let container = host.create_element("root");
    let rendered = materialize(&mut tree, &mut host, old_root).unwrap();
    host.append_child(container, rendered).unwrap();

    let patches = diff(&mut tree, old_root, new_root).unwrap();
    apply(&mut tree, &mut host, container, &patches).unwrap();

    let target = host.child_at(container, 0).unwrap();
    assert_eq!(host.attribute(target, "id"), Some("y"));
    assert_eq!(host.attribute(target, "stale"), None);
    assert_eq!(host.style(target, "left"), Some("2px"));
    assert_eq!(host.style(target, "top"), None);
}

#[test]
fn tail_operations_address_the_cursor_itself() {
    let mut tree = VTree::new();
    let olds: Vec<_> = ["a", "b"].iter().map(|s| tree.text(*s)).collect();
    let news: Vec<_> = ["a", "b", "c", "d"].iter().map(|s| tree.text(*s)).collect();
    let old_root = tree.element("ul", vec![], olds);
    let new_root = tree.element("ul", vec![], news);

    let mut host = MemoryHost::new();
    let container = host.create_element("root");
    let rendered = materialize(&mut tree, &mut host, old_root).unwrap();
    host.append_child(container, rendered).unwrap();

    let patches = diff(&mut tree, old_root, new_root).unwrap();
    apply(&mut tree, &mut host, container, &patches).unwrap();
    assert_eq!(host.collect_text(container).unwrap(), "abcd");

    // And back down again.
    let patches = diff(&mut tree, new_root, old_root).unwrap();
    apply(&mut tree, &mut host, container, &patches).unwrap();
    assert_eq!(host.collect_text(container).unwrap(), "ab");
}

#[test]
fn variant_swap_discards_the_subtree() {
    let mut tree = VTree::new();
    let deep = tree.text("deep");
    let inner = tree.element("span", vec![], vec![deep]);
    let old_root = tree.element("div", vec![], vec![inner]);
    let replacement = tree.text("flat");
    let new_root = tree.element("div", vec![], vec![replacement]);

    let mut host = MemoryHost::new();
    let container = host.create_element("root");
    let rendered = materialize(&mut tree, &mut host, old_root).unwrap();
    host.append_child(container, rendered).unwrap();

    let patches = diff(&mut tree, old_root, new_root).unwrap();
    apply(&mut tree, &mut host, container, &patches).unwrap();

    let root = host.child_at(container, 0).unwrap();
    let child = host.child_at(root, 0).unwrap();
    assert_eq!(host.text_of(child).unwrap(), "flat");
}

#[test]
fn full_render_clears_previous_content() {
    let mut tree = VTree::new();
    let first_text = tree.text("first");
    let first = tree.element("div", vec![], vec![first_text]);
    let second_text = tree.text("second");
    let second = tree.element("div", vec![], vec![second_text]);

    let mut host = MemoryHost::new();
    let container = host.create_element("root");
    let mut session = RenderSession::new(host, container);

    session.full_render(&mut tree, first, |_value| {}).unwrap();
    session.full_render(&mut tree, second, |_value| {}).unwrap();

    assert_eq!(session.backend().child_count(container).unwrap(), 1);
    assert_eq!(
        session.backend().collect_text(container).unwrap(),
        "second"
    );
}

#[test]
fn unknown_event_kind_surfaces_at_apply() {
    let mut tree = VTree::new();
    let root = tree.element(
        "div",
        vec![Attribute::on("hover", Value::from("x"))],
        vec![],
    );

    let mut host = MemoryHost::new();
    let err = materialize(&mut tree, &mut host, root).unwrap_err();
    assert!(matches!(err, espalier::TreeError::UnknownVariant { .. }));
}
