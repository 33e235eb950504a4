//! The diff engine: walks two vnode trees structurally and emits a flat
//! patch program describing the minimal positional edit script between
//! them.
//!
//! Children are diffed strictly by position; insertion and removal happen
//! only at the tail. There is no keyed reconciliation and no move
//! detection.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::error::TreeError;
use crate::patch::{AttrDiff, Patch};
use crate::vnode::{AttrKind, Attribute, NodeId, RenderFn, VNode, VTree, Value};

/// Compute the patch program transforming the tree rooted at `old` into
/// the tree rooted at `new`. Pure except for the documented side effect of
/// filling the cache slots of `new`'s lazy nodes as they are decided.
pub fn diff(tree: &mut VTree, old: NodeId, new: NodeId) -> Result<Vec<Patch>, TreeError> {
    let mut patches = Vec::new();
    diff_node(tree, old, new, &mut patches, 0)?;
    trace!(patches = patches.len(), "computed patch program");
    Ok(patches)
}

/// What `diff_node` decided to do after inspecting both nodes, captured as
/// owned data so the arena can be re-borrowed mutably while acting on it.
enum Step {
    Unchanged,
    Replace,
    ReplaceText(String),
    LazyReuse(Option<NodeId>),
    LazyForce(RenderFn, Vec<Value>),
    Element {
        attr_update: Option<AttrDiff>,
        old_children: Vec<NodeId>,
        new_children: Vec<NodeId>,
    },
}

fn diff_node(
    tree: &mut VTree,
    old: NodeId,
    new: NodeId,
    patches: &mut Vec<Patch>,
    index: usize,
) -> Result<(), TreeError> {
    // Handle equality marks the subtree as definitely unchanged; this must
    // run before any structural inspection.
    if old == new {
        return Ok(());
    }

    let step = {
        let a = tree.get(old)?;
        let b = tree.get(new)?;
        plan(a, b)
    };

    match step {
        Step::Unchanged => {}
        Step::Replace => patches.push(Patch::ReplaceNode { index, node: new }),
        Step::ReplaceText(value) => patches.push(Patch::ReplaceText { index, value }),
        Step::LazyReuse(cached) => {
            if let VNode::Lazy(lazy) = tree.get_mut(new)? {
                lazy.cached = cached;
            }
        }
        Step::LazyForce(render, args) => {
            let forced = render(&args, tree)?;
            if let VNode::Lazy(lazy) = tree.get_mut(new)? {
                lazy.cached = Some(forced);
            }
            patches.push(Patch::ReplaceNode {
                index,
                node: forced,
            });
        }
        Step::Element {
            attr_update,
            old_children,
            new_children,
        } => {
            if let Some(update) = attr_update {
                patches.push(Patch::UpdateAttrs { index, update });
            }
            // Tentative navigation marker; popped again if nothing below
            // produced a patch, so untouched subtrees cost zero operations.
            patches.push(Patch::Descend { index });
            let mark = patches.len();
            diff_children(tree, &old_children, &new_children, patches, index)?;
            if patches.len() > mark {
                patches.push(Patch::Ascend { levels: 1 });
            } else {
                patches.pop();
            }
        }
    }
    Ok(())
}

fn plan(a: &VNode, b: &VNode) -> Step {
    if !a.same_kind(b) {
        return Step::Replace;
    }
    match (a, b) {
        (VNode::Text { value: old }, VNode::Text { value: new }) => {
            if old == new {
                Step::Unchanged
            } else {
                Step::ReplaceText(new.clone())
            }
        }
        (VNode::Lazy(old), VNode::Lazy(new)) => {
            // A node produced by the handler-rewriting functor carries its
            // pre-wrap producer; comparing those recognizes the same
            // producer across repeated wraps.
            let same_producer = match (&old.original, &new.original) {
                (Some(old_original), Some(new_original)) => {
                    Rc::ptr_eq(old_original, new_original)
                }
                (Some(_), None) => false,
                (None, _) => Rc::ptr_eq(&old.render, &new.render),
            };
            if same_producer && old.args == new.args {
                Step::LazyReuse(old.cached)
            } else {
                Step::LazyForce(new.render.clone(), new.args.clone())
            }
        }
        (
            VNode::Element {
                tag: old_tag,
                attrs: old_attrs,
                children: old_children,
            },
            VNode::Element {
                tag: new_tag,
                attrs: new_attrs,
                children: new_children,
            },
        ) => {
            if old_tag != new_tag {
                // No attempt to preserve shared substructure under a
                // different tag.
                Step::Replace
            } else {
                Step::Element {
                    attr_update: diff_attrs(old_attrs, new_attrs),
                    old_children: old_children.clone(),
                    new_children: new_children.clone(),
                }
            }
        }
        _ => unreachable!("same_kind checked above"),
    }
}

fn diff_children(
    tree: &mut VTree,
    old: &[NodeId],
    new: &[NodeId],
    patches: &mut Vec<Patch>,
    index: usize,
) -> Result<(), TreeError> {
    // Only tail growth/shrink is handled; the extra vnodes are attached
    // freshly rendered, never diffed against anything.
    if new.len() > old.len() {
        patches.push(Patch::AppendTail {
            index,
            nodes: new[old.len()..].to_vec(),
        });
    } else if new.len() < old.len() {
        patches.push(Patch::RemoveTail {
            index,
            count: old.len() - new.len(),
        });
    }

    for (i, (old_child, new_child)) in old.iter().zip(new).enumerate() {
        diff_node(tree, *old_child, *new_child, patches, i)?;
    }
    Ok(())
}

/// Compute the add/remove sets between two attribute lists.
///
/// Returns `None` when the lists are the same slice or when nothing
/// changed. The remove set preserves the old list's order.
pub fn diff_attrs(a: &[Attribute], b: &[Attribute]) -> Option<AttrDiff> {
    if std::ptr::eq(a, b) {
        return None;
    }

    let mut old_index: HashMap<(AttrKind, &str), usize> = HashMap::with_capacity(a.len());
    for (i, attr) in a.iter().enumerate() {
        old_index.insert((attr.kind(), attr.key()), i);
    }

    let mut matched = vec![false; a.len()];
    let mut add = Vec::new();
    for attr in b {
        match old_index.get(&(attr.kind(), attr.key())) {
            Some(&i) if !matched[i] => {
                matched[i] = true;
                if a[i].same_value(attr) {
                    continue;
                }
                add.push(attr.clone());
            }
            _ => add.push(attr.clone()),
        }
    }

    let remove: Vec<Attribute> = a
        .iter()
        .zip(&matched)
        .filter(|(_, seen)| !**seen)
        .map(|(attr, _)| attr.clone())
        .collect();

    if add.is_empty() && remove.is_empty() {
        None
    } else {
        Some(AttrDiff { add, remove })
    }
}
