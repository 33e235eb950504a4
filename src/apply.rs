//! The patch applier: replays a patch program against a live concrete
//! tree through a host backend, navigating with an explicit cursor and
//! stack instead of absolute paths.

use std::rc::Rc;

use tracing::trace;

use crate::backend::{EventKind, HostBackend};
use crate::error::TreeError;
use crate::patch::Patch;
use crate::vnode::{Attribute, NodeId, RenderFn, VNode, VTree, Value};

/// The applier's position in the live tree. Saved positions are owned by
/// one `apply` call and never escape it.
struct Cursor<N> {
    current: N,
    stack: Vec<N>,
}

impl<N: Copy> Cursor<N> {
    fn new(root: N) -> Self {
        Self {
            current: root,
            stack: Vec::new(),
        }
    }

    fn current(&self) -> N {
        self.current
    }

    fn descend(&mut self, child: N) {
        self.stack.push(self.current);
        self.current = child;
    }

    fn ascend(&mut self, levels: usize) -> Result<(), TreeError> {
        for _ in 0..levels {
            self.current = self
                .stack
                .pop()
                .ok_or_else(|| TreeError::malformed("ascend past the patch cursor's stack"))?;
        }
        Ok(())
    }
}

/// Replay `patches` in emission order against the children of `container`.
///
/// Child-addressed operations act on the cursor's child at the recorded
/// index; `AppendTail`/`RemoveTail` act on the cursor itself and ignore
/// their recorded index (see [`Patch`]). Vnode trees are never mutated
/// here, only the live concrete tree.
pub fn apply<B: HostBackend>(
    tree: &mut VTree,
    backend: &mut B,
    container: B::Node,
    patches: &[Patch],
) -> Result<(), TreeError> {
    let mut cursor = Cursor::new(container);

    for patch in patches {
        match patch {
            Patch::Descend { index } => {
                let child = backend.child_at(cursor.current(), *index)?;
                cursor.descend(child);
            }
            Patch::Ascend { levels } => cursor.ascend(*levels)?,
            Patch::UpdateAttrs { index, update } => {
                let target = backend.child_at(cursor.current(), *index)?;
                for attr in &update.add {
                    add_attribute(backend, target, attr)?;
                }
                for attr in &update.remove {
                    remove_attribute(backend, target, attr)?;
                }
            }
            Patch::ReplaceText { index, value } => {
                let target = backend.child_at(cursor.current(), *index)?;
                backend.set_text(target, value)?;
            }
            Patch::ReplaceNode { index, node } => {
                // The displaced subtree is dropped; there is no unmount
                // hook.
                let replacement = materialize(tree, backend, *node)?;
                backend.replace_child(cursor.current(), *index, replacement)?;
            }
            Patch::AppendTail { nodes, .. } => {
                for node in nodes {
                    let child = materialize(tree, backend, *node)?;
                    backend.append_child(cursor.current(), child)?;
                }
            }
            Patch::RemoveTail { count, .. } => {
                for _ in 0..*count {
                    backend.remove_last_child(cursor.current())?;
                }
            }
        }
    }

    trace!(patches = patches.len(), "applied patch program");
    Ok(())
}

/// Build a concrete subtree for the vnode at `id`.
///
/// Unforced lazy nodes are rendered on the spot; their cache slot is left
/// untouched (caching is a diff-time decision, not an apply-time one).
pub fn materialize<B: HostBackend>(
    tree: &mut VTree,
    backend: &mut B,
    id: NodeId,
) -> Result<B::Node, TreeError> {
    enum Plan {
        Text(String),
        Element {
            tag: String,
            attrs: Vec<Attribute>,
            children: Vec<NodeId>,
        },
        Rendered(NodeId),
        Force(RenderFn, Vec<Value>),
    }

    let plan = match tree.get(id)? {
        VNode::Text { value } => Plan::Text(value.clone()),
        VNode::Element {
            tag,
            attrs,
            children,
        } => Plan::Element {
            tag: tag.clone(),
            attrs: attrs.clone(),
            children: children.clone(),
        },
        VNode::Lazy(lazy) => match lazy.cached {
            Some(cached) => Plan::Rendered(cached),
            None => Plan::Force(lazy.render.clone(), lazy.args.clone()),
        },
    };

    match plan {
        Plan::Text(value) => Ok(backend.create_text(&value)),
        Plan::Element {
            tag,
            attrs,
            children,
        } => {
            let element = backend.create_element(&tag);
            for attr in &attrs {
                add_attribute(backend, element, attr)?;
            }
            for child in children {
                let concrete = materialize(tree, backend, child)?;
                backend.append_child(element, concrete)?;
            }
            Ok(element)
        }
        Plan::Rendered(cached) => materialize(tree, backend, cached),
        Plan::Force(render, args) => {
            let rendered = render(&args, tree)?;
            materialize(tree, backend, rendered)
        }
    }
}

pub(crate) fn add_attribute<B: HostBackend>(
    backend: &mut B,
    node: B::Node,
    attr: &Attribute,
) -> Result<(), TreeError> {
    match attr {
        Attribute::Plain { key, value } => backend.set_attribute(node, key, value),
        Attribute::Style { key, value } => backend.set_style(node, key, value),
        Attribute::Event(descriptor) => {
            let kind = EventKind::from_name(&descriptor.key)?;
            backend.set_event(node, kind, Rc::clone(descriptor))
        }
    }
}

pub(crate) fn remove_attribute<B: HostBackend>(
    backend: &mut B,
    node: B::Node,
    attr: &Attribute,
) -> Result<(), TreeError> {
    match attr {
        Attribute::Plain { key, .. } => backend.remove_attribute(node, key),
        Attribute::Style { key, .. } => backend.clear_style(node, key),
        Attribute::Event(descriptor) => {
            let kind = EventKind::from_name(&descriptor.key)?;
            backend.clear_event(node, kind)
        }
    }
}
