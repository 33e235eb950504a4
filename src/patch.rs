//! The patch protocol: a flat, ordered edit program emitted by the diff
//! engine and replayed by the applier.
//!
//! Navigation is encoded implicitly and relative to a cursor rather than
//! through absolute paths, which keeps programs small and independent of
//! tree depth. `Descend`/`Ascend`/`UpdateAttrs`/`ReplaceText`/`ReplaceNode`
//! address *a child of the cursor*; `AppendTail`/`RemoveTail` address *the
//! cursor itself*. The asymmetry is intentional: by emission order, any
//! `Descend` into the element owning a tail operation has already executed
//! earlier in the same program.

use crate::vnode::{Attribute, NodeId};

/// Attribute sets to add and remove on one element. Either list may be
/// empty, but never both (the differ returns `None` instead).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttrDiff {
    pub add: Vec<Attribute>,
    pub remove: Vec<Attribute>,
}

impl AttrDiff {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// One operation of a patch program.
///
/// `index` fields on `AppendTail`/`RemoveTail` record the owning element's
/// sibling position at emission time but are *not consulted* by the
/// applier; the cursor is already positioned on that element when they
/// run.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Replace the character data of the cursor's child at `index`.
    ReplaceText { index: usize, value: String },
    /// Materialize `node` and swap it for the cursor's child at `index`.
    /// The displaced subtree is discarded with no teardown hook.
    ReplaceNode { index: usize, node: NodeId },
    /// Apply `update.add` then `update.remove` to the cursor's child at
    /// `index`.
    UpdateAttrs { index: usize, update: AttrDiff },
    /// Materialize and append each node, in order, to the cursor itself.
    AppendTail { index: usize, nodes: Vec<NodeId> },
    /// Remove the last `count` children of the cursor itself.
    RemoveTail { index: usize, count: usize },
    /// Move the cursor down into its child at `index`.
    Descend { index: usize },
    /// Move the cursor up `levels` saved positions.
    Ascend { levels: usize },
}
