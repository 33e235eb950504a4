//! The host tree backend interface.
//!
//! The runtime never touches a concrete tree directly; everything flows
//! through this trait so the same diff/apply/dispatch machinery drives a
//! real windowing host or the in-memory reference tree used in tests.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::vnode::{EventDescriptor, Value};

/// The closed set of delegated event kinds. One listener per kind is
/// installed per root container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Click,
    Input,
    Change,
}

impl EventKind {
    /// Every delegated kind, in installation order.
    pub const ALL: [EventKind; 3] = [EventKind::Click, EventKind::Input, EventKind::Change];

    pub fn name(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Input => "input",
            EventKind::Change => "change",
        }
    }

    /// Parse an event attribute key into a delegated kind.
    pub fn from_name(name: &str) -> Result<Self, TreeError> {
        match name {
            "click" => Ok(EventKind::Click),
            "input" => Ok(EventKind::Input),
            "change" => Ok(EventKind::Change),
            other => Err(TreeError::UnknownVariant {
                found: other.to_string(),
                expected: "click, input, change",
            }),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tree surgery and inspection primitives the runtime requires of a host.
///
/// Handles are copyable and remain valid until the node is removed from
/// the tree; operations on stale handles, out-of-range indices, or the
/// wrong node kind report [`TreeError::MalformedTree`].
pub trait HostBackend {
    /// Copyable handle to a concrete node.
    type Node: Copy + Eq + fmt::Debug;

    fn create_text(&mut self, value: &str) -> Self::Node;
    fn create_element(&mut self, tag: &str) -> Self::Node;

    /// Replace the character data of a text node.
    fn set_text(&mut self, node: Self::Node, value: &str) -> Result<(), TreeError>;

    fn set_attribute(&mut self, node: Self::Node, key: &str, value: &str)
        -> Result<(), TreeError>;
    fn remove_attribute(&mut self, node: Self::Node, key: &str) -> Result<(), TreeError>;

    fn set_style(&mut self, node: Self::Node, key: &str, value: &str) -> Result<(), TreeError>;
    fn clear_style(&mut self, node: Self::Node, key: &str) -> Result<(), TreeError>;

    /// Store an event descriptor on a node for later dispatch resolution.
    fn set_event(
        &mut self,
        node: Self::Node,
        kind: EventKind,
        descriptor: Rc<EventDescriptor>,
    ) -> Result<(), TreeError>;
    fn clear_event(&mut self, node: Self::Node, kind: EventKind) -> Result<(), TreeError>;
    /// The descriptor stored on `node` for `kind`, if any.
    fn event_descriptor(&self, node: Self::Node, kind: EventKind) -> Option<Rc<EventDescriptor>>;

    fn append_child(&mut self, parent: Self::Node, child: Self::Node) -> Result<(), TreeError>;
    /// Remove the trailing child; silently does nothing when the element is
    /// already empty.
    fn remove_last_child(&mut self, parent: Self::Node) -> Result<(), TreeError>;
    fn replace_child(
        &mut self,
        parent: Self::Node,
        index: usize,
        new_child: Self::Node,
    ) -> Result<(), TreeError>;

    fn child_at(&self, parent: Self::Node, index: usize) -> Result<Self::Node, TreeError>;
    fn child_count(&self, parent: Self::Node) -> Result<usize, TreeError>;
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Register interest in a delegated event kind on a container. Hosts
    /// that own a real event loop forward matching input events to
    /// [`RenderSession::dispatch`](crate::session::RenderSession::dispatch).
    /// Must be idempotent per `(container, kind)`.
    fn subscribe_delegated(
        &mut self,
        container: Self::Node,
        kind: EventKind,
    ) -> Result<(), TreeError>;

    /// Read the current input value of a control, used when an event
    /// descriptor carries no explicit value: checkbox-like controls yield
    /// their boolean checked state, everything else its current string
    /// value.
    fn target_value(&self, node: Self::Node) -> Value;
}
