//! The declarative node model: an arena of vnodes addressed by opaque
//! handles, plus the attribute types that decorate elements.
//!
//! Trees are data, not behavior. An application builds a fresh tree each
//! render cycle by allocating nodes into a [`VTree`]; reusing the same
//! [`NodeId`] in consecutive cycles marks that subtree as definitely
//! unchanged, which the diff engine short-circuits on before any
//! structural inspection.

use std::fmt;
use std::rc::Rc;

use slotmap::SlotMap;

use crate::error::TreeError;

slotmap::new_key_type! {
    /// Opaque handle to a vnode in a [`VTree`].
    pub struct NodeId;
}

/// Opaque value used for lazy comparison keys and event payloads.
pub type Value = serde_json::Value;

/// One stage of an event handler chain; each stage transforms the value
/// produced by the previous one.
pub type Handler = Rc<dyn Fn(Value) -> Value>;

/// Producer of a deferred subtree. Identity (`Rc::ptr_eq`) is what the
/// diff engine uses to decide whether two lazy nodes share a producer.
pub type RenderFn = Rc<dyn Fn(&[Value], &mut VTree) -> Result<NodeId, TreeError>>;

/// An event attribute's payload: which kind of event it answers to, an
/// optional explicit value, and the handler chain applied to the resolved
/// value before it reaches the update callback.
///
/// Descriptors compare by identity. A freshly constructed descriptor is
/// always treated as changed by the differ, even if logically identical;
/// callers wanting stable handler identity across renders must clone and
/// reuse the same `Rc<EventDescriptor>`.
pub struct EventDescriptor {
    pub key: String,
    pub value: Option<Value>,
    pub chain: Vec<Handler>,
}

impl fmt::Debug for EventDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDescriptor")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("chain", &format_args!("[{} handler(s)]", self.chain.len()))
            .finish()
    }
}

/// Which family an attribute belongs to. `(AttrKind, key)` is the unit of
/// identity for attribute set comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKind {
    Style,
    Plain,
    Event,
}

/// A single attribute on an element.
#[derive(Clone)]
pub enum Attribute {
    /// A presentation property.
    Style { key: String, value: String },
    /// A generic property/attribute.
    Plain { key: String, value: String },
    /// An event subscription with its handler chain.
    Event(Rc<EventDescriptor>),
}

impl Attribute {
    /// A presentation property, e.g. `style("color", "red")`.
    pub fn style(key: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute::Style {
            key: key.into(),
            value: value.into(),
        }
    }

    /// A generic property, e.g. `plain("id", "root")`.
    pub fn plain(key: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute::Plain {
            key: key.into(),
            value: value.into(),
        }
    }

    /// An event attribute carrying an explicit value: when the event fires,
    /// `value` is fed to the handler chain instead of reading the control's
    /// state.
    pub fn on(key: impl Into<String>, value: Value) -> Self {
        Attribute::Event(Rc::new(EventDescriptor {
            key: key.into(),
            value: Some(value),
            chain: Vec::new(),
        }))
    }

    /// An event attribute whose handler chain starts with `f`; the value is
    /// read from the originating control at dispatch time.
    pub fn on_fn(key: impl Into<String>, f: impl Fn(Value) -> Value + 'static) -> Self {
        Attribute::Event(Rc::new(EventDescriptor {
            key: key.into(),
            value: None,
            chain: vec![Rc::new(f) as Handler],
        }))
    }

    pub fn kind(&self) -> AttrKind {
        match self {
            Attribute::Style { .. } => AttrKind::Style,
            Attribute::Plain { .. } => AttrKind::Plain,
            Attribute::Event(_) => AttrKind::Event,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Attribute::Style { key, .. } | Attribute::Plain { key, .. } => key,
            Attribute::Event(descriptor) => &descriptor.key,
        }
    }

    /// Value equality as the differ sees it: strings by value, event
    /// descriptors by identity.
    pub(crate) fn same_value(&self, other: &Attribute) -> bool {
        match (self, other) {
            (Attribute::Style { value: a, .. }, Attribute::Style { value: b, .. }) => a == b,
            (Attribute::Plain { value: a, .. }, Attribute::Plain { value: b, .. }) => a == b,
            (Attribute::Event(a), Attribute::Event(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Style { key, value } => write!(f, "Style({key}: {value})"),
            Attribute::Plain { key, value } => write!(f, "Plain({key}={value})"),
            Attribute::Event(descriptor) => write!(f, "Event({})", descriptor.key),
        }
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key() && self.same_value(other)
    }
}

/// A deferred subtree keyed by comparison arguments.
pub struct LazyNode {
    /// Comparison keys; two lazy nodes from the same producer with equal
    /// args are reused without rendering.
    pub args: Vec<Value>,
    pub render: RenderFn,
    /// Filled once the subtree has been forced; copied forward by the diff
    /// engine when the producer and args match.
    pub cached: Option<NodeId>,
    /// The producer predating any handler-rewriting wrap, so repeated wraps
    /// of the same producer still compare equal.
    pub original: Option<RenderFn>,
}

impl fmt::Debug for LazyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyNode")
            .field("args", &self.args)
            .field("cached", &self.cached)
            .field("wrapped", &self.original.is_some())
            .finish()
    }
}

/// One node of a declarative tree.
#[derive(Debug)]
pub enum VNode {
    Element {
        tag: String,
        attrs: Vec<Attribute>,
        children: Vec<NodeId>,
    },
    Text {
        value: String,
    },
    Lazy(LazyNode),
}

impl VNode {
    pub(crate) fn same_kind(&self, other: &VNode) -> bool {
        matches!(
            (self, other),
            (VNode::Element { .. }, VNode::Element { .. })
                | (VNode::Text { .. }, VNode::Text { .. })
                | (VNode::Lazy(_), VNode::Lazy(_))
        )
    }
}

/// Arena holding every vnode of an application's render cycles.
///
/// The arena grows monotonically; superseded cycles are reclaimed by
/// [`VTree::clear`] or by dropping the tree.
#[derive(Default)]
pub struct VTree {
    nodes: SlotMap<NodeId, VNode>,
}

impl VTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live vnodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node, invalidating all outstanding handles.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Allocate an element node. Duplicate `(kind, key)` attribute pairs
    /// collapse with last-write-wins.
    pub fn element(
        &mut self,
        tag: impl Into<String>,
        attrs: Vec<Attribute>,
        children: Vec<NodeId>,
    ) -> NodeId {
        self.nodes.insert(VNode::Element {
            tag: tag.into(),
            attrs: dedupe_attrs(attrs),
            children,
        })
    }

    /// Allocate a text node.
    pub fn text(&mut self, value: impl Into<String>) -> NodeId {
        self.nodes.insert(VNode::Text {
            value: value.into(),
        })
    }

    /// Allocate a deferred subtree keyed by `args`.
    pub fn lazy(&mut self, args: Vec<Value>, render: RenderFn) -> NodeId {
        self.nodes.insert(VNode::Lazy(LazyNode {
            args,
            render,
            cached: None,
            original: None,
        }))
    }

    pub(crate) fn insert(&mut self, node: VNode) -> NodeId {
        self.nodes.insert(node)
    }

    /// Resolve a handle, classifying a dangling one as a malformed tree.
    pub fn get(&self, id: NodeId) -> Result<&VNode, TreeError> {
        self.nodes
            .get(id)
            .ok_or_else(|| TreeError::malformed(format!("dangling vnode handle {id:?}")))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut VNode, TreeError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::malformed(format!("dangling vnode handle {id:?}")))
    }
}

fn dedupe_attrs(attrs: Vec<Attribute>) -> Vec<Attribute> {
    let mut out: Vec<Attribute> = Vec::with_capacity(attrs.len());
    for attr in attrs {
        match out
            .iter_mut()
            .find(|existing| existing.kind() == attr.kind() && existing.key() == attr.key())
        {
            Some(existing) => *existing = attr,
            None => out.push(attr),
        }
    }
    out
}
