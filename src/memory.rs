//! In-memory reference implementation of the host tree backend.
//!
//! This is what the test suite renders into, and what a headless host can
//! use directly. Attributes and styles keep deterministic ordering so
//! structural snapshots compare reliably.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use serde_json::json;
use slotmap::SlotMap;

use crate::backend::{EventKind, HostBackend};
use crate::error::TreeError;
use crate::vnode::{EventDescriptor, Value};

slotmap::new_key_type! {
    /// Handle to a concrete node in a [`MemoryHost`].
    pub struct HostId;
}

enum ConcreteNode {
    Text {
        value: String,
        parent: Option<HostId>,
    },
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        styles: BTreeMap<String, String>,
        events: HashMap<EventKind, Rc<EventDescriptor>>,
        children: Vec<HostId>,
        parent: Option<HostId>,
    },
}

/// A concrete tree living entirely in memory.
#[derive(Default)]
pub struct MemoryHost {
    nodes: SlotMap<HostId, ConcreteNode>,
    subscriptions: HashSet<(HostId, EventKind)>,
    subscribe_calls: usize,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, id: HostId) -> Result<&ConcreteNode, TreeError> {
        self.nodes
            .get(id)
            .ok_or_else(|| TreeError::malformed(format!("stale host handle {id:?}")))
    }

    fn node_mut(&mut self, id: HostId) -> Result<&mut ConcreteNode, TreeError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::malformed(format!("stale host handle {id:?}")))
    }

    fn element_mut(
        &mut self,
        id: HostId,
        op: &str,
    ) -> Result<&mut ConcreteNode, TreeError> {
        match self.node_mut(id)? {
            ConcreteNode::Text { .. } => {
                Err(TreeError::malformed(format!("{op} on a text node")))
            }
            node => Ok(node),
        }
    }

    fn detach(&mut self, child: HostId) -> Result<(), TreeError> {
        let old_parent = match self.node(child)? {
            ConcreteNode::Text { parent, .. } | ConcreteNode::Element { parent, .. } => *parent,
        };
        if let Some(parent) = old_parent {
            if let ConcreteNode::Element { children, .. } = self.node_mut(parent)? {
                children.retain(|existing| *existing != child);
            }
        }
        self.set_parent(child, None)?;
        Ok(())
    }

    fn set_parent(&mut self, child: HostId, new_parent: Option<HostId>) -> Result<(), TreeError> {
        match self.node_mut(child)? {
            ConcreteNode::Text { parent, .. } | ConcreteNode::Element { parent, .. } => {
                *parent = new_parent;
            }
        }
        Ok(())
    }

    // === Inspection helpers for tests and headless hosts ===

    pub fn tag_of(&self, id: HostId) -> Result<&str, TreeError> {
        match self.node(id)? {
            ConcreteNode::Element { tag, .. } => Ok(tag),
            ConcreteNode::Text { .. } => Err(TreeError::malformed("tag of a text node")),
        }
    }

    pub fn text_of(&self, id: HostId) -> Result<&str, TreeError> {
        match self.node(id)? {
            ConcreteNode::Text { value, .. } => Ok(value),
            ConcreteNode::Element { .. } => Err(TreeError::malformed("text of an element")),
        }
    }

    pub fn attribute(&self, id: HostId, key: &str) -> Option<&str> {
        match self.nodes.get(id)? {
            ConcreteNode::Element { attributes, .. } => attributes.get(key).map(String::as_str),
            ConcreteNode::Text { .. } => None,
        }
    }

    pub fn style(&self, id: HostId, key: &str) -> Option<&str> {
        match self.nodes.get(id)? {
            ConcreteNode::Element { styles, .. } => styles.get(key).map(String::as_str),
            ConcreteNode::Text { .. } => None,
        }
    }

    pub fn children(&self, id: HostId) -> Result<Vec<HostId>, TreeError> {
        match self.node(id)? {
            ConcreteNode::Element { children, .. } => Ok(children.clone()),
            ConcreteNode::Text { .. } => Err(TreeError::malformed("children of a text node")),
        }
    }

    /// Concatenated character data of a subtree, in document order.
    pub fn collect_text(&self, id: HostId) -> Result<String, TreeError> {
        match self.node(id)? {
            ConcreteNode::Text { value, .. } => Ok(value.clone()),
            ConcreteNode::Element { children, .. } => {
                let children = children.clone();
                let mut out = String::new();
                for child in children {
                    out.push_str(&self.collect_text(child)?);
                }
                Ok(out)
            }
        }
    }

    /// JSON snapshot of a subtree for structural equality assertions.
    /// Event descriptors appear as their kind names only.
    pub fn snapshot(&self, id: HostId) -> Result<Value, TreeError> {
        match self.node(id)? {
            ConcreteNode::Text { value, .. } => Ok(json!({ "text": value })),
            ConcreteNode::Element {
                tag,
                attributes,
                styles,
                events,
                children,
                ..
            } => {
                let mut kinds: Vec<&str> = events.keys().map(|kind| kind.name()).collect();
                kinds.sort_unstable();
                let children = children
                    .iter()
                    .map(|child| self.snapshot(*child))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(json!({
                    "tag": tag,
                    "attrs": attributes,
                    "styles": styles,
                    "events": kinds,
                    "children": children,
                }))
            }
        }
    }

    /// Delegated kinds currently subscribed on `container`.
    pub fn subscriptions(&self, container: HostId) -> Vec<EventKind> {
        let mut kinds: Vec<EventKind> = self
            .subscriptions
            .iter()
            .filter(|(node, _)| *node == container)
            .map(|(_, kind)| *kind)
            .collect();
        kinds.sort_by_key(|kind| kind.name());
        kinds
    }

    /// Total `subscribe_delegated` calls, for asserting listener setup runs
    /// once per container.
    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls
    }
}

impl HostBackend for MemoryHost {
    type Node = HostId;

    fn create_text(&mut self, value: &str) -> HostId {
        self.nodes.insert(ConcreteNode::Text {
            value: value.to_string(),
            parent: None,
        })
    }

    fn create_element(&mut self, tag: &str) -> HostId {
        self.nodes.insert(ConcreteNode::Element {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            events: HashMap::new(),
            children: Vec::new(),
            parent: None,
        })
    }

    fn set_text(&mut self, node: HostId, value: &str) -> Result<(), TreeError> {
        match self.node_mut(node)? {
            ConcreteNode::Text { value: slot, .. } => {
                *slot = value.to_string();
                Ok(())
            }
            ConcreteNode::Element { .. } => {
                Err(TreeError::malformed("set_text on an element"))
            }
        }
    }

    fn set_attribute(&mut self, node: HostId, key: &str, value: &str) -> Result<(), TreeError> {
        match self.element_mut(node, "set_attribute")? {
            ConcreteNode::Element { attributes, .. } => {
                attributes.insert(key.to_string(), value.to_string());
                Ok(())
            }
            ConcreteNode::Text { .. } => unreachable!(),
        }
    }

    fn remove_attribute(&mut self, node: HostId, key: &str) -> Result<(), TreeError> {
        match self.element_mut(node, "remove_attribute")? {
            ConcreteNode::Element { attributes, .. } => {
                attributes.remove(key);
                Ok(())
            }
            ConcreteNode::Text { .. } => unreachable!(),
        }
    }

    fn set_style(&mut self, node: HostId, key: &str, value: &str) -> Result<(), TreeError> {
        match self.element_mut(node, "set_style")? {
            ConcreteNode::Element { styles, .. } => {
                styles.insert(key.to_string(), value.to_string());
                Ok(())
            }
            ConcreteNode::Text { .. } => unreachable!(),
        }
    }

    fn clear_style(&mut self, node: HostId, key: &str) -> Result<(), TreeError> {
        match self.element_mut(node, "clear_style")? {
            ConcreteNode::Element { styles, .. } => {
                styles.remove(key);
                Ok(())
            }
            ConcreteNode::Text { .. } => unreachable!(),
        }
    }

    fn set_event(
        &mut self,
        node: HostId,
        kind: EventKind,
        descriptor: Rc<EventDescriptor>,
    ) -> Result<(), TreeError> {
        match self.element_mut(node, "set_event")? {
            ConcreteNode::Element { events, .. } => {
                events.insert(kind, descriptor);
                Ok(())
            }
            ConcreteNode::Text { .. } => unreachable!(),
        }
    }

    fn clear_event(&mut self, node: HostId, kind: EventKind) -> Result<(), TreeError> {
        match self.element_mut(node, "clear_event")? {
            ConcreteNode::Element { events, .. } => {
                events.remove(&kind);
                Ok(())
            }
            ConcreteNode::Text { .. } => unreachable!(),
        }
    }

    fn event_descriptor(&self, node: HostId, kind: EventKind) -> Option<Rc<EventDescriptor>> {
        match self.nodes.get(node)? {
            ConcreteNode::Element { events, .. } => events.get(&kind).cloned(),
            ConcreteNode::Text { .. } => None,
        }
    }

    fn append_child(&mut self, parent: HostId, child: HostId) -> Result<(), TreeError> {
        self.detach(child)?;
        match self.element_mut(parent, "append_child")? {
            ConcreteNode::Element { children, .. } => children.push(child),
            ConcreteNode::Text { .. } => unreachable!(),
        }
        self.set_parent(child, Some(parent))
    }

    fn remove_last_child(&mut self, parent: HostId) -> Result<(), TreeError> {
        let popped = match self.element_mut(parent, "remove_last_child")? {
            ConcreteNode::Element { children, .. } => children.pop(),
            ConcreteNode::Text { .. } => unreachable!(),
        };
        // Already empty: silently do nothing.
        if let Some(child) = popped {
            self.set_parent(child, None)?;
        }
        Ok(())
    }

    fn replace_child(
        &mut self,
        parent: HostId,
        index: usize,
        new_child: HostId,
    ) -> Result<(), TreeError> {
        self.detach(new_child)?;
        let displaced = match self.element_mut(parent, "replace_child")? {
            ConcreteNode::Element { children, .. } => {
                let slot = children.get_mut(index).ok_or_else(|| {
                    TreeError::malformed(format!("replace_child index {index} out of range"))
                })?;
                std::mem::replace(slot, new_child)
            }
            ConcreteNode::Text { .. } => unreachable!(),
        };
        self.set_parent(displaced, None)?;
        self.set_parent(new_child, Some(parent))
    }

    fn child_at(&self, parent: HostId, index: usize) -> Result<HostId, TreeError> {
        match self.node(parent)? {
            ConcreteNode::Element { children, .. } => {
                children.get(index).copied().ok_or_else(|| {
                    TreeError::malformed(format!(
                        "child index {index} out of range ({} children)",
                        children.len()
                    ))
                })
            }
            ConcreteNode::Text { .. } => Err(TreeError::malformed("child_at on a text node")),
        }
    }

    fn child_count(&self, parent: HostId) -> Result<usize, TreeError> {
        match self.node(parent)? {
            ConcreteNode::Element { children, .. } => Ok(children.len()),
            ConcreteNode::Text { .. } => Err(TreeError::malformed("child_count on a text node")),
        }
    }

    fn parent(&self, node: HostId) -> Option<HostId> {
        match self.nodes.get(node)? {
            ConcreteNode::Text { parent, .. } | ConcreteNode::Element { parent, .. } => *parent,
        }
    }

    fn subscribe_delegated(
        &mut self,
        container: HostId,
        kind: EventKind,
    ) -> Result<(), TreeError> {
        // The node must exist, but re-subscribing is harmless.
        self.node(container)?;
        self.subscribe_calls += 1;
        self.subscriptions.insert((container, kind));
        Ok(())
    }

    fn target_value(&self, node: HostId) -> Value {
        match self.nodes.get(node) {
            Some(ConcreteNode::Element { attributes, .. }) => {
                if attributes.get("type").map(String::as_str) == Some("checkbox") {
                    Value::from(attributes.get("checked").map(String::as_str) == Some("true"))
                } else {
                    Value::from(
                        attributes
                            .get("value")
                            .cloned()
                            .unwrap_or_default(),
                    )
                }
            }
            _ => Value::Null,
        }
    }
}
