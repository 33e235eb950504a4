//! The handler-rewriting functor: rebuilds a vnode tree so every event
//! attribute's chain gets one more stage appended. This is what lets a
//! component be embedded in a parent that speaks a different message type.

use std::rc::Rc;

use crate::error::TreeError;
use crate::vnode::{
    Attribute, EventDescriptor, Handler, LazyNode, NodeId, RenderFn, VNode, VTree, Value,
};

/// Return a new tree in which every event handler chain ends with `f`.
///
/// Text nodes are returned as-is (handlers live only on elements and lazy
/// subtrees). Unforced lazy nodes stay lazy: the wrap composes with the
/// producer instead of forcing it, and the pre-wrap producer is kept so
/// the diff engine still recognizes "same producer" across repeated
/// wraps. Already-forced lazy nodes get their cache mapped but lose that
/// pre-wrap trail, which can defeat memoization on a later diff against a
/// freshly wrapped node from the same producer.
pub fn map(tree: &mut VTree, node: NodeId, f: Handler) -> Result<NodeId, TreeError> {
    enum Plan {
        Element {
            tag: String,
            attrs: Vec<Attribute>,
            children: Vec<NodeId>,
        },
        ForcedLazy {
            args: Vec<Value>,
            render: RenderFn,
            cached: NodeId,
        },
        DeferredLazy {
            args: Vec<Value>,
            render: RenderFn,
        },
    }

    let plan = match tree.get(node)? {
        VNode::Text { .. } => return Ok(node),
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
            Some(cached) => Plan::ForcedLazy {
                args: lazy.args.clone(),
                render: lazy.render.clone(),
                cached,
            },
            None => Plan::DeferredLazy {
                args: lazy.args.clone(),
                render: lazy.render.clone(),
            },
        },
    };

    match plan {
        Plan::Element {
            tag,
            attrs,
            children,
        } => {
            let mapped_children = children
                .into_iter()
                .map(|child| map(tree, child, f.clone()))
                .collect::<Result<Vec<_>, _>>()?;
            let mapped_attrs = attrs
                .into_iter()
                .map(|attr| map_attr(attr, &f))
                .collect::<Vec<_>>();
            Ok(tree.insert(VNode::Element {
                tag,
                attrs: mapped_attrs,
                children: mapped_children,
            }))
        }
        Plan::ForcedLazy {
            args,
            render,
            cached,
        } => {
            let mapped = map(tree, cached, f)?;
            Ok(tree.insert(VNode::Lazy(LazyNode {
                args,
                render,
                cached: Some(mapped),
                original: None,
            })))
        }
        Plan::DeferredLazy { args, render } => {
            let producer = render.clone();
            let stage = f;
            let wrapped: RenderFn = Rc::new(move |args, tree| {
                let rendered = producer(args, tree)?;
                map(tree, rendered, stage.clone())
            });
            Ok(tree.insert(VNode::Lazy(LazyNode {
                args,
                render: wrapped,
                cached: None,
                original: Some(render),
            })))
        }
    }
}

fn map_attr(attr: Attribute, f: &Handler) -> Attribute {
    match attr {
        Attribute::Style { .. } | Attribute::Plain { .. } => attr,
        Attribute::Event(descriptor) => {
            let mut chain = descriptor.chain.clone();
            chain.push(f.clone());
            Attribute::Event(Rc::new(EventDescriptor {
                key: descriptor.key.clone(),
                value: descriptor.value.clone(),
                chain,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn stage(tag: &'static str) -> Handler {
        Rc::new(move |value| Value::from(format!("{tag}({value})")))
    }

    #[test]
    fn text_nodes_pass_through_unchanged() {
        let mut tree = VTree::new();
        let id = tree.text("hello");
        let mapped = map(&mut tree, id, stage("f")).unwrap();
        assert_eq!(mapped, id);
    }

    #[test]
    fn element_events_gain_a_chain_stage() {
        let mut tree = VTree::new();
        let id = tree.element(
            "button",
            vec![
                Attribute::plain("id", "go"),
                Attribute::on("click", Value::from(1)),
            ],
            vec![],
        );
        let mapped = map(&mut tree, id, stage("f")).unwrap();
        assert_ne!(mapped, id, "elements are rebuilt, not mutated");
        match tree.get(mapped).unwrap() {
            VNode::Element { attrs, .. } => {
                let Attribute::Event(descriptor) = &attrs[1] else {
                    panic!("expected event attribute");
                };
                assert_eq!(descriptor.chain.len(), 1);
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn wrapping_preserves_laziness() {
        let calls = Rc::new(Cell::new(0usize));
        let counter = calls.clone();
        let mut tree = VTree::new();
        let render: RenderFn = Rc::new(move |_args, tree| {
            counter.set(counter.get() + 1);
            Ok(tree.text("rendered"))
        });
        let id = tree.lazy(vec![Value::from(1)], render.clone());
        let mapped = map(&mut tree, id, stage("f")).unwrap();
        assert_eq!(calls.get(), 0, "wrapping must not force evaluation");

        match tree.get(mapped).unwrap() {
            VNode::Lazy(lazy) => {
                let original = lazy.original.as_ref().expect("pre-wrap producer kept");
                assert!(Rc::ptr_eq(original, &render));
                assert!(lazy.cached.is_none());
            }
            other => panic!("expected lazy, got {other:?}"),
        }
    }

    #[test]
    fn forced_lazy_maps_its_cache_and_drops_the_trail() {
        let mut tree = VTree::new();
        let render: RenderFn = Rc::new(|_args, tree| Ok(tree.text("rendered")));
        let id = tree.lazy(vec![], render);
        let cached = tree.text("already forced");
        match tree.get_mut(id).unwrap() {
            VNode::Lazy(lazy) => lazy.cached = Some(cached),
            _ => unreachable!(),
        }

        let mapped = map(&mut tree, id, stage("f")).unwrap();
        match tree.get(mapped).unwrap() {
            VNode::Lazy(lazy) => {
                assert_eq!(lazy.cached, Some(cached), "text cache maps to itself");
                assert!(lazy.original.is_none());
            }
            other => panic!("expected lazy, got {other:?}"),
        }
    }
}
