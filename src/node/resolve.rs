//! Node resolution.
//!
//! # Responsibilities
//! - Expand composite (function) nodes into tagged components
//! - Pass fragments through unchanged
//! - Drop primitive leaves
//!
//! # Design Decisions
//! - Purely structural: no I/O, no side effects
//! - Composite expansion is bounded by an explicit depth limit; a
//!   self-referential composite fails with DepthExceeded instead of
//!   looping forever
//! - A composite that resolves to a childless component inherits the
//!   composite's own children (transparent wrapper)

use thiserror::Error;

use super::{Component, Node};

/// Maximum number of nested composite expansions for a single node.
pub const MAX_COMPOSITE_DEPTH: usize = 64;

/// Outcome of resolving one node.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// A tagged component, ready for dispatch.
    Item(Component),
    /// An ordered list to be resolved element-wise by the caller.
    Fragment(Vec<Node>),
    /// Primitive or absent value; dropped.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("composite expansion exceeded {0} levels (self-referential composite?)")]
    DepthExceeded(usize),
}

/// Resolve a node into a component, a fragment, or nothing.
pub fn resolve(node: &Node) -> Result<Resolved, ResolveError> {
    resolve_at(node, 0)
}

fn resolve_at(node: &Node, depth: usize) -> Result<Resolved, ResolveError> {
    if depth > MAX_COMPOSITE_DEPTH {
        return Err(ResolveError::DepthExceeded(MAX_COMPOSITE_DEPTH));
    }
    match node {
        Node::Item(component) => Ok(Resolved::Item(component.clone())),
        Node::Fragment(children) => Ok(Resolved::Fragment(children.clone())),
        Node::Composite {
            func,
            props,
            children,
        } => {
            let produced = func(props, children);
            match resolve_at(&produced, depth + 1)? {
                Resolved::Item(item) if !children.is_empty() && !item.has_children() => {
                    Ok(Resolved::Item(item.with_children(children.clone())))
                }
                other => Ok(other),
            }
        }
        Node::Empty | Node::Value(_) => Ok(Resolved::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{composite_fn, handler, Props};
    use crate::pipeline::HandlerOutcome;
    use serde_json::json;

    fn noop_handler() -> crate::node::HandlerFn {
        handler(|_ctx| async { Ok(HandlerOutcome::Json(json!(null))) })
    }

    #[test]
    fn test_component_passthrough() {
        let node = Node::status(204);
        match resolve(&node).unwrap() {
            Resolved::Item(Component::Status { code }) => assert_eq!(code, 204),
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_fragment_passthrough() {
        let node = Node::fragment(vec![Node::status(200), Node::status(201)]);
        match resolve(&node).unwrap() {
            Resolved::Fragment(children) => assert_eq!(children.len(), 2),
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_primitives_drop() {
        assert!(matches!(resolve(&Node::Empty).unwrap(), Resolved::None));
        assert!(matches!(
            resolve(&Node::Value(json!("hello"))).unwrap(),
            Resolved::None
        ));
        assert!(matches!(
            resolve(&Node::Value(json!(42))).unwrap(),
            Resolved::None
        ));
    }

    #[test]
    fn test_composite_expands_recursively() {
        let inner = composite_fn(|_, _| Node::status(418));
        let outer = composite_fn(move |props, children| {
            Node::composite(inner.clone(), props.clone(), children.to_vec())
        });
        let node = Node::composite(outer, Props::new(), vec![]);
        match resolve(&node).unwrap() {
            Resolved::Item(Component::Status { code }) => assert_eq!(code, 418),
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_composite_children_attach_to_childless_result() {
        let wrapper = composite_fn(|_, _| Node::group("/api", vec![]));
        let child = Node::get("/ping", noop_handler());
        let node = Node::composite(wrapper, Props::new(), vec![child]);
        match resolve(&node).unwrap() {
            Resolved::Item(Component::Group { prefix, children }) => {
                assert_eq!(prefix, "/api");
                assert_eq!(children.len(), 1);
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_composite_declared_children_win() {
        let wrapper = composite_fn(|_, _| {
            Node::group("/api", vec![Node::status(200), Node::status(201)])
        });
        let node = Node::composite(wrapper, Props::new(), vec![Node::status(500)]);
        match resolve(&node).unwrap() {
            Resolved::Item(Component::Group { children, .. }) => {
                // declared children are kept, composite children ignored
                assert_eq!(children.len(), 2);
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_self_referential_composite_hits_depth_limit() {
        fn looper(_: &Props, _: &[Node]) -> Node {
            Node::composite(composite_fn(looper), Props::new(), vec![])
        }
        let node = Node::composite(composite_fn(looper), Props::new(), vec![]);
        assert!(matches!(
            resolve(&node),
            Err(ResolveError::DepthExceeded(MAX_COMPOSITE_DEPTH))
        ));
    }
}
