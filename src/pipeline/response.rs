//! Response-descriptor resolution.
//!
//! # Responsibilities
//! - Walk a Response-tagged node tree into a concrete status/headers/body
//!
//! # Design Decisions
//! - Status and Body are last-write-wins; Headers merge key by key with
//!   later same-named headers overwriting — the asymmetry is deliberate
//! - Err is terminal: it writes the envelope and stops resolution, so
//!   later siblings cannot overwrite an error
//! - Non-descriptor kinds inside the tree are ignored, not errors

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use crate::node::{resolve, Component, Node, Resolved, ResolveError};

/// The final response produced from a descriptor tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rendered {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
    pub is_error: bool,
}

impl Default for Rendered {
    fn default() -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body: Value::Null,
            is_error: false,
        }
    }
}

impl Rendered {
    pub fn ok(body: Value) -> Self {
        Self {
            body,
            ..Self::default()
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Sanitized error envelope: `{ "error": message }`.
    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: json!({ "error": message }),
            is_error: true,
        }
    }
}

/// Resolve a descriptor tree into a `Rendered`.
pub fn resolve_response(tree: &Node) -> Result<Rendered, ResolveError> {
    let mut out = Rendered::default();
    apply(tree, &mut out)?;
    Ok(out)
}

// Returns true once a terminal Err has been applied; callers stop
// walking further siblings.
fn apply(node: &Node, out: &mut Rendered) -> Result<bool, ResolveError> {
    match resolve(node)? {
        Resolved::None => Ok(false),
        Resolved::Fragment(children) => {
            for child in &children {
                if apply(child, out)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Resolved::Item(component) => match component {
            Component::Response { children } => {
                for child in &children {
                    if apply(child, out)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Component::Status { code } => {
                out.status = code;
                Ok(false)
            }
            Component::Body { value } => {
                out.body = value;
                Ok(false)
            }
            Component::Headers { map } => {
                for (name, value) in map {
                    out.headers.insert(name, value);
                }
                Ok(false)
            }
            Component::Err {
                code,
                message,
                details,
            } => {
                out.is_error = true;
                out.status = code;
                out.body = match details {
                    Some(details) => json!({ "error": message, "details": details }),
                    None => json!({ "error": message }),
                };
                Ok(true)
            }
            other => {
                tracing::debug!(kind = other.kind(), "Ignoring non-descriptor node");
                Ok(false)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip() {
        let tree = Node::response(vec![
            Node::status(201),
            Node::body(json!({"x": 1})),
            Node::headers(BTreeMap::from([("a".to_string(), "b".to_string())])),
        ]);
        let out = resolve_response(&tree).unwrap();
        assert_eq!(out.status, 201);
        assert_eq!(out.body, json!({"x": 1}));
        assert_eq!(out.headers.get("a").map(String::as_str), Some("b"));
        assert!(!out.is_error);
    }

    #[test]
    fn test_status_and_body_last_write_wins() {
        let tree = Node::response(vec![
            Node::status(200),
            Node::body(json!("first")),
            Node::status(202),
            Node::body(json!("second")),
        ]);
        let out = resolve_response(&tree).unwrap();
        assert_eq!(out.status, 202);
        assert_eq!(out.body, json!("second"));
    }

    #[test]
    fn test_headers_merge_key_by_key() {
        let tree = Node::response(vec![
            Node::headers(BTreeMap::from([
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
            ])),
            Node::headers(BTreeMap::from([
                ("b".to_string(), "3".to_string()),
                ("c".to_string(), "4".to_string()),
            ])),
        ]);
        let out = resolve_response(&tree).unwrap();
        assert_eq!(out.headers.get("a").map(String::as_str), Some("1"));
        assert_eq!(out.headers.get("b").map(String::as_str), Some("3"));
        assert_eq!(out.headers.get("c").map(String::as_str), Some("4"));
    }

    #[test]
    fn test_err_node_is_terminal_envelope() {
        let tree = Node::response(vec![
            Node::status(200),
            Node::err_with_details(422, "invalid", json!({"field": "name"})),
        ]);
        let out = resolve_response(&tree).unwrap();
        assert!(out.is_error);
        assert_eq!(out.status, 422);
        assert_eq!(
            out.body,
            json!({"error": "invalid", "details": {"field": "name"}})
        );
    }

    #[test]
    fn test_err_stops_resolution_of_later_siblings() {
        let tree = Node::response(vec![
            Node::err(422, "invalid"),
            Node::status(200),
            Node::body(json!("late")),
        ]);
        let out = resolve_response(&tree).unwrap();
        assert!(out.is_error);
        assert_eq!(out.status, 422);
        assert_eq!(out.body, json!({"error": "invalid"}));
    }

    #[test]
    fn test_err_inside_nested_fragment_stops_outer_walk() {
        let tree = Node::response(vec![
            Node::fragment(vec![Node::err(500, "broken")]),
            Node::status(201),
        ]);
        let out = resolve_response(&tree).unwrap();
        assert!(out.is_error);
        assert_eq!(out.status, 500);
    }

    #[test]
    fn test_bare_descriptor_nodes_without_response_wrapper() {
        let tree = Node::fragment(vec![Node::status(204)]);
        let out = resolve_response(&tree).unwrap();
        assert_eq!(out.status, 204);
        assert_eq!(out.body, Value::Null);
    }

    #[test]
    fn test_defaults_are_200_empty() {
        let out = resolve_response(&Node::response(vec![])).unwrap();
        assert_eq!(out.status, 200);
        assert_eq!(out.body, Value::Null);
        assert!(out.headers.is_empty());
    }
}
