//! Middleware signal values.
//!
//! # Design Decisions
//! - Explicit sum type instead of return-value shape-sniffing: every
//!   variant must be handled at the single dispatch site in the pipeline
//! - Tagged Augment/Halt/Err nodes map onto the same variants so a
//!   middleware can be written in tree vocabulary

use thiserror::Error;

use serde_json::Value;

use crate::node::{resolve, Component, Node, Props, Resolved, ResolveError};

/// Failure raised by a middleware or handler.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HandlerError {
    /// HTTP status to use; 500 when absent.
    pub status: Option<u16>,
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

/// What a middleware asked the pipeline to do next.
#[derive(Debug, Clone)]
pub enum MiddlewareOutcome {
    /// Proceed to the next middleware (or the handler).
    Continue,
    /// Stop; the response is already taken care of.
    HaltSilently,
    /// Merge these fields into the handler context and proceed.
    Augment(Props),
    /// Stop and synthesize an error response.
    HaltWithError { status: u16, message: String },
}

impl MiddlewareOutcome {
    /// Build an Augment outcome from plain data. Non-object values carry
    /// no mergeable fields and collapse to Continue.
    pub fn augment(value: Value) -> Self {
        match value {
            Value::Object(fields) => MiddlewareOutcome::Augment(fields),
            _ => MiddlewareOutcome::Continue,
        }
    }

    /// Interpret a tagged node as an outcome: Augment merges, Halt and Err
    /// stop the chain, anything else continues.
    pub fn from_node(node: &Node) -> Result<Self, ResolveError> {
        match resolve(node)? {
            Resolved::Item(Component::Augment { fields }) => Ok(MiddlewareOutcome::Augment(fields)),
            Resolved::Item(Component::Halt { code, message }) => {
                Ok(MiddlewareOutcome::HaltWithError {
                    status: code,
                    message,
                })
            }
            Resolved::Item(Component::Err { code, message, .. }) => {
                Ok(MiddlewareOutcome::HaltWithError {
                    status: code,
                    message,
                })
            }
            _ => Ok(MiddlewareOutcome::Continue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_augment_from_object() {
        match MiddlewareOutcome::augment(json!({"user": 1})) {
            MiddlewareOutcome::Augment(fields) => assert!(fields.contains_key("user")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_augment_from_scalar_is_continue() {
        assert!(matches!(
            MiddlewareOutcome::augment(json!(42)),
            MiddlewareOutcome::Continue
        ));
    }

    #[test]
    fn test_halt_node_maps_to_halt_with_error() {
        let node = Node::halt(403, "nope");
        match MiddlewareOutcome::from_node(&node).unwrap() {
            MiddlewareOutcome::HaltWithError { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "nope");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_err_node_maps_to_halt_with_error() {
        let node = Node::err(422, "bad payload");
        match MiddlewareOutcome::from_node(&node).unwrap() {
            MiddlewareOutcome::HaltWithError { status, .. } => assert_eq!(status, 422),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_unrelated_node_is_continue() {
        let node = Node::status(200);
        assert!(matches!(
            MiddlewareOutcome::from_node(&node).unwrap(),
            MiddlewareOutcome::Continue
        ));
    }
}
