//! Tree Errors
//!
//! Structural failures raised by tree mutation. Lookups never error: they
//! return `None` instead.

use crate::dom::NodeId;

/// Errors returned by structural tree operations.
///
/// Every operation that returns one of these leaves the tree exactly as it
/// was before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The node is already attached to a parent and cloning is not the policy
    #[error("The {kind} already has an existing parent \"{parent}\"")]
    IllegalAdd {
        node: NodeId,
        kind: &'static str,
        parent: String,
    },

    /// Positional access beyond the current cardinality
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The id does not belong to this tree
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// An element-only operation was applied to another node kind
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    /// The element would become its own ancestor
    #[error("adding {node} under {owner} would make it its own ancestor")]
    Cycle { node: NodeId, owner: NodeId },

    /// An attribute was offered as content, or content as an attribute
    #[error("node {node} cannot be used here: expected {expected}")]
    WrongKind {
        node: NodeId,
        expected: &'static str,
    },
}

/// Result alias for tree operations
pub type Result<T> = std::result::Result<T, TreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_add_message() {
        let err = TreeError::IllegalAdd {
            node: NodeId::from_raw(3),
            kind: "Attribute",
            parent: "p:root".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "The Attribute already has an existing parent \"p:root\""
        );
    }

    #[test]
    fn test_index_message() {
        let err = TreeError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(err.to_string(), "index 4 out of range for length 2");
    }
}
