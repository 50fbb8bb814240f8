//! Error Types
//!
//! `CircularDependencyError` is the only failure raised by graph mutation.
//! `DecodeError` covers everything that can go wrong while reading the JSON
//! interchange format, including cycles found while rebuilding a tree.

use std::fmt;

use thiserror::Error;

use crate::graph::Node;

/// Raised when accepting an edge would close a cycle or form a self-loop.
///
/// Carries the node that would have closed the cycle.
pub struct CircularDependencyError<K, V> {
    node: Node<K, V>,
}

impl<K, V> CircularDependencyError<K, V> {
    pub(crate) fn new(node: Node<K, V>) -> Self {
        Self { node }
    }

    /// The node whose addition was rejected.
    pub fn node(&self) -> &Node<K, V> {
        &self.node
    }

    /// Consume the error, returning the rejected node.
    pub fn into_node(self) -> Node<K, V> {
        self.node
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for CircularDependencyError<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircularDependencyError")
            .field("node", &self.node)
            .finish()
    }
}

impl<K: fmt::Display, V> fmt::Display for CircularDependencyError<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] would introduce a circular dependency", self.node.key())
    }
}

impl<K, V> std::error::Error for CircularDependencyError<K, V>
where
    K: fmt::Debug + fmt::Display,
    V: fmt::Debug,
{
}

/// Errors produced while decoding the JSON interchange format.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A node object lacks a required field.
    #[error("node is missing required field `{field}`")]
    MissingField { field: &'static str },

    /// A field is present but has the wrong JSON type.
    #[error("field `{field}` must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    /// The payload is neither a node object nor an array of node objects.
    #[error("expected a node object or an array of node objects")]
    UnexpectedShape,

    /// Rebuilding the tree rooted at `key` would have closed a cycle.
    #[error("circular reference adding [{key}]")]
    Cycle {
        key: String,
        #[source]
        source: CircularDependencyError<String, String>,
    },
}
