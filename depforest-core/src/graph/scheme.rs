//! Traversal Direction and Equality Mode
//!
//! Two small enums that every recursive operation on the graph consults.

use serde::{Deserialize, Serialize};

/// The traversal direction used by size, rendering and serialization.
///
/// A node serialized under `Dependencies` nests the nodes it depends on; under
/// `Dependants` it nests the nodes that depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Walk `dependencies` edges.
    Dependencies,

    /// Walk `dependants` edges.
    #[default]
    Dependants,
}

impl Scheme {
    /// Name of the child array written by the codec for this direction.
    pub fn field_name(self) -> &'static str {
        match self {
            Scheme::Dependencies => "dependencies",
            Scheme::Dependants => "dependants",
        }
    }

    /// Upper-case label used in rendered trees.
    pub(crate) fn label(self) -> &'static str {
        match self {
            Scheme::Dependencies => "DEPENDENCIES",
            Scheme::Dependants => "DEPENDANTS",
        }
    }
}

/// How two nodes are compared for duplicate detection and cycle testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Equality {
    /// Nodes are equal iff their keys are equal.
    #[default]
    Key,

    /// Nodes are equal iff key, value and finished flag all match.
    Strict,
}
