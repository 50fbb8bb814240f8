//! Graph Configuration
//!
//! Settings shared by forests and decoders. Loaded from JSON the same way
//! other serde-backed descriptions in this crate are.

use serde::{Deserialize, Serialize};

use crate::graph::{Equality, Scheme};

/// Settings for forests and decoders.
///
/// ```rust
/// use depforest_core::{Equality, GraphConfig, Scheme};
///
/// let config = GraphConfig::from_json(r#"{"equality": "strict"}"#).unwrap();
/// assert_eq!(config.equality, Equality::Strict);
/// assert_eq!(config.scheme, Scheme::Dependants);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// How nodes are compared when deduplicating and testing for cycles.
    pub equality: Equality,

    /// Default traversal direction pushed onto every managed node.
    pub scheme: Scheme,
}

impl GraphConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn with_equality(mut self, equality: Equality) -> Self {
        self.equality = equality;
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }
}
