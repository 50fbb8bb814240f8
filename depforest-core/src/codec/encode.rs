//! Encoding
//!
//! An explicit `Serialize` walk over the graph. The direction is fixed at the
//! top node and carried down, so one tree is always written in one direction.

use std::fmt::Display;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::graph::{Node, Scheme};

/// Serializes a node and everything reachable from it in one direction.
pub struct Encoder<'a, K, V> {
    node: &'a Node<K, V>,
    scheme: Scheme,
}

impl<'a, K, V> Encoder<'a, K, V> {
    pub fn new(node: &'a Node<K, V>, scheme: Scheme) -> Self {
        Self { node, scheme }
    }
}

impl<K: Display, V: Display> Serialize for Encoder<'_, K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let children = self.node.neighbors(self.scheme);
        let field = self.scheme.field_name();

        let mut state = serializer.serialize_struct("Node", 4)?;
        state.serialize_field("dataKey", &self.node.key().to_string())?;
        state.serialize_field("data", &self.node.value().to_string())?;
        state.serialize_field("finished", &self.node.is_finished())?;
        if children.is_empty() {
            // Childless nodes carry a single null placeholder.
            state.serialize_field(field, &[None::<()>])?;
        } else {
            state.serialize_field(
                field,
                &Siblings {
                    nodes: &children,
                    scheme: self.scheme,
                },
            )?;
        }
        state.end()
    }
}

struct Siblings<'a, K, V> {
    nodes: &'a [Node<K, V>],
    scheme: Scheme,
}

impl<K: Display, V: Display> Serialize for Siblings<'_, K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.nodes.iter().map(|node| Encoder::new(node, self.scheme)))
    }
}

/// Encode a node in its own scheme direction.
pub fn encode<K: Display, V: Display>(node: &Node<K, V>) -> Result<String, serde_json::Error> {
    encode_with(node, node.scheme())
}

/// Encode a node in an explicit direction.
pub fn encode_with<K: Display, V: Display>(
    node: &Node<K, V>,
    scheme: Scheme,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Encoder::new(node, scheme))
}

/// Encode several trees as a JSON array, even when there is only one.
pub fn encode_all<K: Display, V: Display>(
    nodes: &[Node<K, V>],
    scheme: Scheme,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Siblings { nodes, scheme })
}
