//! Decoding
//!
//! Reads the interchange format back into nodes with an explicit recursive
//! walk over `serde_json::Value`. Children are decoded before they are linked
//! to their parent, so a cycle surfaces at the parent that would close it.
//!
//! Every node level nests an object and an array, so deep graphs exceed
//! `serde_json`'s default recursion limit. The payload is parsed with the
//! limit disabled and the stack grown on demand instead.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::config::GraphConfig;
use crate::error::DecodeError;
use crate::graph::{Forest, Node, Scheme};

type StringNode = Node<String, String>;

/// Builds nodes from JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    config: GraphConfig,
}

/// The result of decoding a payload.
#[derive(Debug, Default)]
pub struct Decoded {
    trees: Vec<StringNode>,
    nodes: Vec<StringNode>,
}

impl Decoded {
    /// Top-level nodes, one per tree, in payload order.
    pub fn trees(&self) -> &[StringNode] {
        &self.trees
    }

    /// Every node built while decoding, in creation order.
    pub fn nodes(&self) -> &[StringNode] {
        &self.nodes
    }

    /// Absorb every tree into a new forest.
    pub fn into_forest(self, config: GraphConfig) -> Forest<String, String> {
        let forest = Forest::with_config(config);
        for tree in &self.trees {
            forest.add_dependency(tree);
        }
        forest
    }
}

impl Decoder {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Decode a node object or an array of node objects.
    ///
    /// Fails on the first malformed or cyclic tree.
    pub fn decode(&self, json: &str) -> Result<Decoded, DecodeError> {
        let payload = parse(json)?;
        let mut decoded = Decoded::default();
        for tree in top_level(&payload)? {
            let root = self.decode_node(tree, &mut decoded.nodes)?;
            decoded.trees.push(root);
        }
        Ok(decoded)
    }

    /// Decode each top-level tree independently.
    ///
    /// The outer error is reserved for payloads that are not JSON or not
    /// node-shaped at the top level; a bad tree only fails its own entry.
    pub fn decode_each(
        &self,
        json: &str,
    ) -> Result<Vec<Result<Decoded, DecodeError>>, DecodeError> {
        let payload = parse(json)?;
        let trees = top_level(&payload)?;
        Ok(trees
            .into_iter()
            .map(|tree| {
                let mut decoded = Decoded::default();
                let root = self.decode_node(tree, &mut decoded.nodes)?;
                decoded.trees.push(root);
                Ok(decoded)
            })
            .collect())
    }

    fn decode_node(
        &self,
        value: &Value,
        built: &mut Vec<StringNode>,
    ) -> Result<StringNode, DecodeError> {
        let object = value.as_object().ok_or(DecodeError::UnexpectedShape)?;

        let key = required_str(object, "dataKey")?;
        let data = required_str(object, "data")?;
        let finished = match object.get("finished") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(finished)) => *finished,
            Some(_) => {
                return Err(DecodeError::InvalidField {
                    field: "finished",
                    expected: "a boolean",
                })
            }
        };

        let node = Node::with_equality(key.to_string(), data.to_string(), self.config.equality);
        node.set_finished(finished);
        built.push(node.clone());

        let Some((scheme, children)) = child_array(object)? else {
            node.store_scheme(self.config.scheme);
            return Ok(node);
        };
        node.store_scheme(scheme);

        for child in children.iter().filter(|child| !child.is_null()) {
            let child = self.decode_node(child, built)?;
            let linked = match scheme {
                Scheme::Dependencies => node.add_dependency(&child),
                Scheme::Dependants => child.add_dependency(&node),
            };
            if let Err(source) = linked {
                warn!(key = %node.key(), child = %child.key(), "cycle while decoding");
                return Err(DecodeError::Cycle {
                    key: node.key().clone(),
                    source,
                });
            }
        }
        Ok(node)
    }
}

fn parse(json: &str) -> Result<Value, DecodeError> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    Ok(value)
}

fn top_level(payload: &Value) -> Result<Vec<&Value>, DecodeError> {
    match payload {
        Value::Array(trees) => Ok(trees.iter().filter(|tree| !tree.is_null()).collect()),
        Value::Object(_) => Ok(vec![payload]),
        _ => Err(DecodeError::UnexpectedShape),
    }
}

fn required_str<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, DecodeError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(DecodeError::MissingField { field }),
        Some(Value::String(text)) => Ok(text.as_str()),
        Some(_) => Err(DecodeError::InvalidField {
            field,
            expected: "a string",
        }),
    }
}

/// The child array and the direction it encodes, if the node has one.
fn child_array(
    object: &Map<String, Value>,
) -> Result<Option<(Scheme, &Vec<Value>)>, DecodeError> {
    for scheme in [Scheme::Dependencies, Scheme::Dependants] {
        let field = scheme.field_name();
        match object.get(field) {
            None | Some(Value::Null) => continue,
            Some(Value::Array(children)) => return Ok(Some((scheme, children))),
            Some(_) => {
                return Err(DecodeError::InvalidField {
                    field,
                    expected: "an array",
                })
            }
        }
    }
    Ok(None)
}
