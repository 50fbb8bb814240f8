//! Depforest Core
//!
//! Mutable, multi-rooted dependency graphs with strict acyclicity, an
//! automatically maintained reverse view, and a JSON interchange format.
//!
//! It implements:
//!
//! - Graph nodes with bidirectional edge bookkeeping and cycle-safe mutation
//! - Forests that track every reachable node and maintain root/leaf indices
//! - A direction-aware recursive JSON encoder and decoder
//!
//! # Architecture
//!
//! - `graph`: nodes, forests and the traversal direction
//! - `codec`: JSON encoding and decoding
//! - `config`: settings shared by forests and decoders
//! - `error`: cycle and decode errors
//!
//! # Example
//!
//! ```rust
//! use depforest_core::{Forest, Node, Scheme};
//!
//! let build = Node::new("build", "compile sources");
//! let fetch = Node::new("fetch", "download dependencies");
//! build.add_dependency(&fetch).unwrap();
//!
//! // Cycles are rejected.
//! assert!(fetch.add_dependency(&build).is_err());
//!
//! let forest = Forest::with_scheme(Scheme::Dependencies);
//! forest.add_dependency(&build);
//! assert_eq!(forest.len(), 2);
//! assert_eq!(forest.root_nodes()[0].key(), &"fetch");
//! assert_eq!(forest.leaf_nodes()[0].key(), &"build");
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod graph;

pub use codec::{Decoded, Decoder};
pub use config::GraphConfig;
pub use error::{CircularDependencyError, DecodeError};
pub use graph::{Equality, Forest, Node, NodeId, Scheme};
