//! Dependency Graph
//!
//! Nodes declaring "depends on" relationships, with an automatically
//! maintained reverse view, and forests that track every node reachable from
//! the nodes registered with them.
//!
//! # Overview
//!
//! - An edge "A depends on B" is stored as B in `A.dependencies` and A in
//!   `B.dependants`. Both halves are always written together.
//! - The graph formed by `dependencies` is acyclic: [`Node::add_dependency`]
//!   rejects self-loops and edges that would close a cycle.
//! - A root has no dependencies; a leaf has no dependants.
//!
//! # Design Decisions
//!
//! 1. Nodes are shared handles rather than arena indices, so callers can build
//!    graphs without first creating a container. Both edge halves are strong,
//!    so a graph stays whole for as long as any of its nodes is held, and is
//!    released with `teardown`.
//!
//! 2. Adjacency maps preserve insertion order, which makes rendering and
//!    encoding deterministic.
//!
//! 3. The traversal direction is a plain enum consulted by each recursive
//!    operation.

mod forest;
mod node;
mod scheme;

pub use forest::Forest;
pub use node::{Node, NodeId};
pub use scheme::{Equality, Scheme};
