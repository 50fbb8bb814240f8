//! JSON Interchange Codec
//!
//! Converts graphs to and from a nested JSON tree. Each node is written as
//!
//! ```json
//! {"dataKey": "A", "data": "A Dependency", "finished": false, "dependencies": [ ... ]}
//! ```
//!
//! where the child array is named for the traversal direction
//! (`dependencies` or `dependants`). A node with no children in that direction
//! writes a single `null` element rather than an empty array. A payload is one
//! node object or an array of them.
//!
//! Encoding walks the graph, so a node reachable along two paths is written
//! twice. Decoding builds a fresh node for every object it reads: sharing in
//! the source graph is not restored.

mod decode;
mod encode;

pub use decode::{Decoded, Decoder};
pub use encode::{encode, encode_all, encode_with, Encoder};
