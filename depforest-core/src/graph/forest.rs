//! Dependency Forest
//!
//! A forest is the registry of every node reachable from any node ever added
//! to it, together with cached root and leaf indices.
//!
//! # Membership
//!
//! `all_nodes` maps each key to one member node. Adding a node pulls in its
//! whole connected component, following edges in both directions. Distinct
//! instances sharing a key (as produced by decoding a tree that mentions the
//! same key twice) are attached to the forest, but only the first one seen
//! under the forest's equality mode becomes the member. An attached instance
//! that no member reaches any more, such as a member displaced by a
//! non-equal node with the same key, is detached.
//!
//! # Index Maintenance
//!
//! `root_nodes` holds members without dependencies, `leaf_nodes` members
//! without dependants. Both are reconciled after every structural change made
//! through a node or the forest. Concurrent mutation may leave them briefly
//! stale; calling [`Forest::update_all_dependencies`] brings them back in line.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use super::node::{Node, NodeId};
use super::scheme::{Equality, Scheme};
use crate::codec::{self, Decoder};
use crate::config::GraphConfig;
use crate::error::DecodeError;

/// A registry of dependency graphs with root and leaf indices.
///
/// Cloning a `Forest` clones the handle; both handles manage the same nodes.
pub struct Forest<K, V> {
    inner: Arc<ForestInner<K, V>>,
}

pub(crate) struct ForestInner<K, V> {
    equality: Equality,
    scheme: RwLock<Scheme>,

    /// Members, one per key, in the order they joined.
    all_nodes: RwLock<IndexMap<K, Node<K, V>>>,

    /// Every instance reachable from a member, members included.
    attached: RwLock<IndexMap<NodeId, Node<K, V>>>,

    root_nodes: RwLock<Vec<Node<K, V>>>,
    leaf_nodes: RwLock<Vec<Node<K, V>>>,
}

impl<K, V> Clone for Forest<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Forest<K, V> {
    /// Create an empty forest with the default configuration.
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_scheme(scheme: Scheme) -> Self {
        Self::with_config(GraphConfig::default().with_scheme(scheme))
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            inner: Arc::new(ForestInner {
                equality: config.equality,
                scheme: RwLock::new(config.scheme),
                all_nodes: RwLock::new(IndexMap::new()),
                attached: RwLock::new(IndexMap::new()),
                root_nodes: RwLock::new(Vec::new()),
                leaf_nodes: RwLock::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<ForestInner<K, V>>) -> Self {
        Self { inner }
    }

    /// The configuration this forest currently runs with.
    pub fn config(&self) -> GraphConfig {
        GraphConfig {
            equality: self.inner.equality,
            scheme: self.scheme(),
        }
    }

    pub fn scheme(&self) -> Scheme {
        *self.inner.scheme.read()
    }

    /// Whether both handles manage the same forest.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of member nodes.
    pub fn len(&self) -> usize {
        self.inner.all_nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.all_nodes.read().is_empty()
    }

    /// Snapshot of the member nodes, in the order they joined.
    pub fn all_nodes(&self) -> Vec<Node<K, V>> {
        self.inner.all_nodes.read().values().cloned().collect()
    }

    /// Members without dependencies.
    pub fn root_nodes(&self) -> Vec<Node<K, V>> {
        self.inner.root_nodes.read().clone()
    }

    /// Members without dependants.
    pub fn leaf_nodes(&self) -> Vec<Node<K, V>> {
        self.inner.leaf_nodes.read().clone()
    }

    /// Set the forest-wide scheme and push it onto every attached node.
    pub fn set_scheme(&self, scheme: Scheme) {
        *self.inner.scheme.write() = scheme;
        for node in self.inner.attached.read().values() {
            node.store_scheme(scheme);
        }
    }

    /// Forget every node. Edges between the former members are untouched and
    /// their forest back-references are cleared, so they can join another
    /// forest.
    pub fn clear(&self) {
        let attached: Vec<Node<K, V>> = self
            .inner
            .attached
            .write()
            .drain(..)
            .map(|(_, node)| node)
            .collect();
        self.inner.all_nodes.write().clear();
        self.inner.root_nodes.write().clear();
        self.inner.leaf_nodes.write().clear();

        for node in &attached {
            node.detach_forest(&self.inner);
        }
        debug!(released = attached.len(), "forest cleared");
    }

    /// Remove every edge between attached nodes, then [`Forest::clear`].
    ///
    /// Linked nodes keep each other alive; this releases them once callers
    /// drop their own handles.
    pub fn teardown(&self) {
        let attached: Vec<Node<K, V>> = self.inner.attached.read().values().cloned().collect();
        for node in &attached {
            node.clear_edges();
        }
        self.clear();
    }

    /// Detach attached instances that no member reaches any more.
    pub(crate) fn prune(&self) {
        let all_nodes = self.inner.all_nodes.read();
        let mut reachable = HashSet::new();
        for member in all_nodes.values() {
            if !reachable.contains(&member.id()) {
                reachable.extend(member.component().iter().map(Node::id));
            }
        }

        let mut attached = self.inner.attached.write();
        let before = attached.len();
        attached.retain(|id, node| {
            let keep = reachable.contains(id);
            if !keep {
                node.detach_forest(&self.inner);
            }
            keep
        });
        let detached = before - attached.len();
        if detached > 0 {
            debug!(detached, "unreachable nodes detached from forest");
        }
    }

    /// The boundary enumerated by [`Forest::to_json`] and
    /// [`Forest::all_trees_to_strings`]: roots when walking dependants,
    /// leaves when walking dependencies.
    fn boundary(&self) -> (Scheme, Vec<Node<K, V>>) {
        let scheme = self.scheme();
        let nodes = match scheme {
            Scheme::Dependants => self.root_nodes(),
            Scheme::Dependencies => self.leaf_nodes(),
        };
        (scheme, nodes)
    }
}

impl<K, V> Forest<K, V>
where
    K: Clone + Eq + Hash,
    V: PartialEq,
{
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.all_nodes.read().contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<Node<K, V>> {
        self.inner.all_nodes.read().get(key).cloned()
    }

    /// Whether a member equal to `node` under the forest's equality mode exists.
    pub fn has_dependency(&self, node: &Node<K, V>) -> bool {
        self.get(node.key())
            .is_some_and(|stored| stored.matches(node, self.inner.equality))
    }

    /// Add `node` and everything reachable from it in either direction.
    ///
    /// Skips if an equal member is already present. A member with the same key
    /// that is not equal under the forest's equality mode is replaced.
    pub fn add_dependency(&self, node: &Node<K, V>) {
        if self.has_dependency(node) {
            debug!(id = node.id().raw(), "node already in forest");
            return;
        }
        self.absorb(node);
    }

    /// Attach the connected component of `node` and reconcile the indices.
    pub(crate) fn absorb(&self, node: &Node<K, V>) {
        let component = node.component();
        let scheme = self.scheme();
        let mut joined = 0usize;
        {
            let mut all_nodes = self.inner.all_nodes.write();
            let mut attached = self.inner.attached.write();
            for member in &component {
                member.attach_forest(&self.inner);
                member.store_scheme(scheme);
                attached.insert(member.id(), member.clone());

                let is_member = all_nodes
                    .get(member.key())
                    .is_some_and(|stored| stored.matches(member, self.inner.equality));
                if !is_member {
                    all_nodes.insert(member.key().clone(), member.clone());
                    joined += 1;
                }
            }
        }
        debug!(id = node.id().raw(), joined, "nodes absorbed into forest");
        self.prune();
        self.update_all_dependencies();
    }

    /// Drop `node` from the forest if it is attached.
    pub(crate) fn release(&self, node: &Node<K, V>) {
        {
            let mut all_nodes = self.inner.all_nodes.write();
            if all_nodes
                .get(node.key())
                .is_some_and(|stored| stored.ptr_eq(node))
            {
                all_nodes.shift_remove(node.key());
            }
        }
        self.inner.attached.write().shift_remove(&node.id());
        node.detach_forest(&self.inner);
        self.prune();
        self.update_all_dependencies();
    }

    /// Reconcile the root and leaf indices for one member.
    pub fn update_dependency(&self, node: &Node<K, V>) {
        let is_member = self
            .inner
            .all_nodes
            .read()
            .get(node.key())
            .is_some_and(|stored| stored.ptr_eq(node));
        if !is_member {
            return;
        }

        let is_root = !node.has_dependencies();
        let is_leaf = !node.has_dependants();
        reconcile(&mut self.inner.root_nodes.write(), node, is_root);
        reconcile(&mut self.inner.leaf_nodes.write(), node, is_leaf);
    }

    /// Reconcile the root and leaf indices for every member, dropping entries
    /// for nodes that are no longer members.
    pub fn update_all_dependencies(&self) {
        let members = {
            let all_nodes = self.inner.all_nodes.read();
            let is_current = |node: &Node<K, V>| {
                all_nodes
                    .get(node.key())
                    .is_some_and(|stored| stored.ptr_eq(node))
            };
            self.inner.root_nodes.write().retain(|node| is_current(node));
            self.inner.leaf_nodes.write().retain(|node| is_current(node));
            all_nodes.values().cloned().collect::<Vec<_>>()
        };

        for node in &members {
            self.update_dependency(node);
        }
    }
}

impl<K: fmt::Display, V: fmt::Display> Forest<K, V> {
    /// Encode the boundary trees as a JSON array.
    ///
    /// Each boundary node encodes its whole subgraph, so nodes reachable from
    /// more than one boundary node are written once per boundary node.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let (scheme, boundary) = self.boundary();
        codec::encode_all(&boundary, scheme)
    }
}

impl<K: fmt::Display, V> Forest<K, V> {
    /// Render each boundary tree.
    pub fn all_trees_to_strings(&self) -> Vec<String> {
        let (scheme, boundary) = self.boundary();
        boundary.iter().map(|node| node.render(scheme)).collect()
    }
}

impl Forest<String, String> {
    /// Decode a JSON payload and absorb every decoded tree into a new forest.
    pub fn from_json(json: &str, config: GraphConfig) -> Result<Self, DecodeError> {
        Ok(Decoder::new(config).decode(json)?.into_forest(config))
    }
}

impl<K, V> Default for Forest<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Forest<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let all_nodes = self.inner.all_nodes.read();
        f.debug_struct("Forest")
            .field("equality", &self.inner.equality)
            .field("scheme", &self.scheme())
            .field("nodes", &all_nodes.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn reconcile<K, V>(index: &mut Vec<Node<K, V>>, node: &Node<K, V>, belongs: bool) {
    let position = index.iter().position(|entry| entry.ptr_eq(node));
    match (belongs, position) {
        (true, None) => index.push(node.clone()),
        (false, Some(position)) => {
            index.remove(position);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(key: &str) -> Node<String, String> {
        Node::new(key.to_string(), format!("{key} Dependency"))
    }

    fn keys(nodes: &[Node<String, String>]) -> Vec<&str> {
        nodes.iter().map(|node| node.key().as_str()).collect()
    }

    #[test]
    fn independent_nodes_are_roots_and_leaves() {
        let forest = Forest::new();
        let x = node("X");
        let y = node("Y");
        forest.add_dependency(&x);
        forest.add_dependency(&y);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest.root_nodes().len(), 2);
        assert_eq!(forest.leaf_nodes().len(), 2);

        x.add_dependency(&y).unwrap();

        assert_eq!(forest.len(), 2);
        assert_eq!(keys(&forest.root_nodes()), ["Y"]);
        assert_eq!(keys(&forest.leaf_nodes()), ["X"]);
    }

    #[test]
    fn adding_one_node_absorbs_its_component() {
        let a = node("A");
        let b = node("B");
        let c = node("C");
        a.add_dependency(&b).unwrap();
        c.add_dependency(&b).unwrap();

        let forest = Forest::new();
        forest.add_dependency(&b);

        assert_eq!(forest.len(), 3);
        assert!(forest.contains_key(&"A".to_string()));
        assert!(forest.contains_key(&"C".to_string()));
        assert!(a.forest().is_some_and(|f| f.ptr_eq(&forest)));
        assert_eq!(keys(&forest.root_nodes()), ["B"]);
        assert_eq!(keys(&forest.leaf_nodes()), ["A", "C"]);
    }

    #[test]
    fn edge_to_outsider_pulls_it_in() {
        let forest = Forest::new();
        let a = node("A");
        forest.add_dependency(&a);

        let b = node("B");
        let c = node("C");
        b.add_dependency(&c).unwrap();
        a.add_dependency(&b).unwrap();

        assert_eq!(forest.len(), 3);
        assert_eq!(keys(&forest.root_nodes()), ["C"]);
        assert_eq!(keys(&forest.leaf_nodes()), ["A"]);
    }

    #[test]
    fn outsider_depending_on_member_joins() {
        let forest = Forest::new();
        let a = node("A");
        forest.add_dependency(&a);

        let z = node("Z");
        z.add_dependency(&a).unwrap();

        assert!(forest.contains_key(&"Z".to_string()));
        assert_eq!(keys(&forest.leaf_nodes()), ["Z"]);
    }

    #[test]
    fn repeated_add_is_skipped() {
        let forest = Forest::new();
        let a = node("A");
        forest.add_dependency(&a);
        forest.add_dependency(&a);
        forest.add_dependency(&node("A"));

        assert_eq!(forest.len(), 1);
        assert!(forest.get(&"A".to_string()).unwrap().ptr_eq(&a));
    }

    #[test]
    fn strict_forest_replaces_imposter() {
        let forest = Forest::with_config(GraphConfig::default().with_equality(Equality::Strict));
        let original = Node::new("Dep 1".to_string(), "I am the original!".to_string());
        let imposter = Node::new("Dep 1".to_string(), "Imposter.".to_string());
        forest.add_dependency(&original);
        forest.add_dependency(&imposter);

        assert_eq!(forest.len(), 1);
        assert!(forest.get(&"Dep 1".to_string()).unwrap().ptr_eq(&imposter));
        assert_eq!(forest.root_nodes().len(), 1);
        assert!(forest.root_nodes()[0].ptr_eq(&imposter));

        assert!(original.forest().is_none());
        forest.set_scheme(Scheme::Dependencies);
        assert_eq!(imposter.scheme(), Scheme::Dependencies);
        assert_eq!(original.scheme(), Scheme::Dependants);
    }

    #[test]
    fn displaced_member_with_neighbors_stays_attached() {
        let forest = Forest::with_config(GraphConfig::default().with_equality(Equality::Strict));
        let top = node("Top");
        let original = Node::new("Dep".to_string(), "one".to_string());
        top.add_dependency(&original).unwrap();
        forest.add_dependency(&top);

        forest.add_dependency(&Node::new("Dep".to_string(), "two".to_string()));

        // Still linked to a member, so still part of the forest's graph.
        assert!(original.forest().is_some_and(|f| f.ptr_eq(&forest)));
    }

    #[test]
    fn teardown_unlinks_and_empties() {
        let forest = Forest::new();
        let a = node("A");
        let b = node("B");
        a.add_dependency(&b).unwrap();
        forest.add_dependency(&a);

        forest.teardown();

        assert!(forest.is_empty());
        assert!(!a.has_dependencies());
        assert!(!b.has_dependants());
        assert!(!b.has_forest());
    }

    #[test]
    fn set_scheme_reaches_every_node() {
        let forest = Forest::new();
        let a = node("A");
        let b = node("B");
        a.add_dependency(&b).unwrap();
        forest.add_dependency(&a);

        forest.set_scheme(Scheme::Dependencies);
        assert_eq!(a.scheme(), Scheme::Dependencies);
        assert_eq!(b.scheme(), Scheme::Dependencies);
    }

    #[test]
    fn clear_keeps_edges() {
        let forest = Forest::new();
        let a = node("A");
        let b = node("B");
        a.add_dependency(&b).unwrap();
        forest.add_dependency(&a);

        forest.clear();

        assert!(forest.is_empty());
        assert!(forest.root_nodes().is_empty());
        assert!(forest.leaf_nodes().is_empty());
        assert!(!a.has_forest());
        assert_eq!(keys(&a.dependencies()), ["B"]);

        let other = Forest::new();
        other.add_dependency(&b);
        assert_eq!(other.len(), 2);
    }

    #[test]
    fn remove_drops_member_and_reconciles() {
        let forest = Forest::new();
        let top = node("Top");
        let mid = node("Mid");
        let base = node("Base");
        top.add_dependency(&mid).unwrap();
        mid.add_dependency(&base).unwrap();
        forest.add_dependency(&top);

        assert!(top.remove_dependency(&mid));

        assert_eq!(forest.len(), 2);
        assert!(!forest.contains_key(&"Mid".to_string()));
        assert!(!mid.has_forest());
        assert_eq!(keys(&forest.root_nodes()), ["Base"]);
        assert_eq!(keys(&forest.leaf_nodes()), ["Top"]);
    }

    #[test]
    fn renders_boundary_trees() {
        let forest = Forest::with_scheme(Scheme::Dependencies);
        let a = node("A");
        let b = node("B");
        a.add_dependency(&b).unwrap();
        forest.add_dependency(&a);

        assert_eq!(
            forest.all_trees_to_strings(),
            vec!["===> [A dependencies=(1)] <===\n-B(0)\n-<< NO DEPENDENCIES >>\n".to_string()]
        );

        forest.set_scheme(Scheme::Dependants);
        assert_eq!(
            forest.all_trees_to_strings(),
            vec!["===> [B dependants=(1)] <===\n-A(0)\n-<< NO DEPENDANTS >>\n".to_string()]
        );
    }

    #[test]
    fn update_dependency_ignores_non_members() {
        let forest: Forest<String, String> = Forest::new();
        let stranger = node("S");
        forest.update_dependency(&stranger);
        assert!(forest.root_nodes().is_empty());
    }
}
