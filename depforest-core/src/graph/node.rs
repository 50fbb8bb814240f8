//! Graph Nodes
//!
//! A [`Node`] is a shared handle to a vertex holding a key, an opaque value,
//! a finished flag and two adjacency maps.
//!
//! # Ownership
//!
//! Both halves of an edge hold their target strongly: every node reachable
//! from a live handle, in either direction, stays alive. Linked nodes
//! therefore keep each other alive until their edges are removed, either one
//! at a time or all at once with [`Node::teardown`] or [`Forest::teardown`].
//!
//! # Locking
//!
//! Every adjacency map sits behind its own lock. A lock is never held while
//! calling into another node; traversals take snapshots of the neighbor list
//! first. Multi-step edits (both halves of an edge, forest reconciliation) are
//! not atomic as a whole.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, trace};

use super::forest::{Forest, ForestInner};
use super::scheme::{Equality, Scheme};
use crate::error::CircularDependencyError;

/// Process-unique identity of a node instance.
///
/// Two handles with the same `NodeId` are the same node. Distinct instances
/// sharing a key have distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A vertex in a dependency graph.
///
/// Cloning a `Node` clones the handle, not the vertex.
pub struct Node<K, V> {
    inner: Arc<NodeInner<K, V>>,
}

pub(crate) struct NodeInner<K, V> {
    id: NodeId,
    key: K,
    value: V,
    finished: AtomicBool,
    equality: Equality,
    scheme: RwLock<Scheme>,

    /// Nodes this node depends on.
    dependencies: RwLock<IndexMap<K, Node<K, V>>>,

    /// Nodes that depend on this node.
    dependants: RwLock<IndexMap<K, Node<K, V>>>,

    forest: RwLock<Weak<ForestInner<K, V>>>,
}

impl<K, V> Clone for Node<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Node<K, V> {
    /// Create a standalone node compared by key.
    pub fn new(key: K, value: V) -> Self {
        Self::with_equality(key, value, Equality::Key)
    }

    /// Create a standalone node with an explicit equality mode.
    pub fn with_equality(key: K, value: V, equality: Equality) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                id: NodeId::next(),
                key,
                value,
                finished: AtomicBool::new(false),
                equality,
                scheme: RwLock::new(Scheme::default()),
                dependencies: RwLock::new(IndexMap::new()),
                dependants: RwLock::new(IndexMap::new()),
                forest: RwLock::new(Weak::new()),
            }),
        }
    }

    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    pub fn key(&self) -> &K {
        &self.inner.key
    }

    pub fn value(&self) -> &V {
        &self.inner.value
    }

    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::Acquire)
    }

    pub fn set_finished(&self, finished: bool) {
        self.inner.finished.store(finished, Ordering::Release);
    }

    pub fn equality(&self) -> Equality {
        self.inner.equality
    }

    /// The traversal direction used by [`Node::size`], rendering and encoding.
    pub fn scheme(&self) -> Scheme {
        *self.inner.scheme.read()
    }

    /// Whether both handles point at the same vertex.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The forest managing this node, if it is still alive.
    pub fn forest(&self) -> Option<Forest<K, V>> {
        self.inner.forest.read().upgrade().map(Forest::from_inner)
    }

    pub fn has_forest(&self) -> bool {
        self.inner.forest.read().strong_count() > 0
    }

    /// Snapshot of the direct dependencies, in insertion order.
    pub fn dependencies(&self) -> Vec<Node<K, V>> {
        self.inner.dependencies.read().values().cloned().collect()
    }

    /// Snapshot of the direct dependants, in insertion order.
    pub fn dependants(&self) -> Vec<Node<K, V>> {
        self.inner.dependants.read().values().cloned().collect()
    }

    pub fn has_dependencies(&self) -> bool {
        !self.inner.dependencies.read().is_empty()
    }

    pub fn has_dependants(&self) -> bool {
        !self.inner.dependants.read().is_empty()
    }

    /// Direct neighbors in the given direction.
    pub fn neighbors(&self, direction: Scheme) -> Vec<Node<K, V>> {
        match direction {
            Scheme::Dependencies => self.dependencies(),
            Scheme::Dependants => self.dependants(),
        }
    }

    /// 1 plus the sizes of every neighbor in the node's scheme direction.
    ///
    /// Shared descendants are counted once per path that reaches them, so this
    /// is not a count of distinct nodes.
    pub fn size(&self) -> usize {
        self.size_in(self.scheme())
    }

    fn size_in(&self, direction: Scheme) -> usize {
        1 + self
            .neighbors(direction)
            .iter()
            .map(|node| node.size_in(direction))
            .sum::<usize>()
    }

    /// Every distinct node reachable in `direction`, excluding `self`,
    /// in breadth-first discovery order.
    pub fn reachable(&self, direction: Scheme) -> Vec<Node<K, V>> {
        let mut found = Vec::new();
        self.walk(direction, |node| {
            found.push(node.clone());
            false
        });
        found
    }

    /// Breadth-first walk over distinct nodes reachable in `direction`.
    /// Stops at, and returns, the first node for which `visit` returns true.
    fn walk(
        &self,
        direction: Scheme,
        mut visit: impl FnMut(&Node<K, V>) -> bool,
    ) -> Option<Node<K, V>> {
        let mut visited = HashSet::from([self.id()]);
        let mut queue: VecDeque<Node<K, V>> = self.neighbors(direction).into();

        while let Some(node) = queue.pop_front() {
            if !visited.insert(node.id()) {
                continue;
            }
            if visit(&node) {
                return Some(node);
            }
            queue.extend(node.neighbors(direction));
        }
        None
    }

    /// Set the scheme on this node and everything reachable through its
    /// dependencies.
    pub fn set_scheme(&self, scheme: Scheme) {
        self.store_scheme(scheme);
        self.walk(Scheme::Dependencies, |node| {
            node.store_scheme(scheme);
            false
        });
    }

    /// Every distinct node reachable along either edge direction, `self`
    /// first.
    pub(crate) fn component(&self) -> Vec<Node<K, V>> {
        let mut visited = HashSet::new();
        let mut component = Vec::new();
        let mut queue = VecDeque::from([self.clone()]);

        while let Some(node) = queue.pop_front() {
            if !visited.insert(node.id()) {
                continue;
            }
            queue.extend(node.dependants());
            queue.extend(node.dependencies());
            component.push(node);
        }
        component
    }

    /// Drop both edge maps without touching the neighbors.
    pub(crate) fn clear_edges(&self) {
        self.inner.dependencies.write().clear();
        self.inner.dependants.write().clear();
    }

    pub(crate) fn store_scheme(&self, scheme: Scheme) {
        *self.inner.scheme.write() = scheme;
    }

    pub(crate) fn attach_forest(&self, forest: &Arc<ForestInner<K, V>>) {
        *self.inner.forest.write() = Arc::downgrade(forest);
    }

    /// Clear the forest back-reference if it points at `forest`.
    pub(crate) fn detach_forest(&self, forest: &Arc<ForestInner<K, V>>) {
        let mut slot = self.inner.forest.write();
        if std::ptr::eq(slot.as_ptr(), Arc::as_ptr(forest)) {
            *slot = Weak::new();
        }
    }

    /// Nodes reachable through dependencies that have no dependencies
    /// themselves. A node without dependencies is its own root.
    pub fn root_nodes(&self) -> Vec<Node<K, V>> {
        self.boundary(Scheme::Dependencies)
    }

    /// Nodes reachable through dependants that have no dependants themselves.
    /// A node without dependants is its own leaf.
    pub fn leaf_nodes(&self) -> Vec<Node<K, V>> {
        self.boundary(Scheme::Dependants)
    }

    fn boundary(&self, direction: Scheme) -> Vec<Node<K, V>> {
        if self.neighbors(direction).is_empty() {
            return vec![self.clone()];
        }
        self.reachable(direction)
            .into_iter()
            .filter(|node| node.neighbors(direction).is_empty())
            .collect()
    }

    /// Every path from this node to a reachable root, shortest first.
    ///
    /// Each route starts with `self` and ends with a root. A node with several
    /// dependencies forks the route, so a root reachable along two paths
    /// appears in two routes.
    pub fn routes_to_root_nodes(&self) -> Vec<Vec<Node<K, V>>> {
        let mut routes = Vec::new();
        self.collect_routes(Vec::new(), &mut routes);
        routes.sort_by_key(Vec::len);
        routes
    }

    fn collect_routes(&self, mut route: Vec<Node<K, V>>, routes: &mut Vec<Vec<Node<K, V>>>) {
        route.push(self.clone());
        let dependencies = self.dependencies();
        if dependencies.is_empty() {
            routes.push(route);
            return;
        }
        for dependency in dependencies {
            dependency.collect_routes(route.clone(), routes);
        }
    }
}

impl<K, V> Node<K, V>
where
    K: Clone + Eq + Hash,
    V: PartialEq,
{
    /// Compare two nodes under an explicit equality mode.
    pub fn matches(&self, other: &Self, equality: Equality) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if self.key() != other.key() {
            return false;
        }
        match equality {
            Equality::Key => true,
            Equality::Strict => {
                self.value() == other.value() && self.is_finished() == other.is_finished()
            }
        }
    }

    /// Compare two nodes under the stricter of their two equality modes.
    pub fn is_equivalent(&self, other: &Self) -> bool {
        let strict = self.equality() == Equality::Strict || other.equality() == Equality::Strict;
        let equality = if strict { Equality::Strict } else { Equality::Key };
        self.matches(other, equality)
    }

    /// Declare that this node depends on `candidate`.
    ///
    /// Fails if the edge would be a self-loop or would close a cycle through
    /// `candidate`'s existing dependencies. Re-adding an equivalent
    /// dependency is a no-op. If the node is forest-managed, the candidate's
    /// reachable graph joins the forest and the forest indices are reconciled.
    ///
    /// Each endpoint keeps the other alive. Use [`Node::remove_dependency`]
    /// or [`Node::teardown`] to release a graph.
    pub fn add_dependency(
        &self,
        candidate: &Node<K, V>,
    ) -> Result<(), CircularDependencyError<K, V>> {
        if candidate.is_equivalent(self) {
            return Err(CircularDependencyError::new(candidate.clone()));
        }
        if candidate
            .walk(Scheme::Dependencies, |node| node.is_equivalent(self))
            .is_some()
        {
            return Err(CircularDependencyError::new(candidate.clone()));
        }

        let existing = self.inner.dependencies.read().get(candidate.key()).cloned();
        if let Some(existing) = existing {
            if existing.is_equivalent(candidate) {
                trace!(id = self.id().raw(), "dependency already present");
                return Ok(());
            }
            existing.unlink_dependant(self);
        }

        self.inner
            .dependencies
            .write()
            .insert(candidate.key().clone(), candidate.clone());
        candidate
            .inner
            .dependants
            .write()
            .insert(self.key().clone(), self.clone());
        candidate.set_scheme(self.scheme());

        debug!(
            dependant = self.id().raw(),
            dependency = candidate.id().raw(),
            "dependency added"
        );

        if let Some(forest) = self.forest().or_else(|| candidate.forest()) {
            forest.absorb(candidate);
        }
        Ok(())
    }

    /// Remove `victim` from this node's reachable dependency graph.
    ///
    /// The stored node matching `victim`'s key is detached from all of its
    /// neighbors, and each of its former dependants is regrafted onto each of
    /// its former dependencies. Regrafts that would close a cycle are skipped.
    /// Returns `false` if no dependency with that key is reachable.
    pub fn remove_dependency(&self, victim: &Node<K, V>) -> bool {
        let Some(stored) = self.get_dependency(victim.key()) else {
            return false;
        };

        let children = stored.dependants();
        let parents = stored.dependencies();

        for child in &children {
            let mut dependencies = child.inner.dependencies.write();
            if dependencies
                .get(stored.key())
                .is_some_and(|node| node.ptr_eq(&stored))
            {
                dependencies.shift_remove(stored.key());
            }
        }
        for parent in &parents {
            parent.unlink_dependant(&stored);
        }
        stored.clear_edges();

        let forest = stored.forest();
        if let Some(forest) = &forest {
            forest.release(&stored);
        }

        for child in &children {
            for parent in &parents {
                if let Err(err) = child.add_dependency(parent) {
                    debug!(
                        child = child.id().raw(),
                        parent = err.node().id().raw(),
                        "regraft skipped, edge would close a cycle"
                    );
                }
            }
        }

        if let Some(forest) = forest {
            forest.update_all_dependencies();
        }
        debug!(removed = stored.id().raw(), "dependency removed");
        true
    }

    /// Drop `dependant` from this node's dependants if it is the stored entry.
    fn unlink_dependant(&self, dependant: &Node<K, V>) {
        let mut dependants = self.inner.dependants.write();
        if dependants
            .get(dependant.key())
            .is_some_and(|node| node.ptr_eq(dependant))
        {
            dependants.shift_remove(dependant.key());
        }
    }

    /// Remove every edge in this node's connected component.
    ///
    /// The nodes are released once the caller drops its own handles. If the
    /// component is forest-managed, the nodes stay members and the indices are
    /// reconciled.
    pub fn teardown(&self) {
        let component = self.component();
        for node in &component {
            node.clear_edges();
        }
        if let Some(forest) = self.forest() {
            forest.prune();
            forest.update_all_dependencies();
        }
        debug!(id = self.id().raw(), released = component.len(), "component torn down");
    }

    /// Whether a node equivalent to `other` is reachable through dependencies.
    pub fn has_dependency(&self, other: &Node<K, V>) -> bool {
        self.walk(Scheme::Dependencies, |node| node.is_equivalent(other))
            .is_some()
    }

    /// Whether a node equivalent to `other` is reachable through dependants.
    pub fn has_dependant(&self, other: &Node<K, V>) -> bool {
        self.walk(Scheme::Dependants, |node| node.is_equivalent(other))
            .is_some()
    }

    pub fn has_dependency_key(&self, key: &K) -> bool {
        self.get_dependency(key).is_some()
    }

    pub fn has_dependant_key(&self, key: &K) -> bool {
        self.get_dependant(key).is_some()
    }

    /// The stored node with `key` reachable through dependencies, nearest
    /// first.
    pub fn get_dependency(&self, key: &K) -> Option<Node<K, V>> {
        self.walk(Scheme::Dependencies, |node| node.key() == key)
    }

    /// The stored node with `key` reachable through dependants, nearest first.
    pub fn get_dependant(&self, key: &K) -> Option<Node<K, V>> {
        self.walk(Scheme::Dependants, |node| node.key() == key)
    }
}

impl<K: fmt::Display, V> Node<K, V> {
    /// Render the tree below this node in its scheme direction.
    pub fn tree_to_string(&self) -> String {
        self.render(self.scheme())
    }

    /// Render the tree of everything this node depends on.
    pub fn dependency_tree_to_string(&self) -> String {
        self.render(Scheme::Dependencies)
    }

    /// Render the tree of everything that depends on this node.
    pub fn dependant_tree_to_string(&self) -> String {
        self.render(Scheme::Dependants)
    }

    pub(crate) fn render(&self, direction: Scheme) -> String {
        let mut out = String::new();
        self.render_into(direction, 0, &mut out);
        out
    }

    fn render_into(&self, direction: Scheme, depth: usize, out: &mut String) {
        let children = self.neighbors(direction);
        let dashes = "-".repeat(depth);

        if depth == 0 {
            out.push_str(&format!(
                "===> [{} {}=({})] <===",
                self.key(),
                direction.field_name(),
                children.len()
            ));
        } else {
            out.push_str(&format!("{dashes}{}({})", self.key(), children.len()));
        }

        if children.is_empty() {
            out.push_str(&format!("\n{dashes}<< NO {} >>\n", direction.label()));
            return;
        }

        out.push('\n');
        for child in children {
            child.render_into(direction, depth + 1, out);
        }
    }
}

impl<K: fmt::Display, V: fmt::Display> Node<K, V> {
    /// Encode this node and its subgraph in its scheme direction.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        crate::codec::encode(self)
    }
}

impl<K, V> PartialEq for Node<K, V>
where
    K: Clone + Eq + Hash,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.is_equivalent(other)
    }
}

impl<K, V> Eq for Node<K, V>
where
    K: Clone + Eq + Hash,
    V: PartialEq,
{
}

impl<K: Hash, V> Hash for Node<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl<K: fmt::Display, V> fmt::Display for Node<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key().fmt(f)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Node<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dependencies = self.inner.dependencies.read();
        let dependants = self.inner.dependants.read();
        f.debug_struct("Node")
            .field("id", &self.id())
            .field("key", self.key())
            .field("value", self.value())
            .field("finished", &self.is_finished())
            .field("dependencies", &dependencies.keys().collect::<Vec<_>>())
            .field("dependants", &dependants.keys().collect::<Vec<_>>())
            .finish()
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
    fn node_ids_are_unique() {
        assert_ne!(node("A").id(), node("A").id());
    }

    #[test]
    fn edges_are_symmetric() {
        let a = node("A");
        let b = node("B");
        a.add_dependency(&b).unwrap();

        assert_eq!(keys(&a.dependencies()), ["B"]);
        assert_eq!(keys(&b.dependants()), ["A"]);
        assert!(!b.has_dependencies());
        assert!(!a.has_dependants());
    }

    #[test]
    fn self_loop_is_rejected() {
        let a = node("A");
        let err = a.add_dependency(&a).unwrap_err();
        assert!(err.node().ptr_eq(&a));
        assert!(!a.has_dependencies());
    }

    #[test]
    fn key_twin_counts_as_self_loop() {
        let a = node("A");
        let twin = Node::new("A".to_string(), "other".to_string());
        assert!(a.add_dependency(&twin).is_err());
    }

    #[test]
    fn reverse_edge_is_rejected() {
        let a = node("A");
        let b = node("B");
        a.add_dependency(&b).unwrap();
        assert!(b.add_dependency(&a).is_err());
        assert!(!b.has_dependencies());
    }

    #[test]
    fn transitive_cycle_is_rejected() {
        let a = node("A");
        let b = node("B");
        let c = node("C");
        a.add_dependency(&b).unwrap();
        b.add_dependency(&c).unwrap();
        assert!(c.add_dependency(&a).is_err());
    }

    #[test]
    fn duplicate_add_is_idempotent() {
        let a = node("A");
        let b = node("B");
        a.add_dependency(&b).unwrap();
        a.add_dependency(&b).unwrap();
        assert_eq!(a.dependencies().len(), 1);
        assert_eq!(b.dependants().len(), 1);
    }

    #[test]
    fn strict_mismatch_replaces_stored_dependency() {
        let a = Node::with_equality("A".to_string(), "a".to_string(), Equality::Strict);
        let original = Node::with_equality("B".to_string(), "one".to_string(), Equality::Strict);
        let imposter = Node::with_equality("B".to_string(), "two".to_string(), Equality::Strict);

        a.add_dependency(&original).unwrap();
        a.add_dependency(&imposter).unwrap();

        assert_eq!(a.dependencies().len(), 1);
        assert!(a.dependencies()[0].ptr_eq(&imposter));
        assert!(!original.has_dependants());
        assert_eq!(keys(&imposter.dependants()), ["A"]);
    }

    #[test]
    fn strict_equality_includes_finished() {
        let a = Node::with_equality("1".to_string(), "Dep 1".to_string(), Equality::Strict);
        let b = Node::with_equality("1".to_string(), "Dep 1".to_string(), Equality::Strict);
        a.set_finished(true);
        b.set_finished(true);
        assert_eq!(a, b);
        b.set_finished(false);
        assert_ne!(a, b);
        a.set_finished(false);
        assert_eq!(a, b);
    }

    #[test]
    fn key_equality_ignores_value() {
        let a = node("One");
        let b = Node::new("One".to_string(), "Bat".to_string());
        assert_eq!(a, b);
        assert!(!a.matches(&b, Equality::Strict));
    }

    #[test]
    fn transitive_lookups() {
        let a = node("A");
        let b = node("B");
        let c = node("C");
        a.add_dependency(&b).unwrap();
        b.add_dependency(&c).unwrap();

        assert!(a.has_dependency(&c));
        assert!(c.has_dependant(&a));
        assert!(!c.has_dependency(&a));
        assert!(a.has_dependency_key(&"C".to_string()));
        assert!(c.get_dependant(&"A".to_string()).unwrap().ptr_eq(&a));
        assert!(a.get_dependency(&"Z".to_string()).is_none());
    }

    #[test]
    fn lookup_searches_every_branch() {
        let a = node("A");
        let b = node("B");
        let c = node("C");
        let d = node("D");
        a.add_dependency(&b).unwrap();
        a.add_dependency(&c).unwrap();
        c.add_dependency(&d).unwrap();

        assert!(a.get_dependency(&"D".to_string()).unwrap().ptr_eq(&d));
    }

    #[test]
    fn roots_and_leaves() {
        // a -> b -> d, a -> c
        let a = node("A");
        let b = node("B");
        let c = node("C");
        let d = node("D");
        a.add_dependency(&b).unwrap();
        a.add_dependency(&c).unwrap();
        b.add_dependency(&d).unwrap();

        assert_eq!(keys(&a.root_nodes()), ["C", "D"]);
        assert_eq!(keys(&d.leaf_nodes()), ["A"]);
        assert_eq!(keys(&d.root_nodes()), ["D"]);
        assert_eq!(keys(&a.leaf_nodes()), ["A"]);
    }

    #[test]
    fn routes_fork_at_branch_points() {
        // x -> h -> {q, r}, q -> a, r -> a
        let x = node("X");
        let h = node("H");
        let q = node("Q");
        let r = node("R");
        let a = node("A");
        let z = node("Z");
        x.add_dependency(&h).unwrap();
        x.add_dependency(&z).unwrap();
        h.add_dependency(&q).unwrap();
        h.add_dependency(&r).unwrap();
        q.add_dependency(&a).unwrap();
        r.add_dependency(&a).unwrap();

        let routes = x.routes_to_root_nodes();
        let routes: Vec<Vec<&str>> = routes.iter().map(|route| keys(route)).collect();
        assert_eq!(
            routes,
            vec![
                vec!["X", "Z"],
                vec!["X", "H", "Q", "A"],
                vec!["X", "H", "R", "A"],
            ]
        );
    }

    #[test]
    fn size_follows_scheme_and_overcounts_shared_nodes() {
        let top = node("Top");
        let left = node("Left");
        let right = node("Right");
        let shared = node("Shared");
        top.add_dependency(&left).unwrap();
        top.add_dependency(&right).unwrap();
        left.add_dependency(&shared).unwrap();
        right.add_dependency(&shared).unwrap();

        top.set_scheme(Scheme::Dependencies);
        assert_eq!(top.size(), 5);

        shared.set_scheme(Scheme::Dependants);
        assert_eq!(shared.size(), 5);
        assert_eq!(left.scheme(), Scheme::Dependencies);
    }

    #[test]
    fn set_scheme_follows_dependencies_only() {
        let a = node("A");
        let b = node("B");
        a.add_dependency(&b).unwrap();

        b.set_scheme(Scheme::Dependencies);
        assert_eq!(b.scheme(), Scheme::Dependencies);
        assert_eq!(a.scheme(), Scheme::Dependants);

        a.set_scheme(Scheme::Dependencies);
        assert_eq!(b.scheme(), Scheme::Dependencies);
    }

    #[test]
    fn remove_regrafts_children_onto_parents() {
        // top -> mid -> {p1, p2}
        let top = node("Top");
        let mid = node("Mid");
        let p1 = node("P1");
        let p2 = node("P2");
        top.add_dependency(&mid).unwrap();
        mid.add_dependency(&p1).unwrap();
        mid.add_dependency(&p2).unwrap();

        assert!(top.remove_dependency(&mid));

        assert_eq!(keys(&top.dependencies()), ["P1", "P2"]);
        assert_eq!(keys(&p1.dependants()), ["Top"]);
        assert!(!mid.has_dependencies());
        assert!(!mid.has_dependants());
    }

    #[test]
    fn remove_unknown_dependency_is_noop() {
        let a = node("A");
        let b = node("B");
        a.add_dependency(&b).unwrap();

        assert!(!a.remove_dependency(&node("Q")));
        assert!(!a.remove_dependency(&a));
        assert_eq!(a.dependencies().len(), 1);
    }

    #[test]
    fn remove_resolves_stored_instance_by_key() {
        let a = node("A");
        let b = node("B");
        a.add_dependency(&b).unwrap();

        let lookalike = node("B");
        assert!(a.remove_dependency(&lookalike));
        assert!(!a.has_dependencies());
        assert!(!b.has_dependants());
    }

    #[test]
    fn dependants_outlive_caller_handles() {
        fn build() -> Node<String, String> {
            let top = node("Top");
            let base = node("Base");
            top.add_dependency(&base).unwrap();
            base
        }

        let base = build();
        assert_eq!(keys(&base.dependants()), ["Top"]);
        assert_eq!(keys(&base.leaf_nodes()), ["Top"]);
        assert_eq!(
            base.dependant_tree_to_string(),
            "===> [Base dependants=(1)] <===\n-Top(0)\n-<< NO DEPENDANTS >>\n"
        );
    }

    #[test]
    fn teardown_releases_the_component() {
        let a = node("A");
        let b = node("B");
        let c = node("C");
        a.add_dependency(&b).unwrap();
        b.add_dependency(&c).unwrap();

        let middle = Arc::downgrade(&b.inner);
        drop(b);
        assert!(middle.upgrade().is_some());

        c.teardown();
        assert!(!a.has_dependencies());
        assert!(!c.has_dependants());
        assert!(middle.upgrade().is_none());
    }

    #[test]
    fn renders_dependency_tree() {
        let a = node("A");
        let b = node("B");
        let c = node("C");
        a.add_dependency(&b).unwrap();
        b.add_dependency(&c).unwrap();

        assert_eq!(
            a.dependency_tree_to_string(),
            "===> [A dependencies=(1)] <===\n\
             -B(1)\n\
             --C(0)\n\
             --<< NO DEPENDENCIES >>\n"
        );
        assert_eq!(
            c.dependant_tree_to_string(),
            "===> [C dependants=(1)] <===\n\
             -B(1)\n\
             --A(0)\n\
             --<< NO DEPENDANTS >>\n"
        );
    }

    #[test]
    fn renders_lone_node() {
        let a = node("A");
        assert_eq!(
            a.tree_to_string(),
            "===> [A dependants=(0)] <===\n<< NO DEPENDANTS >>\n"
        );
    }
}
