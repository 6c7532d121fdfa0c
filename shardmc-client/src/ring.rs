//! # Consistent Hash Ring
//!
//! Purpose: Map any key to one of N shard handles deterministically, with
//! minimal remapping when membership changes.
//!
//! ## Design Principles
//! 1. **Virtual Replicas**: Every node contributes 100 synthetic points to
//!    smooth load across the ring.
//! 2. **Read-Optimized**: The sorted key array is rebuilt once per
//!    mutation; lookups are an allocation-free binary search.
//! 3. **All-Or-Nothing Removal**: A node's points are validated before any
//!    is touched, so a failed removal leaves the ring intact.
//!
//! Ring positions are signed 32-bit values ordered as such; replica `i`
//! of a node sits at `hash(anchor_string + i)` where the anchor string is
//! the decimal form of the node identity's own hash. Both details are
//! load-bearing for placement compatibility with existing deployments.

use std::collections::BTreeMap;

use crate::hash::hash_str;

/// Replica points contributed by each node.
pub const REPLICAS: usize = 100;

/// A node that can be placed on the ring.
///
/// Identity must be stable for the node's lifetime; for shard handles it
/// is the endpoint's string form, so the same endpoint always lands on
/// the same ring positions.
pub trait RingNode {
    fn ring_identity(&self) -> String;
}

impl RingNode for String {
    fn ring_identity(&self) -> String {
        self.clone()
    }
}

/// Sorted mapping from ring position to node.
///
/// Replica collisions between nodes resolve by overwrite (later insertion
/// wins); at 100 replicas per node this is an accepted edge case.
#[derive(Debug)]
pub struct ConsistentHashRing<N> {
    points: BTreeMap<i32, N>,
    /// Sorted cache of `points` keys, rebuilt after each mutation.
    keys: Vec<i32>,
}

impl<N: RingNode + Clone> ConsistentHashRing<N> {
    /// Creates an empty ring.
    pub fn new() -> Self {
        ConsistentHashRing {
            points: BTreeMap::new(),
            keys: Vec::new(),
        }
    }

    /// Creates a ring pre-populated with the given nodes.
    pub fn with_nodes(nodes: impl IntoIterator<Item = N>) -> Self {
        let mut ring = Self::new();
        for node in nodes {
            ring.insert_points(&node);
        }
        ring.rebuild_keys();
        ring
    }

    /// Inserts a node's replica points and refreshes the lookup array.
    pub fn add(&mut self, node: N) {
        self.insert_points(&node);
        self.rebuild_keys();
    }

    /// Removes a node's replica points.
    ///
    /// Returns `false` without mutating anything when any of the node's
    /// points is missing from the ring.
    pub fn remove(&mut self, node: &N) -> bool {
        let hashes: Vec<i32> = Self::replica_points(node).collect();
        if hashes.iter().any(|hash| !self.points.contains_key(hash)) {
            return false;
        }
        for hash in hashes {
            self.points.remove(&hash);
        }
        self.rebuild_keys();
        true
    }

    /// Resolves a key to its owning node, `None` on an empty ring.
    ///
    /// The owner is the node at the smallest ring position >= the key's
    /// hash, wrapping to the first position past either end.
    pub fn resolve(&self, key: &str) -> Option<&N> {
        if self.keys.is_empty() {
            return None;
        }
        let hash = hash_str(key) as i32;
        let index = match self.keys.binary_search(&hash) {
            Ok(found) => found,
            Err(insertion) if insertion == self.keys.len() => 0,
            Err(insertion) => insertion,
        };
        self.points.get(&self.keys[index])
    }

    /// Number of replica points currently on the ring.
    pub fn point_count(&self) -> usize {
        self.keys.len()
    }

    /// True when no nodes have been added.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn insert_points(&mut self, node: &N) {
        for hash in Self::replica_points(node) {
            self.points.insert(hash, node.clone());
        }
    }

    fn replica_points(node: &N) -> impl Iterator<Item = i32> {
        let anchor = hash_str(&node.ring_identity()) as i32;
        (0..REPLICAS).map(move |replica| hash_str(&format!("{anchor}{replica}")) as i32)
    }

    fn rebuild_keys(&mut self) {
        // BTreeMap iterates in (signed) key order, so this stays sorted.
        self.keys = self.points.keys().copied().collect();
    }
}

impl<N: RingNode + Clone> Default for ConsistentHashRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
