//! Node identity for the consistent hash ring.
//!
//! A [`Node`] is the identity of a cluster member as it appears in ring
//! metadata and gossip. It is identified by a compact `NodeId` that is cheap
//! to compare and hash; two `Node` values with the same id denote the same
//! member regardless of how they were built.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::partitioner;

/// Compact identifier for a node in the cluster.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(pub i64);

impl NodeId {
    /// Derive a stable id from a human-readable name.
    ///
    /// No uniqueness check is made; callers must use distinct names per
    /// physical node.
    pub fn from_name(name: &str) -> Self {
        NodeId(partitioner::derive_node_id(name))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0 as u64)
    }
}

/// Logical node participating in the ring.
///
/// Keep this struct small and cheap to clone; the record store and ring
/// snapshot live on [`Member`](crate::Member).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Human-readable name or hostname.
    pub name: String,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Construct a node whose id is derived from its name.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: NodeId::from_name(&name),
            name,
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_node_is_deterministic() {
        let a = Node::named("node-1");
        let b = Node::named("node-1");
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, Node::named("node-2").id);
    }

    #[test]
    fn test_identity_ignores_name() {
        let a = Node::new(NodeId(7), "alpha");
        let b = Node::new(NodeId(7), "renamed");
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId(1).to_string(), "0000000000000001");
        assert_eq!(NodeId(-1).to_string(), "ffffffffffffffff");
    }
}
