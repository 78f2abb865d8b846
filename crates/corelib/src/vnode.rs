//! Virtual node abstractions.
//!
//! # Virtual Nodes (VNodes) Concept
//!
//! Instead of each physical node having a single token on the ring, each node
//! owns many tokens (virtual nodes). This provides:
//!
//! 1. **Better Load Distribution**: more tokens give a smoother share of keys
//! 2. **Gradual Rebalancing**: a join or leave moves roughly `1/N` of the keys
//! 3. **Spread Hand-off**: a departing node's ranges land on many peers
//!
//! # Token Derivation
//!
//! The token for virtual index `i` of node `id` is
//! `ring_hash(xxh3_64(be(id) || be(i)))`. Hashing the pair with xxh3 first
//! keeps every `(id, i)` combination distinct before it is folded onto the
//! 32-bit ring with the same `ring_hash` used for record keys.

use xxhash_rust::xxh3::xxh3_64;

use crate::node::NodeId;
use crate::partitioner::ring_hash;
use crate::token::{HashAlgorithm, Token};

/// A virtual node on the hash ring.
///
/// Represents a single token position owned by a physical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualNode {
    /// Token position on the ring.
    pub token: Token,
    /// The physical node that owns this virtual node.
    pub node_id: NodeId,
}

impl VirtualNode {
    #[inline]
    pub fn new(token: Token, node_id: NodeId) -> Self {
        Self { token, node_id }
    }

    /// Create the virtual node for `vnode_index` of `node_id`.
    pub fn from_index(node_id: NodeId, vnode_index: u32) -> Self {
        let mut key = [0u8; 12];
        key[..8].copy_from_slice(&node_id.0.to_be_bytes());
        key[8..].copy_from_slice(&vnode_index.to_be_bytes());

        let seed = xxh3_64(&key) as i64;
        let token = Token::new(ring_hash(seed), HashAlgorithm::Murmur3);

        Self::new(token, node_id)
    }

    #[inline]
    pub fn token(&self) -> Token {
        self.token
    }

    #[inline]
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }
}

impl std::fmt::Display for VirtualNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VNode(token={}, node={})", self.token, self.node_id)
    }
}
