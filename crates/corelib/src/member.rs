//! Cluster members: a record store, a ring snapshot, and the gossip merge.
//!
//! # Hand-off
//!
//! Ownership changes move one arc of the ring at a time. For a token `T`
//! the arc is `(predecessor(T), T]`:
//!
//! - **Bootstrapping**: before `T` is inserted, the arc belongs to the owner
//!   of `successor(T)`. Its records are scanned there and written to the
//!   joining member, then `T` is bound to the joining member.
//! - **Leaving**: once `T` is taken off the ring, the arc belongs to the new
//!   `successor(T)`. The leaving member's records on the arc are scanned and
//!   written to that owner.
//!
//! Tokens are processed in ascending partition order and the ring is
//! updated after each one, so later tokens see the arcs earlier ones have
//! already claimed or released. Work is skipped when the resolved owner is
//! the gossip's origin itself.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::access::{Access, Reply};
use crate::error::{AccessError, MigrationError};
use crate::gossip::{Gossip, NodeStatus};
use crate::network::{Peer, Transport};
use crate::node::{Node, NodeId};
use crate::partitioner::ring_hash;
use crate::ring::{RingMetadata, TokenRange};
use crate::storage::{Record, RecordStore};

/// A cluster member.
pub struct Member {
    node: Node,
    store: RwLock<RecordStore>,
    metadata: RwLock<RingMetadata>,
    transport: Arc<dyn Transport>,
}

impl Member {
    /// Create a member and register it with `transport`.
    pub fn new(node: Node, transport: Arc<dyn Transport>) -> Arc<Self> {
        let member = Arc::new(Self {
            node,
            store: RwLock::new(RecordStore::new()),
            metadata: RwLock::new(RingMetadata::new()),
            transport,
        });
        member.transport.register(member.clone());
        member
    }

    pub fn id(&self) -> NodeId {
        self.node.id
    }

    /// Snapshot of this member's ring metadata.
    pub fn metadata(&self) -> RingMetadata {
        self.metadata.read().clone()
    }

    /// Replace this member's ring metadata.
    pub fn update_metadata(&self, metadata: RingMetadata) {
        *self.metadata.write() = metadata;
    }

    /// The node that owns `key` according to this member's ring.
    pub fn owner_of(&self, key: i64) -> Option<Node> {
        self.metadata.read().resolve_owner(ring_hash(key)).cloned()
    }

    /// Number of records held locally.
    pub fn record_count(&self) -> usize {
        self.store.read().len()
    }

    /// Drop local records and ring metadata once the member has left.
    pub(crate) fn retire(&self) {
        self.store.write().clear();
        *self.metadata.write() = RingMetadata::new();
    }

    fn bootstrap(&self, ring: &mut RingMetadata, gossip: &Gossip) -> Result<(), MigrationError> {
        let joining = self.transport.connect(gossip.origin.id)?;
        let mut streamed = 0;

        for token in gossip.sorted_tokens() {
            let source = ring.resolve_owner(token.partition).cloned();
            let start = ring.predecessor(token.partition).map(|t| t.partition);

            if let (Some(source), Some(start)) = (source, start) {
                if source != gossip.origin {
                    let range = TokenRange::new(start, token.partition);
                    let from = self.transport.connect(source.id)?;
                    streamed += hand_off(from.as_ref(), joining.as_ref(), range)?;
                }
            }

            ring.add_or_replace_token(token, gossip.origin.clone());
        }

        debug!(
            node = %self.node,
            joining = %gossip.origin,
            tokens = gossip.tokens.len(),
            streamed,
            "merged bootstrap gossip"
        );
        Ok(())
    }

    fn leave(&self, ring: &mut RingMetadata, gossip: &Gossip) -> Result<(), MigrationError> {
        let leaving = self.transport.connect(gossip.origin.id)?;
        let mut streamed = 0;

        for token in gossip.sorted_tokens() {
            if ring.owner_of_token(&token) != Some(&gossip.origin) {
                continue;
            }
            ring.unlink_token(&token);

            let target = ring.resolve_owner(token.partition).cloned();
            let start = ring.predecessor(token.partition).map(|t| t.partition);

            if let (Some(target), Some(start)) = (target, start) {
                if target != gossip.origin {
                    let range = TokenRange::new(start, token.partition);
                    let to = self.transport.connect(target.id)?;
                    streamed += hand_off(leaving.as_ref(), to.as_ref(), range)?;
                }
            }
        }

        debug!(
            node = %self.node,
            leaving = %gossip.origin,
            tokens = gossip.tokens.len(),
            streamed,
            "merged leave gossip"
        );
        Ok(())
    }
}

/// Copy the records `from` holds on `range` into `to`.
fn hand_off(from: &dyn Peer, to: &dyn Peer, range: TokenRange) -> Result<usize, MigrationError> {
    let entries = from
        .process(range.to_scan())
        .map_err(|source| MigrationError::ScanFailed {
            node: from.node().name.clone(),
            source,
        })?
        .into_entries()?;

    let count = entries.len();
    for (_, record) in entries {
        to.process(Access::Put {
            key: record.key,
            value: record.value,
        })
        .map_err(|source| MigrationError::WriteFailed {
            node: to.node().name.clone(),
            source,
        })?;
    }

    if count > 0 {
        trace!(from = %from.node(), to = %to.node(), %range, count, "handed off range");
    }
    Ok(count)
}

impl Peer for Member {
    fn node(&self) -> &Node {
        &self.node
    }

    fn process(&self, access: Access) -> Result<Reply, AccessError> {
        trace!(node = %self.node, method = %access.method(), "process");

        let reply = match access {
            Access::Put { key, value } => {
                self.store.write().write(ring_hash(key), Record::new(key, value));
                Reply::Done
            }
            Access::Get { key } => Reply::Value(self.store.read().read(ring_hash(key)).cloned()),
            Access::Delete { key } => {
                self.store.write().delete(ring_hash(key));
                Reply::Done
            }
            Access::Scan {
                from_partition,
                to_partition,
            } => Reply::Entries(self.store.read().scan(from_partition, to_partition)),
        };
        Ok(reply)
    }

    fn merge_gossip(&self, gossip: &Gossip) -> Result<(), MigrationError> {
        let mut ring = self.metadata.write();

        match gossip.status {
            NodeStatus::Bootstrapping => self.bootstrap(&mut ring, gossip),
            NodeStatus::Stable => {
                ring.update_normal_tokens(&gossip.origin, &gossip.tokens);
                debug!(node = %self.node, origin = %gossip.origin, "committed tokens");
                Ok(())
            }
            NodeStatus::Leaving => self.leave(&mut ring, gossip),
            NodeStatus::Removed => {
                ring.remove_all_tokens_of(&gossip.origin);
                debug!(node = %self.node, origin = %gossip.origin, "removed node metadata");
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Member")
            .field("node", &self.node)
            .field("records", &self.record_count())
            .field("tokens", &self.metadata.read().len())
            .finish()
    }
}
