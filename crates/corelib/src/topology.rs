//! Cluster membership orchestration.
//!
//! The [`Topology`] drives joins and decommissions by broadcasting gossip in
//! two sequential phases:
//!
//! | operation      | phase 1                          | phase 2                   |
//! |----------------|----------------------------------|---------------------------|
//! | `join`         | `Bootstrapping` to existing members | `Stable` to existing members |
//! | `decommission` | `Leaving` to remaining members   | `Removed` to remaining members |
//!
//! Phase 2 starts only after every recipient has finished phase 1. A failure
//! in either phase aborts the operation without rollback.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::config::TopologyConfig;
use crate::error::{Error, Result};
use crate::gossip::{Gossip, NodeStatus};
use crate::member::Member;
use crate::network::{Peer, Transport};
use crate::node::{Node, NodeId};
use crate::ring::RingMetadata;
use crate::token::Token;
use crate::vnode::VirtualNode;

/// Membership registry for one cluster.
pub struct Topology {
    config: TopologyConfig,
    transport: Arc<dyn Transport>,
    members: BTreeMap<NodeId, Arc<Member>>,
    rng: StdRng,
}

impl Topology {
    pub fn new(config: TopologyConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            transport,
            members: BTreeMap::new(),
            rng,
        })
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    pub fn member(&self, id: NodeId) -> Option<&Arc<Member>> {
        self.members.get(&id)
    }

    /// Current members in node id order.
    pub fn members(&self) -> impl Iterator<Item = &Arc<Member>> {
        self.members.values()
    }

    pub fn is_member(&self, id: NodeId) -> bool {
        self.members.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Add `member` to the cluster.
    ///
    /// The first member gets a ring holding only its own tokens. Later
    /// members start from a snapshot of a randomly chosen member's ring; the
    /// existing members then stream the claimed ranges to them
    /// (`Bootstrapping`) and commit the ownership (`Stable`). The member is
    /// registered only after both phases succeed.
    pub fn join(&mut self, member: &Arc<Member>) -> Result<()> {
        let node = member.node().clone();
        if self.members.contains_key(&node.id) {
            return Err(Error::AlreadyMember(node.to_string()));
        }

        let tokens = self.add_tokens(&node);
        info!(%node, tokens = tokens.len(), members = self.members.len(), "node joining");

        let seed = self.members.values().choose(&mut self.rng).cloned();
        match seed {
            None => {
                let mut metadata = RingMetadata::new();
                for token in &tokens {
                    metadata.add_or_replace_token(*token, node.clone());
                }
                member.update_metadata(metadata);
            }
            Some(seed) => {
                debug!(%node, seed = %seed.node(), "copying ring metadata from seed");
                let mut metadata = seed.metadata();
                metadata.update_normal_tokens(&node, &tokens);
                member.update_metadata(metadata);

                let recipients: Vec<NodeId> = self.members.keys().copied().collect();
                let bootstrapping = Gossip::new(node.clone(), NodeStatus::Bootstrapping, tokens.clone());
                self.broadcast(&recipients, &bootstrapping)?;

                let stable = Gossip::new(node.clone(), NodeStatus::Stable, tokens);
                self.broadcast(&recipients, &stable)?;
            }
        }

        self.members.insert(node.id, member.clone());
        info!(%node, members = self.members.len(), "node joined");
        Ok(())
    }

    /// Remove `node` from the cluster. No-op if it is not a member.
    ///
    /// The remaining members pull the node's ranges (`Leaving`) and then
    /// delete its metadata (`Removed`). The departed member drops its
    /// records and ring and becomes unreachable.
    pub fn decommission(&mut self, node: &Node) -> Result<()> {
        let Some(member) = self.members.get(&node.id).cloned() else {
            debug!(%node, "decommission of non-member ignored");
            return Ok(());
        };

        let held = member.metadata().tokens_of(member.node());
        let recipients: Vec<NodeId> = self
            .members
            .keys()
            .copied()
            .filter(|id| *id != node.id)
            .collect();

        info!(node = %member.node(), tokens = held.len(), remaining = recipients.len(), "node leaving");
        if recipients.is_empty() {
            warn!(node = %member.node(), "decommissioning the last member; its records are dropped");
        }

        let leaving = Gossip::new(member.node().clone(), NodeStatus::Leaving, held.clone());
        self.broadcast(&recipients, &leaving)?;

        let removed = Gossip::new(member.node().clone(), NodeStatus::Removed, held);
        self.broadcast(&recipients, &removed)?;

        self.members.remove(&node.id);
        self.transport.deregister(node.id);
        member.retire();
        info!(node = %member.node(), members = self.members.len(), "node removed");
        Ok(())
    }

    /// Tokens for `node`: one per virtual index, duplicates dropped.
    fn add_tokens(&self, node: &Node) -> Vec<Token> {
        let mut seen = HashSet::with_capacity(self.config.virtual_nodes as usize);
        (0..self.config.virtual_nodes)
            .map(|index| VirtualNode::from_index(node.id, index).token())
            .filter(|token| seen.insert(token.partition))
            .collect()
    }

    /// Deliver `gossip` to every recipient and wait for all of them.
    fn broadcast(&self, recipients: &[NodeId], gossip: &Gossip) -> Result<()> {
        let peers = recipients
            .iter()
            .map(|id| self.transport.connect(*id))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(
            origin = %gossip.origin,
            status = %gossip.status,
            recipients = peers.len(),
            parallel = self.config.parallel_gossip,
            "broadcasting gossip"
        );

        if !self.config.parallel_gossip || peers.len() < 2 {
            for peer in &peers {
                peer.merge_gossip(gossip)?;
            }
            return Ok(());
        }

        let outcomes = crossbeam::thread::scope(|scope| {
            let handles: Vec<_> = peers
                .iter()
                .map(|peer| scope.spawn(move |_| peer.merge_gossip(gossip)))
                .collect();
            handles.into_iter().map(|handle| handle.join()).collect::<Vec<_>>()
        })
        .map_err(|_| Error::Internal("gossip scope panicked".to_string()))?;

        for outcome in outcomes {
            outcome.map_err(|_| Error::Internal("gossip worker panicked".to_string()))??;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topology")
            .field("config", &self.config)
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::LocalTransport;

    fn topology(vnodes: u32) -> (Topology, Arc<LocalTransport>) {
        let transport = Arc::new(LocalTransport::new());
        let config = TopologyConfig::new(vnodes).with_seed(11);
        (Topology::new(config, transport.clone()).unwrap(), transport)
    }

    #[test]
    fn test_first_join_initialises_ring() {
        let (mut topology, transport) = topology(16);
        let m = Member::new(Node::named("node-1"), transport);
        topology.join(&m).unwrap();

        let metadata = m.metadata();
        assert_eq!(metadata.len(), 16);
        assert_eq!(metadata.tokens_of(m.node()).len(), 16);
        metadata.validate().unwrap();
        assert!(topology.is_member(m.id()));
    }

    #[test]
    fn test_join_twice_is_rejected() {
        let (mut topology, transport) = topology(4);
        let m = Member::new(Node::named("node-1"), transport);
        topology.join(&m).unwrap();
        assert!(matches!(topology.join(&m), Err(Error::AlreadyMember(_))));
        assert_eq!(topology.len(), 1);
    }

    #[test]
    fn test_decommission_non_member_is_noop() {
        let (mut topology, transport) = topology(4);
        let m = Member::new(Node::named("node-1"), transport);
        topology.join(&m).unwrap();

        topology.decommission(&Node::named("stranger")).unwrap();
        assert_eq!(topology.len(), 1);
    }

    #[test]
    fn test_tokens_are_deterministic_per_node() {
        let (topology, _) = topology(64);
        let node = Node::named("node-1");
        assert_eq!(topology.add_tokens(&node), topology.add_tokens(&node));
        assert_eq!(topology.add_tokens(&node).len(), 64);
    }

    #[test]
    fn test_members_share_one_view_after_joins() {
        let (mut topology, transport) = topology(32);
        let members: Vec<_> = (1..=4)
            .map(|i| Member::new(Node::named(format!("node-{i}")), transport.clone()))
            .collect();
        for m in &members {
            topology.join(m).unwrap();
        }

        let reference = members[0].metadata();
        assert_eq!(reference.len(), 128);
        for m in &members {
            let metadata = m.metadata();
            metadata.validate().unwrap();
            assert_eq!(metadata.ring(), reference.ring());
            assert_eq!(metadata.node_to_tokens(), reference.node_to_tokens());
        }
    }
}
