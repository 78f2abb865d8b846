//! Core networking abstractions shared across the workspace.
//!
//! Members never call each other directly. They resolve a [`Peer`] handle
//! through a [`Transport`], so the ring algorithm is the same whether peers
//! live in-process ([`LocalTransport`]) or behind a wire codec.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tracing::{trace, warn};

use crate::access::{Access, Reply};
use crate::error::{AccessError, MigrationError, TransportError};
use crate::gossip::Gossip;
use crate::node::{Node, NodeId};

/// The operations one member can invoke on another.
pub trait Peer: Send + Sync {
    /// Identity of the member behind this handle.
    fn node(&self) -> &Node;

    /// Serve a local data operation.
    fn process(&self, access: Access) -> Result<Reply, AccessError>;

    /// Apply a membership change, migrating data as required.
    fn merge_gossip(&self, gossip: &Gossip) -> Result<(), MigrationError>;
}

/// Resolves node ids to peer handles.
pub trait Transport: Send + Sync {
    /// Make `peer` reachable under its node id.
    fn register(&self, peer: Arc<dyn Peer>);

    /// Forget the route to `id`.
    fn deregister(&self, id: NodeId);

    fn connect(&self, id: NodeId) -> Result<Arc<dyn Peer>, TransportError>;
}

/// In-process transport: a registry of peers in the same address space.
///
/// Routes are weak so that members, which hold the transport, and the
/// transport, which routes to members, do not keep each other alive.
#[derive(Default)]
pub struct LocalTransport {
    routes: DashMap<NodeId, Weak<dyn Peer>>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered routes, including ones whose peer was dropped.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}

impl Transport for LocalTransport {
    fn register(&self, peer: Arc<dyn Peer>) {
        let id = peer.node().id;
        trace!(node = %peer.node(), "registering route");
        self.routes.insert(id, Arc::downgrade(&peer));
    }

    fn deregister(&self, id: NodeId) {
        self.routes.remove(&id);
    }

    fn connect(&self, id: NodeId) -> Result<Arc<dyn Peer>, TransportError> {
        let route = self
            .routes
            .get(&id)
            .map(|entry| entry.value().upgrade())
            .ok_or(TransportError::NoRoute(id))?;

        match route {
            Some(peer) => Ok(peer),
            None => {
                warn!(node = %id, "dropping route to released peer");
                self.routes.remove(&id);
                Err(TransportError::NoRoute(id))
            }
        }
    }
}
