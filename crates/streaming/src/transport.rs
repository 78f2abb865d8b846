//! A transport whose peers talk through the wire codec.
//!
//! [`WireTransport`] keeps the in-process routing of
//! [`LocalTransport`] but hands out [`WirePeer`] handles. Each call on a
//! handle is framed, decoded on the remote side, dispatched, and the
//! response travels back the same way, so every byte members exchange
//! during hand-off goes through [`codec`](crate::codec).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use corelib::{
    Access, AccessError, Gossip, LocalTransport, MigrationError, Node, NodeId, Peer, Reply,
    Transport, TransportError,
};
use tracing::{trace, warn};

use crate::codec;
use crate::error::{Result, StreamingError};
use crate::protocol::{dispatch, AccessRequest, Message};

#[derive(Debug, Default)]
struct WireStats {
    frames: AtomicU64,
    bytes: AtomicU64,
}

#[derive(Default)]
pub struct WireTransport {
    routes: LocalTransport,
    stats: Arc<WireStats>,
}

impl WireTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames sent in either direction so far.
    pub fn frames_exchanged(&self) -> u64 {
        self.stats.frames.load(Ordering::Relaxed)
    }

    /// Bytes sent in either direction so far, headers included.
    pub fn bytes_exchanged(&self) -> u64 {
        self.stats.bytes.load(Ordering::Relaxed)
    }
}

impl Transport for WireTransport {
    fn register(&self, peer: Arc<dyn Peer>) {
        self.routes.register(peer);
    }

    fn deregister(&self, id: NodeId) {
        self.routes.deregister(id);
    }

    fn connect(&self, id: NodeId) -> std::result::Result<Arc<dyn Peer>, TransportError> {
        let remote = self.routes.connect(id)?;
        Ok(Arc::new(WirePeer {
            node: remote.node().clone(),
            remote,
            stats: self.stats.clone(),
        }))
    }
}

/// Handle to a remote member that serializes every call.
pub struct WirePeer {
    node: Node,
    remote: Arc<dyn Peer>,
    stats: Arc<WireStats>,
}

impl WirePeer {
    /// Send `request` and wait for the response frame.
    pub fn call(&self, request: &Message) -> Result<Message> {
        let inbound = self.transmit(request)?;
        let response = dispatch(self.remote.as_ref(), inbound)?;
        self.transmit(&response)
    }

    fn transmit(&self, message: &Message) -> Result<Message> {
        let mut frame = codec::encode(message)?;
        self.stats.frames.fetch_add(1, Ordering::Relaxed);
        self.stats.bytes.fetch_add(frame.len() as u64, Ordering::Relaxed);
        trace!(node = %self.node, kind = %message.message_type(), len = frame.len(), "frame");

        codec::decode(&mut frame)?.ok_or(StreamingError::Incomplete)
    }
}

impl Peer for WirePeer {
    fn node(&self) -> &Node {
        &self.node
    }

    fn process(&self, access: Access) -> std::result::Result<Reply, AccessError> {
        let request = Message::Request(AccessRequest::from(&access));
        match self.call(&request) {
            Ok(Message::Reply(outcome)) => outcome,
            Ok(other) => Err(AccessError::Unavailable(
                StreamingError::UnexpectedMessage(other.message_type()).to_string(),
            )),
            Err(err) => {
                warn!(node = %self.node, error = %err, "access call failed");
                Err(AccessError::Unavailable(err.to_string()))
            }
        }
    }

    fn merge_gossip(&self, gossip: &Gossip) -> std::result::Result<(), MigrationError> {
        let request = Message::Gossip(gossip.clone());
        match self.call(&request) {
            Ok(Message::GossipAck(outcome)) => outcome,
            Ok(other) => Err(MigrationError::UnexpectedReply(other.message_type().to_string())),
            Err(err) => {
                warn!(node = %self.node, error = %err, "gossip call failed");
                Err(MigrationError::Transport(err.to_string()))
            }
        }
    }
}
