//! Error types for the core library.

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by membership operations on the [`Topology`](crate::Topology).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A hand-off failed while a gossip message was being merged.
    ///
    /// The enclosing join or decommission is aborted and nothing is rolled
    /// back, so the cluster may need manual remediation.
    #[error("data migration failed: {0}")]
    Migration(#[from] MigrationError),
    /// A member could not be reached through the transport.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The node id is already registered in the topology.
    #[error("node {0} is already a member")]
    AlreadyMember(String),
    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Ring metadata invariant does not hold
    #[error("ring operation failed: {0}")]
    RingOperation(String),
    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors returned by a local data operation (`Peer::process`).
///
/// An absent key is not an error; see [`Reply::Value`](crate::Reply::Value).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum AccessError {
    /// The request names an operation kind the node does not recognize.
    #[error("unknown access method: {0}")]
    InvalidOperation(String),
    /// The request is missing a field its method requires.
    #[error("malformed {method} request: missing {field}")]
    MalformedRequest { method: String, field: String },
    /// The peer could not serve the request.
    #[error("peer unavailable: {0}")]
    Unavailable(String),
}

/// Errors that abort a gossip merge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum MigrationError {
    #[error("error while scanning node {node}: {source}")]
    ScanFailed { node: String, source: AccessError },
    #[error("error while writing to node {node}: {source}")]
    WriteFailed { node: String, source: AccessError },
    #[error("node {0} is unreachable")]
    Unreachable(String),
    #[error("unexpected reply to {0}")]
    UnexpectedReply(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Errors raised when resolving a peer handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("no route to node {0}")]
    NoRoute(NodeId),
}

impl From<TransportError> for MigrationError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::NoRoute(id) => MigrationError::Unreachable(id.to_string()),
        }
    }
}
