//! Core library for the ring placement layer.
//!
//! This crate provides the membership and data-placement core of a
//! partitioned key-value cluster:
//! - Hashing for node identity and ring placement
//! - Tokens and virtual nodes
//! - Ring metadata with clockwise ownership lookup
//! - Per-member record storage and data access
//! - Gossip-driven join and decommission with range hand-off

pub mod access;
pub mod config;
pub mod error;
pub mod gossip;
pub mod member;
pub mod network;
pub mod node;
pub mod partitioner;
pub mod ring;
pub mod storage;
pub mod token;
pub mod topology;
pub mod vnode;

pub use access::{Access, Method, Reply};
pub use config::TopologyConfig;
pub use error::{AccessError, Error, MigrationError, Result, TransportError};
pub use gossip::{Gossip, NodeStatus};
pub use member::Member;
pub use network::{LocalTransport, Peer, Transport};
pub use node::{Node, NodeId};
pub use partitioner::{derive_node_id, ring_hash};
pub use ring::{RingMetadata, TokenRange};
pub use storage::{Record, RecordStore};
pub use token::{HashAlgorithm, Token};
pub use topology::Topology;
pub use vnode::VirtualNode;
