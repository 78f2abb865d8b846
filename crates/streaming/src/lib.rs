//! Wire protocol for member-to-member traffic.
//!
//! This crate provides the messages and codec members exchange:
//! - Data access requests and their replies
//! - Gossip messages and their acknowledgements
//! - A transport that routes every call through the codec

pub mod codec;
pub mod error;
pub mod protocol;
pub mod transport;

pub use codec::{decode, encode, MAX_FRAME_LEN};
pub use error::StreamingError;
pub use protocol::{dispatch, AccessRequest, Message, MessageType};
pub use transport::{WirePeer, WireTransport};
