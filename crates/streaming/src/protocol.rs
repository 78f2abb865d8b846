//! Messages exchanged between members.
//!
//! Every exchange is one request frame followed by one response frame:
//!
//! | request             | response                                   |
//! |---------------------|--------------------------------------------|
//! | `Request`           | `Reply` carrying the access outcome        |
//! | `Gossip`            | `GossipAck` carrying the merge outcome     |

use std::fmt;

use corelib::{Access, AccessError, Gossip, MigrationError, Method, Peer, Reply};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, StreamingError};

/// Message discriminant, used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Request,
    Reply,
    Gossip,
    GossipAck,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageType::Request => "request",
            MessageType::Reply => "reply",
            MessageType::Gossip => "gossip",
            MessageType::GossipAck => "gossip-ack",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    Request(AccessRequest),
    Reply(std::result::Result<Reply, AccessError>),
    Gossip(Gossip),
    GossipAck(std::result::Result<(), MigrationError>),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Request(_) => MessageType::Request,
            Message::Reply(_) => MessageType::Reply,
            Message::Gossip(_) => MessageType::Gossip,
            Message::GossipAck(_) => MessageType::GossipAck,
        }
    }
}

/// An access request as it travels on the wire.
///
/// The method is carried by name and each method reads only the fields it
/// needs, so a peer can reject unknown methods and missing fields itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    pub method: String,
    pub key: Option<i64>,
    pub value: Option<String>,
    pub from_partition: Option<i32>,
    pub to_partition: Option<i32>,
}

impl AccessRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }
}

impl From<&Access> for AccessRequest {
    fn from(access: &Access) -> Self {
        let mut request = AccessRequest::new(access.method().as_str());
        match access {
            Access::Put { key, value } => {
                request.key = Some(*key);
                request.value = Some(value.clone());
            }
            Access::Get { key } | Access::Delete { key } => request.key = Some(*key),
            Access::Scan {
                from_partition,
                to_partition,
            } => {
                request.from_partition = Some(*from_partition);
                request.to_partition = Some(*to_partition);
            }
        }
        request
    }
}

impl TryFrom<AccessRequest> for Access {
    type Error = AccessError;

    fn try_from(request: AccessRequest) -> std::result::Result<Self, Self::Error> {
        let method: Method = request.method.parse()?;
        let missing = |field: &str| AccessError::MalformedRequest {
            method: method.to_string(),
            field: field.to_string(),
        };

        let access = match method {
            Method::Put => Access::Put {
                key: request.key.ok_or_else(|| missing("key"))?,
                value: request.value.ok_or_else(|| missing("value"))?,
            },
            Method::Get => Access::Get {
                key: request.key.ok_or_else(|| missing("key"))?,
            },
            Method::Delete => Access::Delete {
                key: request.key.ok_or_else(|| missing("key"))?,
            },
            Method::Scan => Access::Scan {
                from_partition: request.from_partition.ok_or_else(|| missing("from_partition"))?,
                to_partition: request.to_partition.ok_or_else(|| missing("to_partition"))?,
            },
        };
        Ok(access)
    }
}

/// Serve one inbound message on `peer` and build the response.
///
/// Access and merge failures travel back inside the response; only a
/// message that is not a request is an error here.
pub fn dispatch(peer: &dyn Peer, message: Message) -> Result<Message> {
    trace!(node = %peer.node(), kind = %message.message_type(), "dispatch");

    match message {
        Message::Request(request) => {
            let outcome = Access::try_from(request).and_then(|access| peer.process(access));
            Ok(Message::Reply(outcome))
        }
        Message::Gossip(gossip) => Ok(Message::GossipAck(peer.merge_gossip(&gossip))),
        other => Err(StreamingError::UnexpectedMessage(other.message_type())),
    }
}
