//! Membership-change messages exchanged between members.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::token::Token;

/// Lifecycle phase announced by a gossip message.
///
/// A member moves `Bootstrapping -> Stable -> Leaving -> Removed`;
/// `Removed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeStatus {
    /// The origin is claiming `tokens`; receivers stream the claimed ranges to it.
    Bootstrapping,
    /// The origin's ownership of `tokens` is committed.
    Stable,
    /// The origin gives up `tokens`; receivers stream its ranges to the new owners.
    Leaving,
    /// The origin's metadata is deleted.
    Removed,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeStatus::Bootstrapping => "BOOTSTRAPPING",
            NodeStatus::Stable => "STABLE",
            NodeStatus::Leaving => "LEAVING",
            NodeStatus::Removed => "REMOVED",
        };
        f.write_str(name)
    }
}

/// A membership change for `origin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gossip {
    pub origin: Node,
    pub status: NodeStatus,
    pub tokens: Vec<Token>,
}

impl Gossip {
    pub fn new(origin: Node, status: NodeStatus, tokens: Vec<Token>) -> Self {
        Self {
            origin,
            status,
            tokens,
        }
    }

    /// The message's tokens in ascending partition order, the order in which
    /// receivers process them.
    pub fn sorted_tokens(&self) -> Vec<Token> {
        let mut tokens = self.tokens.clone();
        tokens.sort();
        tokens
    }
}
