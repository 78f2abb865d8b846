//! Ring placement state.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{Error, Result};
use crate::node::Node;
use crate::token::Token;

/// The cluster's placement state as seen by one member.
///
/// Three structures are kept in step:
/// - `ring`: partition -> token, ordered; this is the consistent-hashing ring
/// - `token_to_node`: token -> owning node
/// - `node_to_tokens`: node -> tokens it owns
///
/// Every mutator updates all three before returning. Cloning produces an
/// independent snapshot; the accessors returning whole maps also clone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RingMetadata {
    ring: BTreeMap<i32, Token>,
    token_to_node: HashMap<Token, Node>,
    node_to_tokens: HashMap<Node, Vec<Token>>,
}

impl RingMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node owning `partition`: the owner of the first token at or after it,
    /// wrapping to the smallest token. `None` on an empty ring.
    pub fn resolve_owner(&self, partition: i32) -> Option<&Node> {
        let token = self.successor(partition)?;
        self.token_to_node.get(token)
    }

    /// First token with partition `>= partition`, wrapping around.
    pub fn successor(&self, partition: i32) -> Option<&Token> {
        self.ring
            .range(partition..)
            .next()
            .or_else(|| self.ring.iter().next())
            .map(|(_, token)| token)
    }

    /// Last token with partition `< partition`, wrapping around.
    pub fn predecessor(&self, partition: i32) -> Option<&Token> {
        self.ring
            .range(..partition)
            .next_back()
            .or_else(|| self.ring.iter().next_back())
            .map(|(_, token)| token)
    }

    /// Bind `token` to `node`, replacing whatever held that partition.
    pub fn add_or_replace_token(&mut self, token: Token, node: Node) {
        if let Some(previous) = self.token_to_node.get(&token) {
            if *previous != node {
                let previous = previous.clone();
                self.detach(&previous, &token);
            }
        }

        self.ring.insert(token.partition, token);
        self.token_to_node.insert(token, node.clone());

        let owned = self.node_to_tokens.entry(node).or_default();
        match owned.iter_mut().find(|t| **t == token) {
            Some(existing) => *existing = token,
            None => owned.push(token),
        }
    }

    /// Commit `tokens` as the complete token set of `node`.
    ///
    /// Tokens the node held before and does not hold now leave the ring.
    pub fn update_normal_tokens(&mut self, node: &Node, tokens: &[Token]) {
        let keep: HashSet<Token> = tokens.iter().copied().collect();
        let stale: Vec<Token> = self
            .node_to_tokens
            .get(node)
            .map(|owned| owned.iter().filter(|t| !keep.contains(t)).copied().collect())
            .unwrap_or_default();

        for token in &stale {
            if self.token_to_node.get(token) == Some(node) {
                self.ring.remove(&token.partition);
                self.token_to_node.remove(token);
            }
        }

        for token in tokens {
            if let Some(previous) = self.token_to_node.get(token) {
                if previous != node {
                    let previous = previous.clone();
                    self.detach(&previous, token);
                }
            }
            self.ring.insert(token.partition, *token);
            self.token_to_node.insert(*token, node.clone());
        }

        let mut owned = Vec::with_capacity(keep.len());
        let mut seen = HashSet::with_capacity(keep.len());
        for token in tokens {
            if seen.insert(*token) {
                owned.push(*token);
            }
        }
        self.node_to_tokens.insert(node.clone(), owned);
    }

    /// Drop every token of `node` and its entry. No-op for an unknown node.
    pub fn remove_all_tokens_of(&mut self, node: &Node) {
        let Some(tokens) = self.node_to_tokens.remove(node) else {
            return;
        };

        for token in tokens {
            if self.token_to_node.get(&token) == Some(node) {
                self.ring.remove(&token.partition);
                self.token_to_node.remove(&token);
            }
        }
    }

    /// Take `token` off the ring and out of `token_to_node`, leaving the
    /// owner's `node_to_tokens` entry for a later
    /// [`remove_all_tokens_of`](Self::remove_all_tokens_of).
    pub(crate) fn unlink_token(&mut self, token: &Token) {
        self.ring.remove(&token.partition);
        self.token_to_node.remove(token);
    }

    fn detach(&mut self, owner: &Node, token: &Token) {
        if let Some(owned) = self.node_to_tokens.get_mut(owner) {
            owned.retain(|t| t != token);
            if owned.is_empty() {
                self.node_to_tokens.remove(owner);
            }
        }
    }

    /// Node that owns exactly this token, if any.
    pub fn owner_of_token(&self, token: &Token) -> Option<&Node> {
        self.token_to_node.get(token)
    }

    /// Tokens owned by `node`, in the order they were assigned.
    pub fn tokens_of(&self, node: &Node) -> Vec<Token> {
        self.node_to_tokens.get(node).cloned().unwrap_or_default()
    }

    pub fn contains_node(&self, node: &Node) -> bool {
        self.node_to_tokens.contains_key(node)
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.node_to_tokens.keys().cloned().collect()
    }

    /// Number of tokens on the ring.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Copy of the ring.
    pub fn ring(&self) -> BTreeMap<i32, Token> {
        self.ring.clone()
    }

    /// Copy of the token -> node map.
    pub fn token_to_node(&self) -> HashMap<Token, Node> {
        self.token_to_node.clone()
    }

    /// Copy of the node -> tokens map.
    pub fn node_to_tokens(&self) -> HashMap<Node, Vec<Token>> {
        self.node_to_tokens.clone()
    }

    /// Check that the three structures agree.
    pub fn validate(&self) -> Result<()> {
        for (partition, token) in &self.ring {
            if token.partition != *partition {
                return Err(Error::RingOperation(format!(
                    "ring key {partition} holds token {token}"
                )));
            }
            let owner = self.token_to_node.get(token).ok_or_else(|| {
                Error::RingOperation(format!("token {token} has no owner"))
            })?;
            let listed = self
                .node_to_tokens
                .get(owner)
                .is_some_and(|owned| owned.contains(token));
            if !listed {
                return Err(Error::RingOperation(format!(
                    "token {token} is not listed under its owner {owner}"
                )));
            }
        }

        if self.token_to_node.len() != self.ring.len() {
            return Err(Error::RingOperation(format!(
                "{} owned tokens for {} ring positions",
                self.token_to_node.len(),
                self.ring.len()
            )));
        }

        let mut listed = 0;
        for (node, tokens) in &self.node_to_tokens {
            for token in tokens {
                if self.token_to_node.get(token) != Some(node) {
                    return Err(Error::RingOperation(format!(
                        "{node} lists token {token} it does not own"
                    )));
                }
            }
            listed += tokens.len();
        }
        if listed != self.ring.len() {
            return Err(Error::RingOperation(format!(
                "{listed} listed tokens for {} ring positions",
                self.ring.len()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;

    fn node(id: i64) -> Node {
        Node::new(NodeId(id), format!("node{id}"))
    }

    fn metadata(assignments: &[(i32, i64)]) -> RingMetadata {
        let mut metadata = RingMetadata::new();
        for (partition, id) in assignments {
            metadata.add_or_replace_token(Token::murmur3(*partition), node(*id));
        }
        metadata
    }

    #[test]
    fn test_resolve_owner_successor_and_wrap() {
        let metadata = metadata(&[(-100, 1), (0, 2), (100, 3)]);

        assert_eq!(metadata.resolve_owner(-100), Some(&node(1)));
        assert_eq!(metadata.resolve_owner(-99), Some(&node(2)));
        assert_eq!(metadata.resolve_owner(50), Some(&node(3)));
        assert_eq!(metadata.resolve_owner(101), Some(&node(1)));
        assert_eq!(metadata.resolve_owner(i32::MAX), Some(&node(1)));
        assert_eq!(metadata.resolve_owner(i32::MIN), Some(&node(1)));
    }

    #[test]
    fn test_predecessor_wraps() {
        let metadata = metadata(&[(-100, 1), (0, 2), (100, 3)]);

        assert_eq!(metadata.predecessor(0).map(|t| t.partition), Some(-100));
        assert_eq!(metadata.predecessor(1).map(|t| t.partition), Some(0));
        assert_eq!(metadata.predecessor(-100).map(|t| t.partition), Some(100));
        assert_eq!(metadata.predecessor(i32::MIN).map(|t| t.partition), Some(100));
    }

    #[test]
    fn test_empty_ring() {
        let metadata = RingMetadata::new();
        assert!(metadata.resolve_owner(0).is_none());
        assert!(metadata.predecessor(0).is_none());
        assert!(metadata.validate().is_ok());
    }

    #[test]
    fn test_replace_moves_token_between_nodes() {
        let mut metadata = metadata(&[(10, 1), (20, 1)]);
        metadata.add_or_replace_token(Token::murmur3(10), node(2));

        assert_eq!(metadata.resolve_owner(5), Some(&node(2)));
        assert_eq!(metadata.tokens_of(&node(1)), vec![Token::murmur3(20)]);
        assert_eq!(metadata.tokens_of(&node(2)), vec![Token::murmur3(10)]);
        metadata.validate().unwrap();
    }

    #[test]
    fn test_re_adding_token_does_not_duplicate() {
        let mut metadata = metadata(&[(10, 1)]);
        metadata.add_or_replace_token(Token::murmur3(10), node(1));
        assert_eq!(metadata.tokens_of(&node(1)).len(), 1);
        metadata.validate().unwrap();
    }

    #[test]
    fn test_update_normal_tokens_replaces_wholesale() {
        let mut metadata = metadata(&[(10, 1), (20, 1), (30, 2)]);
        metadata.update_normal_tokens(&node(1), &[Token::murmur3(20), Token::murmur3(40)]);

        assert_eq!(
            metadata.tokens_of(&node(1)),
            vec![Token::murmur3(20), Token::murmur3(40)]
        );
        assert!(!metadata.ring().contains_key(&10));
        assert_eq!(metadata.resolve_owner(35), Some(&node(1)));
        metadata.validate().unwrap();
    }

    #[test]
    fn test_remove_all_tokens_of() {
        let mut metadata = metadata(&[(10, 1), (20, 2), (30, 1)]);
        metadata.remove_all_tokens_of(&node(1));

        assert_eq!(metadata.len(), 1);
        assert!(!metadata.contains_node(&node(1)));
        assert_eq!(metadata.resolve_owner(25), Some(&node(2)));
        metadata.validate().unwrap();
    }

    #[test]
    fn test_remove_unknown_node_is_noop() {
        let mut metadata = metadata(&[(10, 1)]);
        let before = metadata.clone();
        metadata.remove_all_tokens_of(&node(9));
        assert_eq!(metadata, before);
    }

    #[test]
    fn test_accessors_return_copies() {
        let metadata = metadata(&[(10, 1)]);

        let mut ring = metadata.ring();
        ring.clear();
        let mut owners = metadata.token_to_node();
        owners.clear();
        let mut tokens = metadata.node_to_tokens();
        tokens.clear();

        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata.token_to_node().len(), 1);
        assert_eq!(metadata.node_to_tokens().len(), 1);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let original = metadata(&[(10, 1)]);
        let mut snapshot = original.clone();
        snapshot.add_or_replace_token(Token::murmur3(20), node(2));

        assert_eq!(original.len(), 1);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_validate_detects_dangling_listing() {
        let mut metadata = metadata(&[(10, 1), (20, 1)]);
        metadata.unlink_token(&Token::murmur3(10));
        assert!(matches!(metadata.validate(), Err(Error::RingOperation(_))));
    }
}
