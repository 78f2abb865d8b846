//! Tokens: ownership points on the hash ring.
//!
//! A token is an immutable ring position tagged with the hash algorithm that
//! produced it. Tokens order, compare and hash purely by partition, so two
//! independently built tokens at the same partition are the same position.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Hash algorithm that produced a token's partition.
///
/// Closed on purpose: partitions from any other hash would not share the
/// ring's coordinate space, so tokens with an unknown tag fail to decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Murmur3,
}

impl HashAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Murmur3 => "murmur3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A position on the ring.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Token {
    pub partition: i32,
    pub algorithm: HashAlgorithm,
}

impl Token {
    pub fn new(partition: i32, algorithm: HashAlgorithm) -> Self {
        Self {
            partition,
            algorithm,
        }
    }

    /// A murmur3-tagged token.
    pub fn murmur3(partition: i32) -> Self {
        Self::new(partition, HashAlgorithm::Murmur3)
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.partition == other.partition
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.partition.hash(state);
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partition.cmp(&other.partition)
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_by_partition() {
        let mut tokens = vec![Token::murmur3(5), Token::murmur3(i32::MIN), Token::murmur3(-3)];
        tokens.sort();
        let partitions: Vec<i32> = tokens.iter().map(|t| t.partition).collect();
        assert_eq!(partitions, vec![i32::MIN, -3, 5]);
    }

    #[test]
    fn test_equal_partitions_are_same_position() {
        let mut map = std::collections::HashMap::new();
        map.insert(Token::murmur3(42), "first");
        map.insert(Token::murmur3(42), "second");
        assert_eq!(map.len(), 1);
        assert_eq!(map[&Token::murmur3(42)], "second");
    }

    #[test]
    fn test_algorithm_tag_serializes_as_string() {
        let json = serde_json::to_string(&Token::murmur3(-7)).unwrap();
        assert_eq!(json, r#"{"partition":-7,"algorithm":"murmur3"}"#);
    }

    #[test]
    fn test_unknown_algorithm_tag_is_rejected() {
        let parsed = serde_json::from_str::<Token>(r#"{"partition":-7,"algorithm":"sha1"}"#);
        assert!(parsed.is_err());
    }
}
