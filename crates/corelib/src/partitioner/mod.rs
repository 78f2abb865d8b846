//! Hash functions that place nodes and keys on the ring.
//!
//! Two functions make up the hashing layer:
//! - [`derive_node_id`]: SHA-256 of a node name, truncated to 64 bits, used
//!   as a stable node identity.
//! - [`ring_hash`]: MurmurHash3 (x86, 32-bit) of a 64-bit value, used as the
//!   ring coordinate for both virtual tokens and record keys.
//!
//! Both are pure functions; there is no shared hasher state.

pub mod murmur;

use sha2::{Digest, Sha256};

pub use murmur::{murmur3_32, ring_hash, DEFAULT_SEED};

/// Derive a 64-bit node id from the UTF-8 bytes of `name`.
///
/// Returns the first 8 bytes of the SHA-256 digest read as a big-endian
/// signed integer.
pub fn derive_node_id(name: &str) -> i64 {
    let digest = Sha256::digest(name.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(head)
}
