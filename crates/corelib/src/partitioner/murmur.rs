//! MurmurHash3 x86_32, the ring coordinate function.

/// Seed used for ring placement.
pub const DEFAULT_SEED: u32 = 104_729;

/// MurmurHash3 x86_32 of `data`.
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let mut source = data;
    // Reading from an in-memory slice never fails.
    murmur3::murmur3_32(&mut source, seed).unwrap_or_default()
}

/// Hash a 64-bit value onto the signed 32-bit ring.
///
/// The value is hashed as its 8 big-endian bytes, which reproduces the
/// `hash32(long)` values of the commons-codec implementation.
#[inline]
pub fn ring_hash(value: i64) -> i32 {
    murmur3_32(&value.to_be_bytes(), DEFAULT_SEED) as i32
}
