//! Consistent hash ring implementation.
//!
//! [`RingMetadata`] holds the ordered ring and its ownership maps and
//! answers clockwise-successor lookups. [`TokenRange`] describes the arcs
//! that are handed off when ownership changes.

pub mod metadata;
pub mod range;

pub use metadata::RingMetadata;
pub use range::TokenRange;
