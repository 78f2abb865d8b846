//! Arcs of the ring.

use std::fmt;

use crate::access::Access;

/// The left-open, right-closed arc `(start, end]`, walking clockwise from
/// `start` and wrapping past `i32::MAX`.
///
/// This is the ownership range of a token at `end` whose predecessor sits
/// at `start`. `start == end` denotes the whole ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRange {
    pub start: i32,
    pub end: i32,
}

impl TokenRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, partition: i32) -> bool {
        if self.start < self.end {
            partition > self.start && partition <= self.end
        } else {
            partition > self.start || partition <= self.end
        }
    }

    /// SCAN request selecting exactly this arc.
    ///
    /// `(start, end]` is `[start + 1, end + 1)` with wrapping arithmetic, which
    /// SCAN reads as a wrapping arc whenever the bounds cross `i32::MAX`.
    pub fn to_scan(&self) -> Access {
        Access::Scan {
            from_partition: self.start.wrapping_add(1),
            to_partition: self.end.wrapping_add(1),
        }
    }
}

impl fmt::Display for TokenRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}]", self.start, self.end)
    }
}
