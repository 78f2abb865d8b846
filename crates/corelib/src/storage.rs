//! Per-node record storage.
//!
//! Records are kept in an ordered map keyed by the 32-bit partition of their
//! key, so that hand-off can scan contiguous ring arcs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A stored value together with the key it was written under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: i64,
    pub value: String,
}

impl Record {
    pub fn new(key: i64, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// Ordered partition -> record map owned by a single member.
///
/// Not synchronized; [`Member`](crate::Member) guards it with a lock.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: BTreeMap<i32, Record>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, partition: i32, record: Record) {
        self.records.insert(partition, record);
    }

    pub fn read(&self, partition: i32) -> Option<&Record> {
        self.records.get(&partition)
    }

    pub fn delete(&mut self, partition: i32) -> Option<Record> {
        self.records.remove(&partition)
    }

    /// Return every record whose partition lies on the arc from `from` to `to`.
    ///
    /// `from < to` selects the half-open interval `[from, to)`. Otherwise the
    /// arc wraps past `i32::MAX` and the result is `[from, MAX] ∪ [MIN, to)`;
    /// `from == to` therefore selects the whole ring.
    pub fn scan(&self, from: i32, to: i32) -> Vec<(i32, Record)> {
        let entries: Box<dyn Iterator<Item = (&i32, &Record)> + '_> = if from < to {
            Box::new(self.records.range(from..to))
        } else {
            Box::new(self.records.range(from..).chain(self.records.range(..to)))
        };

        entries
            .map(|(partition, record)| (*partition, record.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn store_with(partitions: &[i32]) -> RecordStore {
        let mut store = RecordStore::new();
        for p in partitions {
            store.write(*p, Record::new(i64::from(*p), format!("v{p}")));
        }
        store
    }

    fn partitions(entries: &[(i32, Record)]) -> Vec<i32> {
        entries.iter().map(|(p, _)| *p).collect()
    }

    #[test]
    fn test_write_read_delete() {
        let mut store = RecordStore::new();
        store.write(10, Record::new(1, "a"));
        assert_eq!(store.read(10), Some(&Record::new(1, "a")));

        store.write(10, Record::new(1, "b"));
        assert_eq!(store.read(10).map(|r| r.value.as_str()), Some("b"));

        assert!(store.delete(10).is_some());
        assert!(store.read(10).is_none());
        assert!(store.delete(10).is_none());
    }

    #[test]
    fn test_scan_half_open() {
        let store = store_with(&[-5, 0, 5, 10, 15]);
        assert_eq!(partitions(&store.scan(0, 10)), vec![0, 5]);
        assert_eq!(partitions(&store.scan(-5, -4)), vec![-5]);
    }

    #[test]
    fn test_scan_wraps_past_max() {
        let store = store_with(&[i32::MIN, -100, 0, 100, i32::MAX]);
        let entries = store.scan(100, -100);
        assert_eq!(partitions(&entries), vec![100, i32::MAX, i32::MIN]);
    }

    #[test]
    fn test_scan_equal_bounds_is_full_ring() {
        let store = store_with(&[i32::MIN, -1, 0, 1, i32::MAX]);
        assert_eq!(store.scan(0, 0).len(), 5);
        assert_eq!(store.scan(i32::MIN, i32::MIN).len(), 5);
    }

    proptest! {
        #[test]
        fn prop_scan_matches_arc_filter(
            keys in proptest::collection::btree_set(any::<i32>(), 0..64),
            from in any::<i32>(),
            to in any::<i32>(),
        ) {
            let keys: Vec<i32> = keys.into_iter().collect();
            let store = store_with(&keys);

            let mut scanned = partitions(&store.scan(from, to));
            scanned.sort_unstable();

            let expected: Vec<i32> = keys
                .iter()
                .copied()
                .filter(|p| if from < to { *p >= from && *p < to } else { *p >= from || *p < to })
                .collect();

            prop_assert_eq!(scanned, expected);
        }
    }
}
