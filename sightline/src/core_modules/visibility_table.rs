// THEORY:
// The `VisibilityTable` maps each source cell to the ordered list of cells it can
// see. Every worker fills its own table for the sources in its chunk, and the
// pipeline merges the local tables once all workers have joined. No table is
// shared while the line walks run, so no lock is held during the expensive
// phase.
//
// A key may be written once. Both `insert` and `merge` refuse to overwrite an
// existing key and report `DuplicateKey` instead, since a repeated source can
// only come from overlapping chunks.
//
// Keys are kept in linear-index order, which is also the order in which they
// are serialized.

use crate::core_modules::occupancy_grid::Coordinate;
use crate::error::{Result, VisibilityError};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::btree_map::{BTreeMap, Entry};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityTable {
    entries: BTreeMap<Coordinate, Vec<Coordinate>>,
}

impl VisibilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the full visible list for `source`. Fails if `source` is already present.
    pub fn insert(&mut self, source: Coordinate, visible: Vec<Coordinate>) -> Result<()> {
        match self.entries.entry(source) {
            Entry::Occupied(_) => Err(VisibilityError::DuplicateKey(source)),
            Entry::Vacant(slot) => {
                slot.insert(visible);
                Ok(())
            }
        }
    }

    /// Moves every entry of `other` into `self`. Fails on the first shared key.
    pub fn merge(&mut self, other: VisibilityTable) -> Result<()> {
        for (source, visible) in other.entries {
            self.insert(source, visible)?;
        }
        Ok(())
    }

    pub fn get(&self, source: &Coordinate) -> Option<&[Coordinate]> {
        self.entries.get(source).map(Vec::as_slice)
    }

    pub fn contains(&self, source: &Coordinate) -> bool {
        self.entries.contains_key(source)
    }

    /// Number of source entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of (source, target) pairs across all entries.
    pub fn pair_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Coordinate, &[Coordinate])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Writes every `"(x, y)" -> [[x, y], ...]` entry into an open map, so that
    /// documents wrapping the table share its key format.
    pub(crate) fn serialize_entries<M: SerializeMap>(
        &self,
        map: &mut M,
    ) -> std::result::Result<(), M::Error> {
        for (source, visible) in &self.entries {
            map.serialize_entry(&source.to_string(), visible)?;
        }
        Ok(())
    }
}

/// Serialized as a map from `"(x, y)"` to an array of `[x, y]` pairs.
impl Serialize for VisibilityTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        self.serialize_entries(&mut map)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32, y: i32) -> Coordinate {
        Coordinate::new(x, y)
    }

    #[test]
    fn insert_refuses_second_write() {
        let mut table = VisibilityTable::new();
        table.insert(c(0, 0), vec![c(0, 0)]).unwrap();

        let err = table.insert(c(0, 0), Vec::new()).unwrap_err();
        assert!(matches!(err, VisibilityError::DuplicateKey(k) if k == c(0, 0)));
        // The first write survives.
        assert_eq!(table.get(&c(0, 0)), Some(&[c(0, 0)][..]));
    }

    #[test]
    fn merge_keeps_all_disjoint_entries() {
        let mut left = VisibilityTable::new();
        left.insert(c(0, 0), vec![c(0, 0), c(1, 0)]).unwrap();
        let mut right = VisibilityTable::new();
        right.insert(c(1, 0), vec![c(0, 0), c(1, 0)]).unwrap();
        right.insert(c(0, 1), Vec::new()).unwrap();

        left.merge(right).unwrap();
        assert_eq!(left.len(), 3);
        assert_eq!(left.pair_count(), 4);
        assert!(left.contains(&c(0, 1)));
    }

    #[test]
    fn merge_fails_loudly_on_overlap() {
        let mut left = VisibilityTable::new();
        left.insert(c(2, 3), vec![c(2, 3)]).unwrap();
        let mut right = VisibilityTable::new();
        right.insert(c(2, 3), vec![c(2, 3)]).unwrap();

        let err = left.merge(right).unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn serializes_keys_in_scan_order() {
        let mut table = VisibilityTable::new();
        table.insert(c(0, 1), vec![c(0, 1)]).unwrap();
        table.insert(c(1, 0), vec![c(1, 0), c(0, 1)]).unwrap();
        table.insert(c(0, 0), Vec::new()).unwrap();

        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"(0, 0)":[],"(1, 0)":[[1,0],[0,1]],"(0, 1)":[[0,1]]}"#);
    }
}
