//! # Record Index
//!
//! Maps every live [`Entity`] to the table and row holding its components.
//! The index is a [`SparseSet`] keyed by entity slot, so lookup, insert and
//! removal are O(1) and destroyed slots are recycled with a bumped
//! generation.

use super::id::Entity;
use super::sparse_set::{SparseSet, SparseSetPolicy};
use super::table::TableId;

/// Location of an entity's components.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record {
    /// Table storing the entity.
    pub table: TableId,
    /// Row of the entity inside `table`.
    pub row: usize,
    /// Position of the entity in the index's dense array.
    pub dense_index: usize,
}

impl Record {
    /// Marker stored in empty sparse slots.
    pub const INVALID: Self = Self {
        table: TableId::INVALID,
        row: usize::MAX,
        dense_index: usize::MAX,
    };

    /// Creates a record for a table row. The dense index is filled in by the
    /// index on insertion.
    #[inline]
    #[must_use]
    pub const fn new(table: TableId, row: usize) -> Self {
        Self {
            table,
            row,
            dense_index: usize::MAX,
        }
    }
}

/// Sparse-set policy of the record index.
///
/// Keys are entities, slotted by their index. Recycled keys come back with
/// the next generation.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordPolicy;

impl SparseSetPolicy for RecordPolicy {
    type Key = Entity;
    type Value = Record;

    #[inline]
    fn index_from_key(&self, key: &Entity) -> usize {
        key.index() as usize
    }

    #[inline]
    fn index_from_value(&self, value: &Record) -> usize {
        value.dense_index
    }

    fn invalid_key(&self) -> Entity {
        Entity::NULL
    }

    fn invalid_value(&self) -> Record {
        Record::INVALID
    }

    #[inline]
    fn record_dense_index(&self, value: &mut Record, dense_index: usize) {
        value.dense_index = dense_index;
    }

    fn reuse_key(&self, key: &mut Entity) {
        *key = key.next_generation();
    }
}

/// Entity to table-row index.
pub type RecordIndex = SparseSet<RecordPolicy>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut index = RecordIndex::new();
        let e = Entity::new(true, 0, 0);
        index.insert(e, Record::new(TableId::ROOT, 0)).unwrap();

        let record = index.get_exact(&e).unwrap();
        assert_eq!(record.table, TableId::ROOT);
        assert_eq!(record.row, 0);
        assert_eq!(record.dense_index, 0);
    }

    #[test]
    fn test_reuse_bumps_generation() {
        let mut index = RecordIndex::new();
        let e = Entity::new(true, 0, 0);
        index.insert(e, Record::new(TableId::ROOT, 0)).unwrap();
        assert!(index.remove(&e).is_some());
        assert!(index.get_exact(&e).is_none());

        let recycled = index.reuse(Record::new(TableId::ROOT, 0)).unwrap();
        assert_eq!(recycled.index(), 0);
        assert_eq!(recycled.generation(), 1);
        assert!(recycled.is_alive());

        // The stale handle shares the slot but not the generation.
        assert!(index.get(&e).is_some());
        assert!(index.get_exact(&e).is_none());
        assert!(index.get_exact(&recycled).is_some());
    }

    #[test]
    fn test_invalid_record_never_matches_live_one() {
        assert_ne!(Record::new(TableId::ROOT, 0), Record::INVALID);
        assert_ne!(Record::new(TableId::ROOT, usize::MAX), Record::INVALID);
    }
}
